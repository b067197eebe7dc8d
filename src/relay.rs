//! The concurrent relay: accepts client connections, dials a matching
//! upstream connection for each, and pumps bytes in both directions
//! through the interception hook.

use std::io::{self, Read, Write};
use std::net::{TcpListener, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context};
use tracing::{info, warn};

use crate::message::{Direction, Message};
use crate::store::Store;

const DIAL_TIMEOUT: Duration = Duration::from_secs(60);
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Binds the listen socket. Kept separate from `serve` so a bind failure
/// can be treated as fatal startup error by the caller, while per-connection
/// failures further down stay non-fatal.
pub fn bind(in_port: u16) -> io::Result<TcpListener> {
    TcpListener::bind(("0.0.0.0", in_port))
}

pub struct Relay {
    out_host: String,
    out_port: u16,
}

impl Relay {
    pub fn new(out_host: String, out_port: u16) -> Arc<Self> {
        Arc::new(Relay { out_host, out_port })
    }

    /// Accepts connections forever, spawning a connection handler thread
    /// per client. Never returns except by unwinding on a fatal accept
    /// error, which would indicate the listen socket itself died.
    pub fn serve(self: Arc<Self>, listener: TcpListener, store: Arc<Store>) {
        for stream in listener.incoming() {
            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    warn!("accept failed: {e}");
                    continue;
                }
            };

            let relay = Arc::clone(&self);
            let store = Arc::clone(&store);
            thread::spawn(move || {
                if let Err(e) = relay.handle_connection(stream, store) {
                    warn!("connection setup failed: {e:?}");
                }
            });
        }
    }

    fn handle_connection(&self, client: TcpStream, store: Arc<Store>) -> anyhow::Result<()> {
        let peer = client.peer_addr().ok();
        info!(?peer, "accepted client connection");

        let addr = (self.out_host.as_str(), self.out_port)
            .to_socket_addrs()
            .with_context(|| format!("resolving upstream {}:{}", self.out_host, self.out_port))?
            .next()
            .ok_or_else(|| {
                anyhow!("no addresses for upstream {}:{}", self.out_host, self.out_port)
            })?;

        let server = TcpStream::connect_timeout(&addr, DIAL_TIMEOUT)
            .with_context(|| format!("dialing upstream {}:{}", self.out_host, self.out_port))?;

        let client_reader = client.try_clone().context("cloning client socket")?;
        let server_writer = server.try_clone().context("cloning upstream socket")?;

        let to_server_store = Arc::clone(&store);
        let to_server = thread::spawn(move || {
            pump(client_reader, server_writer, Direction::ToServer, to_server_store)
        });

        let to_client_store = Arc::clone(&store);
        let to_client =
            thread::spawn(move || pump(server, client, Direction::ToClient, to_client_store));

        let _ = to_server.join();
        let _ = to_client.join();
        Ok(())
    }
}

/// One direction of one connection: read a chunk, run it through the
/// interception hook, write whatever comes back. Loops until the source
/// socket returns EOF or errors.
fn pump(mut source: impl Read, mut dest: impl Write, direction: Direction, store: Arc<Store>) {
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];
    loop {
        let n = match source.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                warn!("read failed on {direction:?} pump: {e}");
                break;
            }
        };

        let to_write = intercept(&store, direction, &buffer[..n]);
        if to_write.is_empty() {
            continue;
        }
        if let Err(e) = dest.write_all(&to_write) {
            warn!("write failed on {direction:?} pump: {e}");
        }
    }
}

/// Turns one chunk into a `Message`, publishes it, and blocks (unless
/// auto-transmit is on) until the operator resolves it.
fn intercept(store: &Store, direction: Direction, chunk: &[u8]) -> Vec<u8> {
    let message = Arc::new(Message::new(direction, chunk.to_vec()));
    store.append(Arc::clone(&message));

    if store.auto_transmit() {
        if let Err(e) = message.mark_transmitted() {
            warn!("auto-transmit failed: {e}");
        }
        return message.content();
    }

    message.wait_for_resolution()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Status;
    use ntest::timeout;
    use std::net::TcpListener as StdListener;
    use std::thread;

    fn echo_server() -> u16 {
        let listener = StdListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        thread::spawn(move || {
            for stream in listener.incoming() {
                let mut stream = match stream {
                    Ok(s) => s,
                    Err(_) => continue,
                };
                thread::spawn(move || {
                    let mut buf = [0u8; 1024];
                    loop {
                        let n = match stream.read(&mut buf) {
                            Ok(0) | Err(_) => return,
                            Ok(n) => n,
                        };
                        if stream.write_all(&buf[..n]).is_err() {
                            return;
                        }
                    }
                });
            }
        });
        port
    }

    #[test]
    #[timeout(5000)]
    fn auto_transmit_forwards_both_directions() {
        let echo_port = echo_server();
        let store = Arc::new(Store::new(true));
        let listener = bind(0).unwrap();
        let in_port = listener.local_addr().unwrap().port();

        let relay = Relay::new("127.0.0.1".to_string(), echo_port);
        let serve_store = Arc::clone(&store);
        thread::spawn(move || relay.serve(listener, serve_store));

        let mut client = TcpStream::connect(("127.0.0.1", in_port)).unwrap();
        client.write_all(b"ping").unwrap();

        let mut buf = [0u8; 4];
        client.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"ping");

        // Give the to-client pump a moment to publish its message too.
        thread::sleep(Duration::from_millis(100));

        let messages = store.all();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].direction(), Direction::ToServer);
        assert_eq!(messages[0].content(), b"ping");
        assert_eq!(messages[0].status(), Status::Transmitted);
        assert_eq!(messages[1].direction(), Direction::ToClient);
        assert_eq!(messages[1].content(), b"ping");
        assert_eq!(messages[1].status(), Status::Transmitted);
    }

    #[test]
    #[timeout(5000)]
    fn manual_transmit_holds_until_resolved() {
        let echo_port = echo_server();
        let store = Arc::new(Store::new(false));
        let listener = bind(0).unwrap();
        let in_port = listener.local_addr().unwrap().port();

        let relay = Relay::new("127.0.0.1".to_string(), echo_port);
        let serve_store = Arc::clone(&store);
        thread::spawn(move || relay.serve(listener, serve_store));

        let mut client = TcpStream::connect(("127.0.0.1", in_port)).unwrap();
        client.write_all(b"A").unwrap();

        let to_server = wait_for_message(&store, 0);
        assert_eq!(to_server.status(), Status::Pending);
        assert_eq!(to_server.content(), b"A");

        to_server.transmit().unwrap();

        let mut buf = [0u8; 1];
        client.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"A");

        let to_client = wait_for_message(&store, 1);
        assert_eq!(to_client.status(), Status::Pending);
        to_client.transmit().unwrap();

        client.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"A");
    }

    #[test]
    #[timeout(5000)]
    fn drop_withholds_bytes_from_upstream() {
        let echo_port = echo_server();
        let store = Arc::new(Store::new(false));
        let listener = bind(0).unwrap();
        let in_port = listener.local_addr().unwrap().port();

        let relay = Relay::new("127.0.0.1".to_string(), echo_port);
        let serve_store = Arc::clone(&store);
        thread::spawn(move || relay.serve(listener, serve_store));

        let mut client = TcpStream::connect(("127.0.0.1", in_port)).unwrap();
        client.write_all(b"secret").unwrap();

        let message = wait_for_message(&store, 0);
        message.drop().unwrap();
        assert_eq!(message.status(), Status::Dropped);

        // Nothing should arrive back, since the echo server never saw it.
        client.set_read_timeout(Some(Duration::from_millis(200))).unwrap();
        let mut buf = [0u8; 8];
        let err = client.read(&mut buf);
        assert!(matches!(err, Ok(0)) || err.is_err());
    }

    fn wait_for_message(store: &Store, index: usize) -> Arc<Message> {
        for _ in 0..200 {
            if let Some(m) = store.get(index) {
                return m;
            }
            thread::sleep(Duration::from_millis(10));
        }
        panic!("message at index {index} never appeared");
    }

    #[test]
    #[timeout(5000)]
    fn auto_transmit_round_trips_an_arbitrary_payload() {
        use rand::Rng;

        let mut rng = rand::thread_rng();
        let payload: Vec<u8> = (0..2000).map(|_| rng.gen()).collect();

        let echo_port = echo_server();
        let store = Arc::new(Store::new(true));
        let listener = bind(0).unwrap();
        let in_port = listener.local_addr().unwrap().port();

        let relay = Relay::new("127.0.0.1".to_string(), echo_port);
        let serve_store = Arc::clone(&store);
        thread::spawn(move || relay.serve(listener, serve_store));

        let mut client = TcpStream::connect(("127.0.0.1", in_port)).unwrap();
        client.write_all(&payload).unwrap();

        let mut echoed = vec![0u8; payload.len()];
        client.read_exact(&mut echoed).unwrap();
        assert_eq!(echoed, payload);
    }
}
