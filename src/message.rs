//! The `Message` type and its transition state machine.
//!
//! A `Message` is created by a relay pump for every chunk it reads off a
//! socket. It is published to the `Store` and then, unless auto-transmit is
//! on, blocks the pump thread on a single-shot rendezvous until the operator
//! resolves it from the UI thread.

use std::sync::Mutex;

use chrono::{DateTime, Local};
use crossbeam_channel::{bounded, Receiver, Sender};
use thiserror::Error;

/// Which socket a chunk was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    ToServer,
    ToClient,
}

/// The state machine's states. `Pending` is the only non-terminal one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Pending,
    Transmitted,
    Dropped,
}

/// Errors returned by illegal state transitions. These never change the
/// message's state; they just report that the caller asked for something
/// that can't happen.
#[derive(Debug, Error)]
pub enum MessageError {
    #[error("message was already resolved as {0:?}, cannot {1}")]
    AlreadyResolved(Status, &'static str),
    #[error("message content is immutable once resolved")]
    Immutable,
}

struct Inner {
    content: Vec<u8>,
    edited: bool,
    status: Status,
}

pub struct Message {
    direction: Direction,
    created_at: DateTime<Local>,
    inner: Mutex<Inner>,
    // Capacity-1 channel: the UI thread sends at most once (gated by the
    // status check in `resolve`), and the pump thread receives at most
    // once in `wait_for_resolution`. That pairing is the whole rendezvous.
    transmit_tx: Sender<bool>,
    transmit_rx: Receiver<bool>,
}

impl Message {
    pub fn new(direction: Direction, content: Vec<u8>) -> Self {
        let (transmit_tx, transmit_rx) = bounded(1);
        Message {
            direction,
            created_at: Local::now(),
            inner: Mutex::new(Inner { content, edited: false, status: Status::Pending }),
            transmit_tx,
            transmit_rx,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn created_at(&self) -> DateTime<Local> {
        self.created_at
    }

    pub fn status(&self) -> Status {
        self.inner.lock().unwrap().status
    }

    pub fn edited(&self) -> bool {
        self.inner.lock().unwrap().edited
    }

    pub fn content(&self) -> Vec<u8> {
        self.inner.lock().unwrap().content.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Marks the message transmitted and signals the waiting pump with
    /// `true`. The caller is responsible for then writing `content()` to
    /// the peer socket.
    pub fn transmit(&self) -> Result<(), MessageError> {
        self.resolve(Status::Transmitted, "transmit")?;
        // Best-effort: if the pump already hung up (connection closed)
        // there's nobody left to receive this, and that's fine.
        let _ = self.transmit_tx.send(true);
        Ok(())
    }

    /// Marks the message dropped and signals the waiting pump with `false`.
    pub fn drop(&self) -> Result<(), MessageError> {
        self.resolve(Status::Dropped, "drop")?;
        let _ = self.transmit_tx.send(false);
        Ok(())
    }

    /// Resolves the message as transmitted without signalling the
    /// rendezvous. Used by the auto-transmit path, where the pump never
    /// calls `wait_for_resolution` in the first place.
    pub fn mark_transmitted(&self) -> Result<(), MessageError> {
        self.resolve(Status::Transmitted, "mark transmitted")
    }

    fn resolve(&self, to: Status, action: &'static str) -> Result<(), MessageError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.status != Status::Pending {
            return Err(MessageError::AlreadyResolved(inner.status, action));
        }
        inner.status = to;
        Ok(())
    }

    /// Replaces the content of a still-pending message and marks it edited.
    pub fn set_content(&self, new_content: Vec<u8>) -> Result<(), MessageError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.status != Status::Pending {
            return Err(MessageError::Immutable);
        }
        inner.content = new_content;
        inner.edited = true;
        Ok(())
    }

    /// Blocks the calling thread (a relay pump) until the operator resolves
    /// this message, returning the bytes that should go to the peer socket.
    /// An empty vec means "drop this chunk".
    pub fn wait_for_resolution(&self) -> Vec<u8> {
        match self.transmit_rx.recv() {
            Ok(true) => self.content(),
            Ok(false) => Vec::new(),
            // Disconnected: nothing will ever resolve this message, most
            // likely because the process is shutting down.
            Err(_) => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(content: &str) -> Message {
        Message::new(Direction::ToServer, content.as_bytes().to_vec())
    }

    #[test]
    fn starts_pending() {
        let m = msg("hi");
        assert_eq!(m.status(), Status::Pending);
        assert!(!m.edited());
        assert_eq!(m.content(), b"hi");
    }

    #[test]
    fn transmit_resolves_and_wakes_waiter() {
        let m = msg("hi");
        let waiter = std::thread::scope(|scope| {
            let handle = scope.spawn(|| m.wait_for_resolution());
            m.transmit().unwrap();
            handle.join().unwrap()
        });
        assert_eq!(waiter, b"hi");
        assert_eq!(m.status(), Status::Transmitted);
    }

    #[test]
    fn drop_resolves_to_empty() {
        let m = msg("secret");
        let waiter = std::thread::scope(|scope| {
            let handle = scope.spawn(|| m.wait_for_resolution());
            m.drop().unwrap();
            handle.join().unwrap()
        });
        assert!(waiter.is_empty());
        assert_eq!(m.status(), Status::Dropped);
    }

    #[test]
    fn double_transmit_is_rejected() {
        let m = msg("hi");
        m.transmit().unwrap();
        let err = m.transmit().unwrap_err();
        assert!(matches!(err, MessageError::AlreadyResolved(Status::Transmitted, _)));
        assert_eq!(m.status(), Status::Transmitted);
    }

    #[test]
    fn drop_after_transmit_is_rejected() {
        let m = msg("hi");
        m.transmit().unwrap();
        let err = m.drop().unwrap_err();
        assert!(matches!(err, MessageError::AlreadyResolved(Status::Transmitted, _)));
    }

    #[test]
    fn set_content_only_while_pending() {
        let m = msg("hi");
        m.set_content(b"bye".to_vec()).unwrap();
        assert_eq!(m.content(), b"bye");
        assert!(m.edited());

        m.transmit().unwrap();
        let err = m.set_content(b"nope".to_vec()).unwrap_err();
        assert!(matches!(err, MessageError::Immutable));
        assert_eq!(m.content(), b"bye");
    }

    #[test]
    fn mark_transmitted_does_not_signal() {
        let m = msg("hi");
        m.mark_transmitted().unwrap();
        assert_eq!(m.status(), Status::Transmitted);
        // Nothing was ever sent on the rendezvous channel, so a receiver
        // would block forever; try_recv must report "empty", not a value.
        assert!(m.transmit_rx.try_recv().is_err());
    }
}
