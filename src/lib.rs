//! protoxy: an interactive man-in-the-middle TCP proxy. The library half
//! of the crate wires the pieces together; `main.rs` just parses args and
//! calls [`run`].

pub mod console;
pub mod editor;
pub mod keymap;
pub mod message;
pub mod relay;
pub mod store;
pub mod symbols;
pub mod ui;
pub mod util;
pub mod viewer;

use std::sync::Arc;
use std::thread;

use anyhow::Context;

use console::DebugConsole;
use store::Store;

/// Starts logging, binds the listen socket, spins up the relay, and hands
/// control to the terminal UI until the operator quits.
pub fn run(
    in_port: u16,
    out_ip: String,
    out_port: u16,
    auto_transmit: bool,
    verbose: u8,
) -> anyhow::Result<()> {
    let console = DebugConsole::new();
    install_logging(console.clone(), verbose);

    let listener = relay::bind(in_port)
        .with_context(|| format!("binding listen socket on port {in_port}"))?;

    tracing::info!(in_port, %out_ip, out_port, "starting protoxy");

    let store = Arc::new(Store::new(auto_transmit));
    let relay = relay::Relay::new(out_ip, out_port);

    let serve_store = Arc::clone(&store);
    thread::spawn(move || relay.serve(listener, serve_store));

    ui::run(store, console)
}

/// Installs a `tracing` subscriber that writes to the debug console pane
/// instead of stdout or stderr, since both belong to the alternate screen
/// the UI takes over.
fn install_logging(console: DebugConsole, verbose: u8) {
    let trace_level = match verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(trace_level)
        .with_thread_ids(true)
        .with_target(false)
        .with_ansi(false)
        .with_writer(console)
        .init();
}
