//! The debug console: a write-only `tracing` sink backed by a bounded,
//! shared text buffer that the UI's debug pane reads from. Installing this
//! as the process-wide subscriber writer is what ties every log line in
//! the process (dial failures, write errors, state-machine errors) to the
//! pane the operator is already looking at.

use std::io;
use std::sync::{Arc, Mutex};

use tracing_subscriber::fmt::MakeWriter;

/// Caps memory use; the pane only ever shows the last few dozen lines at
/// once, so there's no reason to keep scrollback beyond a generous bound.
const MAX_BUFFERED_LINES: usize = 4000;

#[derive(Clone)]
pub struct DebugConsole {
    buf: Arc<Mutex<String>>,
}

impl DebugConsole {
    pub fn new() -> Self {
        DebugConsole { buf: Arc::new(Mutex::new(String::new())) }
    }

    /// The last `n` lines currently buffered, newline-joined.
    pub fn tail(&self, n: usize) -> String {
        if n == 0 {
            return String::new();
        }
        let buf = self.buf.lock().unwrap();
        let text = buf.strip_suffix('\n').unwrap_or(&buf);
        if text.is_empty() {
            return String::new();
        }
        let lines: Vec<&str> = text.split('\n').collect();
        let begin = lines.len().saturating_sub(n);
        lines[begin..].join("\n")
    }

    fn push(&self, text: &str) {
        let mut buf = self.buf.lock().unwrap();
        buf.push_str(text);

        let lines: Vec<&str> = buf.split('\n').collect();
        if lines.len() > MAX_BUFFERED_LINES {
            let begin = lines.len() - MAX_BUFFERED_LINES;
            *buf = lines[begin..].join("\n");
        }
    }
}

impl Default for DebugConsole {
    fn default() -> Self {
        Self::new()
    }
}

pub struct ConsoleWriter(DebugConsole);

impl io::Write for ConsoleWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.0.push(&String::from_utf8_lossy(data));
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for DebugConsole {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ConsoleWriter(self.clone())
    }
}
