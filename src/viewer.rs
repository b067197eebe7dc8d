//! Renders the currently-selected `Message` in one of three display modes,
//! with soft-wrap and scrolling.

use std::sync::Arc;

use crate::message::Message;
use crate::util::{clamp, count_lines, extract_strings, hex_encode, hexdump, wrap_line};

const MIN_STRING_LENGTH: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    Hexdump,
    Strings,
    Hex,
}

impl DisplayMode {
    pub fn label(self) -> &'static str {
        match self {
            DisplayMode::Hexdump => "hexdump",
            DisplayMode::Strings => "strings",
            DisplayMode::Hex => "hex",
        }
    }
}

pub struct MessageView {
    viewed: Option<Arc<Message>>,
    display_mode: DisplayMode,
    scroll: i64,
    width: u16,
    height: u16,
}

impl MessageView {
    pub fn new() -> Self {
        MessageView { viewed: None, display_mode: DisplayMode::Hexdump, scroll: 0, width: 0, height: 0 }
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.display_mode
    }

    pub fn scroll_offset(&self) -> i64 {
        self.scroll
    }

    pub fn set_viewed(&mut self, message: Arc<Message>) {
        self.viewed = Some(message);
        self.scroll = 0;
    }

    pub fn set_display_mode(&mut self, mode: DisplayMode) {
        self.display_mode = mode;
        self.scroll = 0;
    }

    pub fn set_size(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.scroll = clamp(self.scroll, 0, self.max_scroll());
    }

    pub fn scroll_by(&mut self, delta: i64) {
        self.scroll = clamp(self.scroll + delta, 0, self.max_scroll());
    }

    fn render_raw(&self) -> String {
        let Some(message) = &self.viewed else {
            return "No message to view".to_string();
        };
        let content = message.content();
        match self.display_mode {
            DisplayMode::Hexdump => hexdump(&content),
            DisplayMode::Strings => extract_strings(&content, MIN_STRING_LENGTH).join("\n"),
            DisplayMode::Hex => hex_encode(&content),
        }
    }

    fn render_wrapped(&self) -> String {
        let raw = self.render_raw();
        // Hexdump rows are already fixed-width; wrapping them would break
        // the address/hex/ascii columns.
        if self.display_mode == DisplayMode::Hexdump {
            return raw;
        }

        let width = self.width.max(1) as usize;
        let wrapped: Vec<String> = raw.split('\n').flat_map(|line| wrap_line(line, width)).collect();
        wrapped.join("\n")
    }

    fn max_scroll(&self) -> i64 {
        let total = count_lines(&self.render_wrapped()) as i64;
        (total - self.height as i64 - 1).max(0)
    }

    /// The visible window of text: `[scroll, scroll+height)` lines of the
    /// wrapped render.
    pub fn render(&self) -> String {
        let wrapped = self.render_wrapped();
        let lines: Vec<&str> = wrapped.split('\n').collect();
        let begin = self.scroll.max(0) as usize;
        if begin >= lines.len() {
            return String::new();
        }
        let end = (begin + self.height as usize).min(lines.len());
        lines[begin..end].join("\n")
    }
}

impl Default for MessageView {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Direction;

    fn viewed(content: &[u8]) -> Arc<Message> {
        Arc::new(Message::new(Direction::ToServer, content.to_vec()))
    }

    #[test]
    fn no_message_shows_placeholder() {
        let view = MessageView::new();
        assert_eq!(view.render(), "No message to view");
    }

    #[test]
    fn changing_message_resets_scroll() {
        let mut view = MessageView::new();
        view.set_size(40, 2);
        view.set_viewed(viewed(&vec![b'a'; 500]));
        view.scroll_by(5);
        assert!(view.scroll_offset() > 0);

        view.set_viewed(viewed(b"short"));
        assert_eq!(view.scroll_offset(), 0);
    }

    #[test]
    fn changing_mode_resets_scroll() {
        let mut view = MessageView::new();
        view.set_size(40, 2);
        view.set_viewed(viewed(&vec![b'a'; 500]));
        view.scroll_by(5);
        assert!(view.scroll_offset() > 0);

        view.set_display_mode(DisplayMode::Hex);
        assert_eq!(view.scroll_offset(), 0);
    }

    #[test]
    fn scroll_is_clamped_to_max() {
        let mut view = MessageView::new();
        view.set_size(10, 2);
        view.set_display_mode(DisplayMode::Hex);
        view.set_viewed(viewed(&vec![b'a'; 200]));

        view.scroll_by(-100);
        assert_eq!(view.scroll_offset(), 0);

        view.scroll_by(100_000);
        let max = view.scroll_offset();
        view.scroll_by(1);
        assert_eq!(view.scroll_offset(), max);
    }

    #[test]
    fn hexdump_mode_disables_wrap() {
        let mut view = MessageView::new();
        view.set_size(4, 100);
        view.set_display_mode(DisplayMode::Hexdump);
        view.set_viewed(viewed(&(0..32).collect::<Vec<u8>>()));

        let rendered = view.render();
        // A hexdump row is far wider than the 4-column pane; if wrap were
        // applied it would never show a full "00000000" offset prefix.
        assert!(rendered.lines().any(|l| l.starts_with("00000000")));
    }

    #[test]
    fn strings_mode_only_shows_printable_runs() {
        let mut view = MessageView::new();
        view.set_size(80, 10);
        view.set_display_mode(DisplayMode::Strings);
        view.set_viewed(viewed(b"\x00\x01abcdef\x00gh"));

        assert_eq!(view.render(), "abcdef");
    }
}
