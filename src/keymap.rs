//! Two-layer keymap: the main keymap drives list navigation and message
//! resolution; an alternate keymap is switched in while the viewer pane
//! has focus, where plain up/down scroll instead of moving the list
//! cursor.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    ToggleHelp,
    ToggleViewerFocus,
    ListUp,
    ListDown,
    ScrollUp,
    ScrollDown,
    DisplayHex,
    DisplayHexdump,
    DisplayStrings,
    Drop,
    Transmit,
    Edit,
    ToggleAutoTransmit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveKeymap {
    Main,
    ViewerFocused,
}

/// A binding together with the short help text shown for it.
pub struct Binding {
    pub keys: &'static str,
    pub help: &'static str,
    pub action: Action,
}

pub const MAIN_BINDINGS: &[Binding] = &[
    Binding { keys: "q/ctrl+c", help: "quit", action: Action::Quit },
    Binding { keys: "h", help: "toggle help", action: Action::ToggleHelp },
    Binding { keys: "tab", help: "focus viewer", action: Action::ToggleViewerFocus },
    Binding { keys: "k/↑", help: "list up", action: Action::ListUp },
    Binding { keys: "j/↓", help: "list down", action: Action::ListDown },
    Binding { keys: "K/shift+↑", help: "scroll up", action: Action::ScrollUp },
    Binding { keys: "J/shift+↓", help: "scroll down", action: Action::ScrollDown },
    Binding { keys: "x", help: "display hexdump", action: Action::DisplayHexdump },
    Binding { keys: "X", help: "display hex", action: Action::DisplayHex },
    Binding { keys: "s", help: "display strings", action: Action::DisplayStrings },
    Binding { keys: "t", help: "transmit", action: Action::Transmit },
    Binding { keys: "d", help: "drop", action: Action::Drop },
    Binding { keys: "e", help: "edit", action: Action::Edit },
    Binding { keys: "a", help: "toggle auto-transmit", action: Action::ToggleAutoTransmit },
];

fn main_keymap(key: KeyEvent) -> Option<Action> {
    match (key.code, key.modifiers) {
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(Action::Quit),
        (KeyCode::Char('q'), _) => Some(Action::Quit),
        (KeyCode::Char('h'), _) => Some(Action::ToggleHelp),
        (KeyCode::Tab, _) => Some(Action::ToggleViewerFocus),
        (KeyCode::Char('k'), _) | (KeyCode::Up, KeyModifiers::NONE) => Some(Action::ListUp),
        (KeyCode::Char('j'), _) | (KeyCode::Down, KeyModifiers::NONE) => Some(Action::ListDown),
        (KeyCode::Char('K'), _) | (KeyCode::Up, KeyModifiers::SHIFT) => Some(Action::ScrollUp),
        (KeyCode::Char('J'), _) | (KeyCode::Down, KeyModifiers::SHIFT) => Some(Action::ScrollDown),
        (KeyCode::Char('X'), _) => Some(Action::DisplayHex),
        (KeyCode::Char('x'), _) => Some(Action::DisplayHexdump),
        (KeyCode::Char('s'), _) => Some(Action::DisplayStrings),
        (KeyCode::Char('d'), _) => Some(Action::Drop),
        (KeyCode::Char('t'), _) => Some(Action::Transmit),
        (KeyCode::Char('e'), _) => Some(Action::Edit),
        (KeyCode::Char('a'), _) => Some(Action::ToggleAutoTransmit),
        _ => None,
    }
}

/// While the viewer has focus, plain up/down scroll the viewer instead of
/// moving the list cursor; everything else falls back to the main keymap.
fn viewer_focused_keymap(key: KeyEvent) -> Option<Action> {
    match (key.code, key.modifiers) {
        (KeyCode::Up, KeyModifiers::NONE) => Some(Action::ScrollUp),
        (KeyCode::Down, KeyModifiers::NONE) => Some(Action::ScrollDown),
        _ => main_keymap(key),
    }
}

pub fn dispatch(active: ActiveKeymap, key: KeyEvent) -> Option<Action> {
    match active {
        ActiveKeymap::Main => main_keymap(key),
        ActiveKeymap::ViewerFocused => viewer_focused_keymap(key),
    }
}
