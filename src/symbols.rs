//! The glyph table used to render message status, direction, and key
//! hints. Pluggable between a nerd-font-equipped terminal and a plain
//! Unicode fallback so the UI never hard-codes either choice.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Clock,
    SentMail,
    TrashCan,
    Pen,
    Shift,
    Enter,
    Space,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolTable {
    NerdFont,
    Fallback,
}

impl SymbolTable {
    pub fn glyph(self, symbol: Symbol) -> &'static str {
        match self {
            SymbolTable::NerdFont => nerd_font(symbol),
            SymbolTable::Fallback => fallback(symbol),
        }
    }
}

fn nerd_font(symbol: Symbol) -> &'static str {
    match symbol {
        Symbol::ArrowUp => "\u{f062}",
        Symbol::ArrowDown => "\u{f063}",
        Symbol::ArrowLeft => "\u{f060}",
        Symbol::ArrowRight => "\u{f061}",
        Symbol::Clock => "\u{f017}",
        Symbol::SentMail => "\u{f1d8}",
        Symbol::TrashCan => "\u{f1f8}",
        Symbol::Pen => "\u{f044}",
        Symbol::Shift => "\u{f049e}",
        Symbol::Enter => "\u{21b5}",
        Symbol::Space => "\u{2423}",
    }
}

fn fallback(symbol: Symbol) -> &'static str {
    match symbol {
        Symbol::ArrowUp => "\u{2191}",
        Symbol::ArrowDown => "\u{2193}",
        Symbol::ArrowLeft => "\u{2190}",
        Symbol::ArrowRight => "\u{2192}",
        Symbol::Clock => "\u{23f2}",
        Symbol::SentMail => "\u{2709}",
        Symbol::TrashCan => "\u{1f5d1}",
        Symbol::Pen => "\u{270e}",
        Symbol::Shift => "\u{21e7}",
        Symbol::Enter => "\u{21b5}",
        Symbol::Space => "\u{2423}",
    }
}
