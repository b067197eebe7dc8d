//! The cooperative UI event loop: a single-threaded reducer over keyboard,
//! tick, resize, and editor-completion events, plus the ratatui rendering
//! that reads the same state back out.

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use crossterm::event::{self, Event as CEvent, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction as LayoutDirection, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};
use ratatui::{Frame, Terminal};

use crate::console::DebugConsole;
use crate::editor::{edit_in_external_editor, EditorError};
use crate::keymap::{self, Action, ActiveKeymap, MAIN_BINDINGS};
use crate::message::{Direction, Message};
use crate::store::Store;
use crate::symbols::{Symbol, SymbolTable};
use crate::viewer::{DisplayMode, MessageView};

const TICK_RATE: Duration = Duration::from_millis(250);

/// Events the reducer consumes. `Resize`/`Tick` are driven directly by the
/// run loop; `Key` comes from crossterm; `EditorCompleted` comes back from
/// a `Command::RunEditor` the run loop executed on the reducer's behalf.
enum Event {
    Key(KeyEvent),
    Resize(u16, u16),
    Tick,
    EditorCompleted { message: Arc<Message>, result: Result<Vec<u8>, EditorError> },
}

/// Side effects the reducer asks the run loop to perform outside of
/// `update`, re-entering as the event above once they complete.
enum Command {
    RunEditor(Arc<Message>),
}

pub struct App {
    store: Arc<Store>,
    console: DebugConsole,
    viewer: MessageView,
    symbols: SymbolTable,
    active_keymap: ActiveKeymap,
    show_help: bool,
    should_quit: bool,
}

impl App {
    fn new(store: Arc<Store>, console: DebugConsole) -> Self {
        App {
            store,
            console,
            viewer: MessageView::new(),
            symbols: SymbolTable::NerdFont,
            active_keymap: ActiveKeymap::Main,
            show_help: false,
            should_quit: false,
        }
    }

    fn should_quit(&self) -> bool {
        self.should_quit
    }

    fn update(&mut self, event: Event) -> Vec<Command> {
        match event {
            Event::Resize(width, height) => {
                self.apply_resize(width, height);
                Vec::new()
            }
            Event::Tick => {
                if let Some(message) = self.store.tick() {
                    self.viewer.set_viewed(message);
                }
                Vec::new()
            }
            Event::Key(key) => self.handle_key(key),
            Event::EditorCompleted { message, result } => {
                match result {
                    Ok(new_content) => {
                        if let Err(e) = message.set_content(new_content) {
                            tracing::warn!("edit error: {e}");
                        }
                    }
                    Err(e) => tracing::warn!("editor error: {e}"),
                }
                Vec::new()
            }
        }
    }

    fn apply_resize(&mut self, width: u16, height: u16) {
        self.store.set_window_size((width, height));
        let viewer_h = viewer_pane_height(height);
        self.viewer.set_size(width.saturating_sub(2), viewer_h.saturating_sub(2));
    }

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Command> {
        let Some(action) = keymap::dispatch(self.active_keymap, key) else {
            return Vec::new();
        };

        match action {
            Action::Quit => {
                self.should_quit = true;
            }
            Action::ToggleHelp => {
                self.show_help = !self.show_help;
            }
            Action::ToggleViewerFocus => {
                self.active_keymap = match self.active_keymap {
                    ActiveKeymap::Main => ActiveKeymap::ViewerFocused,
                    ActiveKeymap::ViewerFocused => ActiveKeymap::Main,
                };
            }
            Action::ListUp => self.move_selection(-1),
            Action::ListDown => self.move_selection(1),
            Action::ScrollUp => self.viewer.scroll_by(-1),
            Action::ScrollDown => self.viewer.scroll_by(1),
            Action::DisplayHex => self.viewer.set_display_mode(DisplayMode::Hex),
            Action::DisplayHexdump => self.viewer.set_display_mode(DisplayMode::Hexdump),
            Action::DisplayStrings => self.viewer.set_display_mode(DisplayMode::Strings),
            Action::ToggleAutoTransmit => {
                let current = self.store.auto_transmit();
                self.store.set_auto_transmit(!current);
            }
            Action::Drop => self.resolve_selected(|m| m.drop()),
            Action::Transmit => self.resolve_selected(|m| m.transmit()),
            Action::Edit => {
                if let Some(message) = self.store.selected() {
                    return vec![Command::RunEditor(message)];
                }
                tracing::warn!("edit requested with no message selected");
            }
        }
        Vec::new()
    }

    fn move_selection(&mut self, delta: i64) {
        if let Some(message) = self.store.move_selection(delta) {
            self.viewer.set_viewed(message);
        }
    }

    fn resolve_selected(&self, f: impl FnOnce(&Message) -> Result<(), crate::message::MessageError>) {
        match self.store.selected() {
            Some(message) => {
                if let Err(e) = f(&message) {
                    tracing::warn!("state machine error: {e}");
                }
            }
            None => tracing::warn!("no message selected"),
        }
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::default()
            .direction(LayoutDirection::Vertical)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(25), Constraint::Percentage(25)])
            .split(area);

        self.render_list(frame, chunks[0]);
        self.render_viewer(frame, chunks[1]);
        self.render_console(frame, chunks[2]);

        if self.show_help {
            self.render_help(frame, area);
        }
    }

    fn render_list(&self, frame: &mut Frame, area: Rect) {
        let messages = self.store.all();
        let selected = self.store.selected_index();

        let items: Vec<ListItem> = messages
            .iter()
            .enumerate()
            .map(|(i, message)| {
                let line = self.format_message_line(message);
                if i as i64 == selected {
                    ListItem::new(line).style(Style::default().add_modifier(Modifier::REVERSED))
                } else {
                    ListItem::new(line)
                }
            })
            .collect();

        let title = if self.store.auto_transmit() {
            "Messages [auto-transmit]"
        } else {
            "Messages"
        };
        let list = List::new(items).block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(list, area);
    }

    fn format_message_line(&self, message: &Message) -> String {
        let status_glyph = self.symbols.glyph(match message.status() {
            crate::message::Status::Pending => Symbol::Clock,
            crate::message::Status::Transmitted => Symbol::SentMail,
            crate::message::Status::Dropped => Symbol::TrashCan,
        });
        let direction_glyph = self.symbols.glyph(match message.direction() {
            Direction::ToServer => Symbol::ArrowLeft,
            Direction::ToClient => Symbol::ArrowRight,
        });
        let edited = if message.edited() {
            format!(" {}", self.symbols.glyph(Symbol::Pen))
        } else {
            String::new()
        };

        format!(
            "[{}] {}{} {} ({} bytes)",
            message.created_at().format("%H:%M:%S"),
            status_glyph,
            edited,
            direction_glyph,
            message.len(),
        )
    }

    fn render_viewer(&self, frame: &mut Frame, area: Rect) {
        let title = format!("Message Viewer [{}]", self.viewer.display_mode().label());
        let para = Paragraph::new(self.viewer.render())
            .block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(para, area);
    }

    fn render_console(&self, frame: &mut Frame, area: Rect) {
        let visible_height = area.height.saturating_sub(2) as usize;
        let para = Paragraph::new(self.console.tail(visible_height))
            .block(Block::default().borders(Borders::ALL).title("Debug Console"));
        frame.render_widget(para, area);
    }

    fn render_help(&self, frame: &mut Frame, area: Rect) {
        let lines: Vec<String> =
            MAIN_BINDINGS.iter().map(|b| format!("{:<12} {}", b.keys, b.help)).collect();
        let para = Paragraph::new(lines.join("\n"))
            .block(Block::default().borders(Borders::ALL).title("Help (press h to close)"));
        frame.render_widget(para, centered(area, 40, lines.len() as u16 + 2));
    }
}

/// The viewer pane's height, matching its 25% share of the vertical
/// layout `App::render` builds (list 50 / viewer 25 / console 25), so the
/// viewer's scroll clamping stays in sync with what gets drawn.
fn viewer_pane_height(total: u16) -> u16 {
    total / 4
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    }
}

type Backend = CrosstermBackend<io::Stdout>;

fn setup_terminal() -> anyhow::Result<Terminal<Backend>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    Ok(terminal)
}

fn restore_terminal(mut terminal: Terminal<Backend>) -> anyhow::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Leaves the alternate screen for the duration of the external editor,
/// then restores it once the editor exits.
fn run_editor(terminal: &mut Terminal<Backend>, message: Arc<Message>) -> Event {
    let content = message.content();

    let left = (|| -> anyhow::Result<()> {
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        Ok(())
    })();

    let result = match left {
        Ok(()) => edit_in_external_editor(&content),
        Err(e) => {
            tracing::warn!("failed to relinquish terminal for editor: {e}");
            Err(EditorError::NoEditor)
        }
    };

    if let Err(e) = enable_raw_mode().and_then(|_| execute!(terminal.backend_mut(), EnterAlternateScreen)) {
        tracing::warn!("failed to restore terminal after editor: {e}");
    }
    let _ = terminal.clear();

    Event::EditorCompleted { message, result }
}

/// Drives `App::update` for an event and then executes any commands it
/// returned, feeding their resulting events back in.
fn dispatch(app: &mut App, terminal: &mut Terminal<Backend>, event: Event) {
    let commands = app.update(event);
    for command in commands {
        match command {
            Command::RunEditor(message) => {
                let completed = run_editor(terminal, message);
                dispatch(app, terminal, completed);
            }
        }
    }
}

pub fn run(store: Arc<Store>, console: DebugConsole) -> anyhow::Result<()> {
    let mut terminal = setup_terminal().context("setting up terminal")?;
    let mut app = App::new(store, console);

    let initial_size = terminal.size().context("reading terminal size")?;
    dispatch(&mut app, &mut terminal, Event::Resize(initial_size.width, initial_size.height));

    let mut last_tick = Instant::now();
    let run_result = (|| -> anyhow::Result<()> {
        loop {
            terminal.draw(|frame| app.render(frame))?;

            let timeout = TICK_RATE.saturating_sub(last_tick.elapsed());
            if event::poll(timeout)? {
                match event::read()? {
                    CEvent::Key(key) if key.kind == KeyEventKind::Press => {
                        dispatch(&mut app, &mut terminal, Event::Key(key));
                    }
                    CEvent::Resize(width, height) => {
                        dispatch(&mut app, &mut terminal, Event::Resize(width, height));
                    }
                    _ => {}
                }
            }

            if last_tick.elapsed() >= TICK_RATE {
                dispatch(&mut app, &mut terminal, Event::Tick);
                last_tick = Instant::now();
            }

            if app.should_quit() {
                break;
            }
        }
        Ok(())
    })();

    restore_terminal(terminal).context("restoring terminal")?;
    run_result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Direction;
    use crossterm::event::{KeyCode, KeyEventKind, KeyModifiers};

    fn key_event(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE).with_kind(KeyEventKind::Press)
    }

    fn app_with(store: Arc<Store>) -> App {
        App::new(store, DebugConsole::new())
    }

    #[test]
    fn quit_key_sets_should_quit() {
        let mut app = app_with(Arc::new(Store::new(false)));
        app.update(Event::Key(key_event(KeyCode::Char('q'))));
        assert!(app.should_quit());
    }

    #[test]
    fn tick_promotes_selection_and_views_message() {
        let store = Arc::new(Store::new(false));
        store.append(Arc::new(Message::new(Direction::ToServer, b"hi".to_vec())));
        let mut app = app_with(store);

        app.update(Event::Resize(80, 24));
        app.update(Event::Tick);
        assert_eq!(app.viewer.render(), crate::util::hexdump(b"hi"));
    }

    #[test]
    fn drop_key_resolves_selected_message() {
        let store = Arc::new(Store::new(false));
        let message = Arc::new(Message::new(Direction::ToServer, b"secret".to_vec()));
        store.append(Arc::clone(&message));
        let mut app = app_with(store);

        app.update(Event::Resize(80, 24));
        app.update(Event::Tick);
        app.update(Event::Key(key_event(KeyCode::Char('d'))));

        assert_eq!(message.status(), crate::message::Status::Dropped);
    }

    #[test]
    fn edit_action_produces_run_editor_command() {
        let store = Arc::new(Store::new(false));
        let message = Arc::new(Message::new(Direction::ToServer, b"hi".to_vec()));
        store.append(Arc::clone(&message));
        let mut app = app_with(store);
        app.update(Event::Resize(80, 24));
        app.update(Event::Tick);

        let commands = app.update(Event::Key(key_event(KeyCode::Char('e'))));
        assert_eq!(commands.len(), 1);
        assert!(matches!(commands[0], Command::RunEditor(_)));
    }

    #[test]
    fn editor_completed_event_sets_content() {
        let store = Arc::new(Store::new(false));
        let message = Arc::new(Message::new(Direction::ToServer, b"hi".to_vec()));
        store.append(Arc::clone(&message));
        let mut app = app_with(store);

        app.update(Event::EditorCompleted {
            message: Arc::clone(&message),
            result: Ok(b"bye".to_vec()),
        });

        assert_eq!(message.content(), b"bye");
        assert!(message.edited());
    }
}
