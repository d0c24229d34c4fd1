use crate::errors::TestdeckError;
use crate::hotkeys::UiKey;
use std::collections::{HashMap, VecDeque};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEvent {
    Key(UiKey),
    Resize(u16, u16),
}

pub trait FileSystem: Send + Sync {
    fn read_to_string(&self, path: &Path) -> Result<String, TestdeckError>;
    fn exists(&self, path: &Path) -> bool;
}

pub trait Terminal: Send + Sync {
    fn stdin_is_tty(&self) -> bool;
    /// (columns, rows)
    fn size(&self) -> Result<(u16, u16), TestdeckError>;
    fn next_event(&self) -> Result<UiEvent, TestdeckError>;
    /// Echoed line input for the debugger console.
    fn read_line(&self) -> Result<String, TestdeckError>;
    fn draw(&self, frame: &str) -> Result<(), TestdeckError>;
    fn write_line(&self, line: &str) -> Result<(), TestdeckError>;
    fn bell(&self);
}

pub struct ProductionFileSystem;

impl FileSystem for ProductionFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String, TestdeckError> {
        std::fs::read_to_string(path).map_err(|e| TestdeckError::Io(e.to_string()))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

pub struct ProductionTerminal;

impl ProductionTerminal {
    fn map_key(key: crossterm::event::KeyEvent) -> Option<UiKey> {
        use crossterm::event::{KeyCode, KeyModifiers};
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('l') => Some(UiKey::CtrlL),
                KeyCode::Char('c') => Some(UiKey::Char('q')),
                _ => None,
            };
        }
        match key.code {
            KeyCode::Char(c) => Some(UiKey::Char(c)),
            KeyCode::Up => Some(UiKey::Up),
            KeyCode::Down => Some(UiKey::Down),
            KeyCode::Left => Some(UiKey::Left),
            KeyCode::Right => Some(UiKey::Right),
            KeyCode::PageUp => Some(UiKey::PageUp),
            KeyCode::PageDown => Some(UiKey::PageDown),
            KeyCode::Home => Some(UiKey::Home),
            KeyCode::End => Some(UiKey::End),
            KeyCode::Enter => Some(UiKey::Enter),
            KeyCode::Tab => Some(UiKey::Tab),
            KeyCode::Backspace => Some(UiKey::Backspace),
            KeyCode::Esc => Some(UiKey::Esc),
            KeyCode::F(5) => Some(UiKey::F5),
            _ => None,
        }
    }
}

impl Terminal for ProductionTerminal {
    fn stdin_is_tty(&self) -> bool {
        std::io::IsTerminal::is_terminal(&std::io::stdin())
    }

    fn size(&self) -> Result<(u16, u16), TestdeckError> {
        crossterm::terminal::size().map_err(|e| TestdeckError::Io(e.to_string()))
    }

    fn next_event(&self) -> Result<UiEvent, TestdeckError> {
        use crossterm::event::{Event, KeyEventKind};
        loop {
            let event = crossterm::event::read().map_err(|e| TestdeckError::Io(e.to_string()))?;
            match event {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if let Some(key) = Self::map_key(key) {
                        return Ok(UiEvent::Key(key));
                    }
                }
                Event::Resize(cols, rows) => return Ok(UiEvent::Resize(cols, rows)),
                _ => {}
            }
        }
    }

    fn read_line(&self) -> Result<String, TestdeckError> {
        use crossterm::cursor::{Hide, Show};
        let mut out = std::io::stdout();
        crossterm::terminal::disable_raw_mode().map_err(|e| TestdeckError::Io(e.to_string()))?;
        crossterm::execute!(out, Show).map_err(|e| TestdeckError::Io(e.to_string()))?;

        let mut line = String::new();
        let read = std::io::stdin().read_line(&mut line);

        crossterm::execute!(out, Hide).map_err(|e| TestdeckError::Io(e.to_string()))?;
        crossterm::terminal::enable_raw_mode().map_err(|e| TestdeckError::Io(e.to_string()))?;
        read.map_err(|e| TestdeckError::Io(e.to_string()))?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn draw(&self, frame: &str) -> Result<(), TestdeckError> {
        use crossterm::cursor::MoveTo;
        use crossterm::style::Print;
        use crossterm::terminal::{Clear, ClearType};
        let mut out = std::io::stdout();
        crossterm::queue!(out, MoveTo(0, 0), Clear(ClearType::All))
            .map_err(|e| TestdeckError::Io(e.to_string()))?;
        for (row, line) in frame.lines().enumerate() {
            crossterm::queue!(out, MoveTo(0, row as u16), Print(line))
                .map_err(|e| TestdeckError::Io(e.to_string()))?;
        }
        out.flush().map_err(|e| TestdeckError::Io(e.to_string()))
    }

    fn write_line(&self, line: &str) -> Result<(), TestdeckError> {
        let mut out = std::io::stdout();
        writeln!(out, "{line}").map_err(|e| TestdeckError::Io(e.to_string()))
    }

    fn bell(&self) {
        let mut out = std::io::stdout();
        let _ = out.write_all(b"\x07");
        let _ = out.flush();
    }
}

/// Puts the terminal into raw mode on an alternate screen, restoring
/// both when dropped.
pub struct TerminalGuard;

impl TerminalGuard {
    pub fn enter() -> Result<Self, TestdeckError> {
        use crossterm::cursor::Hide;
        use crossterm::terminal::EnterAlternateScreen;
        crossterm::terminal::enable_raw_mode().map_err(|e| TestdeckError::Io(e.to_string()))?;
        crossterm::execute!(std::io::stdout(), EnterAlternateScreen, Hide)
            .map_err(|e| TestdeckError::Io(e.to_string()))?;
        Ok(TerminalGuard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        use crossterm::cursor::Show;
        use crossterm::terminal::LeaveAlternateScreen;
        let _ = crossterm::execute!(std::io::stdout(), LeaveAlternateScreen, Show);
        let _ = crossterm::terminal::disable_raw_mode();
    }
}

#[derive(Default, Clone)]
pub struct FakeFileSystem {
    files: Arc<Mutex<HashMap<PathBuf, String>>>,
}

impl FakeFileSystem {
    pub fn with_file(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        let mut map = HashMap::new();
        map.insert(path.into(), contents.into());
        Self {
            files: Arc::new(Mutex::new(map)),
        }
    }
}

impl FileSystem for FakeFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String, TestdeckError> {
        self.files
            .lock()
            .expect("files lock")
            .get(path)
            .cloned()
            .ok_or_else(|| TestdeckError::Io(format!("missing file {}", path.display())))
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.lock().expect("files lock").contains_key(path)
    }
}

#[derive(Clone)]
pub struct FakeTerminal {
    pub is_tty: bool,
    size: Arc<Mutex<(u16, u16)>>,
    events: Arc<Mutex<VecDeque<UiEvent>>>,
    lines: Arc<Mutex<VecDeque<String>>>,
    draws: Arc<Mutex<Vec<String>>>,
    bells: Arc<Mutex<u32>>,
}

impl FakeTerminal {
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            is_tty: true,
            size: Arc::new(Mutex::new((cols, rows))),
            events: Arc::new(Mutex::new(VecDeque::new())),
            lines: Arc::new(Mutex::new(VecDeque::new())),
            draws: Arc::new(Mutex::new(Vec::new())),
            bells: Arc::new(Mutex::new(0)),
        }
    }

    pub fn push_key(&self, key: UiKey) {
        self.events
            .lock()
            .expect("events lock")
            .push_back(UiEvent::Key(key));
    }

    pub fn push_line(&self, line: &str) {
        self.lines
            .lock()
            .expect("lines lock")
            .push_back(line.to_string());
    }

    pub fn drawn_frames(&self) -> Vec<String> {
        self.draws.lock().expect("draws lock").clone()
    }

    pub fn bell_count(&self) -> u32 {
        *self.bells.lock().expect("bells lock")
    }
}

impl Terminal for FakeTerminal {
    fn stdin_is_tty(&self) -> bool {
        self.is_tty
    }

    fn size(&self) -> Result<(u16, u16), TestdeckError> {
        Ok(*self.size.lock().expect("size lock"))
    }

    fn next_event(&self) -> Result<UiEvent, TestdeckError> {
        self.events
            .lock()
            .expect("events lock")
            .pop_front()
            .ok_or_else(|| TestdeckError::Io("no scripted event queued".to_string()))
    }

    fn read_line(&self) -> Result<String, TestdeckError> {
        self.lines
            .lock()
            .expect("lines lock")
            .pop_front()
            .ok_or_else(|| TestdeckError::Io("no scripted line queued".to_string()))
    }

    fn draw(&self, frame: &str) -> Result<(), TestdeckError> {
        self.draws
            .lock()
            .expect("draws lock")
            .push(frame.to_string());
        Ok(())
    }

    fn write_line(&self, _line: &str) -> Result<(), TestdeckError> {
        Ok(())
    }

    fn bell(&self) {
        *self.bells.lock().expect("bells lock") += 1;
    }
}
