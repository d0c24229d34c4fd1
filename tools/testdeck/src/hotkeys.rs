/// Decoded terminal keys, independent of the input backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiKey {
    Char(char),
    Up,
    Down,
    Left,
    Right,
    PageUp,
    PageDown,
    Home,
    End,
    Enter,
    Tab,
    Backspace,
    Esc,
    F5,
    CtrlL,
}

/// Cursor motions shared by the listing panes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMotion {
    Up,
    Down,
    PageUp,
    PageDown,
    Home,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryAction {
    Quit,
    Motion(ListMotion),
    /// Rebuild the whole listing from scratch.
    Reload,
    /// Run the selection, switching to the detail screen on failures.
    Activate,
    /// Run the selection without leaving the listing.
    RunInPlace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailAction {
    Back,
    Motion(ListMotion),
    ToggleFocus,
    Refresh,
    /// Open the selected test's traceback full-screen.
    OpenTrace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceAction {
    Back,
    LineUp,
    LineDown,
    PageUp,
    PageDown,
}

pub fn summary_action(key: UiKey) -> Option<SummaryAction> {
    match key {
        UiKey::Char('q') => Some(SummaryAction::Quit),
        UiKey::Up => Some(SummaryAction::Motion(ListMotion::Up)),
        UiKey::Down => Some(SummaryAction::Motion(ListMotion::Down)),
        UiKey::PageUp => Some(SummaryAction::Motion(ListMotion::PageUp)),
        UiKey::PageDown => Some(SummaryAction::Motion(ListMotion::PageDown)),
        UiKey::Home => Some(SummaryAction::Motion(ListMotion::Home)),
        UiKey::End => Some(SummaryAction::Motion(ListMotion::End)),
        UiKey::CtrlL => Some(SummaryAction::Reload),
        UiKey::Enter | UiKey::Right | UiKey::F5 => Some(SummaryAction::Activate),
        UiKey::Char(' ') => Some(SummaryAction::RunInPlace),
        _ => None,
    }
}

pub fn detail_action(key: UiKey) -> Option<DetailAction> {
    match key {
        UiKey::Char('q') | UiKey::Backspace | UiKey::Esc | UiKey::Left => {
            Some(DetailAction::Back)
        }
        UiKey::Enter | UiKey::Right => Some(DetailAction::OpenTrace),
        UiKey::Char(' ') | UiKey::F5 => Some(DetailAction::Refresh),
        UiKey::Tab => Some(DetailAction::ToggleFocus),
        UiKey::Up => Some(DetailAction::Motion(ListMotion::Up)),
        UiKey::Down => Some(DetailAction::Motion(ListMotion::Down)),
        UiKey::PageUp => Some(DetailAction::Motion(ListMotion::PageUp)),
        UiKey::PageDown => Some(DetailAction::Motion(ListMotion::PageDown)),
        UiKey::Home => Some(DetailAction::Motion(ListMotion::Home)),
        UiKey::End => Some(DetailAction::Motion(ListMotion::End)),
        _ => None,
    }
}

pub fn trace_action(key: UiKey) -> Option<TraceAction> {
    match key {
        UiKey::Char('q') | UiKey::Backspace | UiKey::Esc | UiKey::Left => {
            Some(TraceAction::Back)
        }
        UiKey::Up => Some(TraceAction::LineUp),
        UiKey::Down => Some(TraceAction::LineDown),
        UiKey::PageUp => Some(TraceAction::PageUp),
        UiKey::PageDown => Some(TraceAction::PageDown),
        _ => None,
    }
}

pub fn summary_legend() -> &'static str {
    "enter run  space run in place  ^L reload  q quit"
}

pub fn detail_legend() -> &'static str {
    "enter traceback  space rerun  tab focus  q back"
}

pub fn trace_legend() -> &'static str {
    "arrows scroll  q back"
}
