pub mod debugging;
pub mod detail;
pub mod error;
pub mod summary;

pub use debugging::DebuggingScreen;
pub use detail::DetailScreen;
pub use error::ErrorScreen;
pub use summary::SummaryScreen;

use crate::bridge::{WorkerHandoff, WorkerRunner};
use crate::errors::TestdeckError;
use crate::hotkeys::{self, summary_action, SummaryAction, UiKey};
use crate::runtime::Terminal;

/// Shared handles passed to every screen operation.
pub struct Ctx<'a> {
    pub terminal: &'a dyn Terminal,
    pub runner: &'a dyn WorkerRunner,
}

/// Why an operation could not complete on its own screen. The machine
/// converts these into the error and debugging screens.
pub enum ScreenFault {
    Handoff(WorkerHandoff),
    Fault(String),
}

impl ScreenFault {
    pub fn from_error(err: TestdeckError) -> Self {
        match err {
            // The worker's whole captured stream is the diagnostic.
            TestdeckError::Worker(diag) => ScreenFault::Fault(diag),
            other => ScreenFault::Fault(other.to_string()),
        }
    }
}

/// A fault carrying the screen it happened on, so the recovery screen
/// can return there afterwards.
pub struct Faulted {
    pub screen: Screen,
    pub fault: ScreenFault,
}

pub enum Flow {
    Stay(Screen),
    Switch(Screen),
    Quit,
}

pub enum Screen {
    Summary(SummaryScreen),
    Detail(DetailScreen),
    Error(ErrorScreen),
    Debugging(DebuggingScreen),
}

impl Screen {
    pub fn name(&self) -> &'static str {
        match self {
            Screen::Summary(_) => "summary",
            Screen::Detail(_) => "detail",
            Screen::Error(_) => "error",
            Screen::Debugging(_) => "debugging",
        }
    }

    pub fn inited(&self) -> bool {
        match self {
            Screen::Summary(s) => s.inited,
            Screen::Detail(s) => s.inited,
            Screen::Error(s) => s.inited,
            Screen::Debugging(s) => s.inited,
        }
    }

    /// The debugger console reads whole echoed lines instead of keys.
    pub fn line_input(&self) -> bool {
        matches!(self, Screen::Debugging(_))
    }

    pub fn resize(&mut self, cols: u16, rows: u16) {
        match self {
            Screen::Summary(s) => s.resize(cols, rows),
            Screen::Detail(s) => s.resize(cols, rows),
            Screen::Error(s) => s.resize(cols, rows),
            Screen::Debugging(s) => s.resize(cols, rows),
        }
    }

    /// One-time setup after the first resize. Runs again only if a
    /// previous attempt faulted before finishing.
    pub fn init(mut self, ctx: &Ctx<'_>) -> Result<Screen, Faulted> {
        let fault = match &mut self {
            Screen::Summary(s) => s.init(ctx).err(),
            Screen::Detail(s) => s.init().err(),
            Screen::Error(s) => s.init().err(),
            Screen::Debugging(s) => s.init().err(),
        };
        match fault {
            None => Ok(self),
            Some(fault) => Err(Faulted {
                screen: self,
                fault,
            }),
        }
    }

    pub fn react_key(self, key: UiKey, ctx: &Ctx<'_>) -> Result<Flow, Faulted> {
        match self {
            Screen::Summary(s) => react_summary(s, key, ctx),
            Screen::Detail(s) => react_detail(s, key, ctx),
            Screen::Error(s) => react_error(s, key, ctx),
            // Key events reaching a console screen are dropped.
            other @ Screen::Debugging(_) => Ok(Flow::Stay(other)),
        }
    }

    pub fn react_line(self, line: &str, ctx: &Ctx<'_>) -> Result<Flow, Faulted> {
        match self {
            Screen::Debugging(s) => react_debugging(s, line, ctx),
            other => Ok(Flow::Stay(other)),
        }
    }
}

fn react_summary(
    mut screen: SummaryScreen,
    key: UiKey,
    ctx: &Ctx<'_>,
) -> Result<Flow, Faulted> {
    let Some(action) = summary_action(key) else {
        return Ok(Flow::Stay(Screen::Summary(screen)));
    };
    match action {
        SummaryAction::Quit => Ok(Flow::Quit),
        SummaryAction::Motion(motion) => {
            screen.move_listing(motion, ctx.terminal);
            Ok(Flow::Stay(Screen::Summary(screen)))
        }
        SummaryAction::Reload => match screen.reload(ctx) {
            Ok(()) => Ok(Flow::Stay(Screen::Summary(screen))),
            Err(fault) => Err(Faulted {
                screen: Screen::Summary(screen),
                fault,
            }),
        },
        SummaryAction::RunInPlace => match screen.activate(ctx) {
            Ok(_detail) => Ok(Flow::Stay(Screen::Summary(screen))),
            Err(fault) => Err(Faulted {
                screen: Screen::Summary(screen),
                fault,
            }),
        },
        SummaryAction::Activate => match screen.activate(ctx) {
            Ok(Some(detail)) => Ok(Flow::Switch(Screen::Detail(DetailScreen::new(
                screen, detail,
            )))),
            Ok(None) => Ok(Flow::Stay(Screen::Summary(screen))),
            Err(fault) => Err(Faulted {
                screen: Screen::Summary(screen),
                fault,
            }),
        },
    }
}

fn react_detail(mut screen: DetailScreen, key: UiKey, ctx: &Ctx<'_>) -> Result<Flow, Faulted> {
    use crate::hotkeys::DetailAction;
    let Some(action) = hotkeys::detail_action(key) else {
        return Ok(Flow::Stay(Screen::Detail(screen)));
    };
    match action {
        DetailAction::Back => Ok(Flow::Switch(Screen::Summary(screen.into_summary()))),
        DetailAction::OpenTrace => match screen.selected_traceback() {
            Ok(trace) => Ok(Flow::Switch(Screen::Error(ErrorScreen::over(
                Screen::Detail(screen),
                trace,
            )))),
            Err(fault) => Err(Faulted {
                screen: Screen::Detail(screen),
                fault,
            }),
        },
        DetailAction::Refresh => match screen.refresh(ctx) {
            Ok(true) => Ok(Flow::Switch(Screen::Summary(screen.into_summary()))),
            Ok(false) => Ok(Flow::Stay(Screen::Detail(screen))),
            Err(fault) => Err(Faulted {
                screen: Screen::Detail(screen),
                fault,
            }),
        },
        DetailAction::ToggleFocus => {
            screen.toggle_focus();
            Ok(Flow::Stay(Screen::Detail(screen)))
        }
        DetailAction::Motion(motion) => {
            screen.move_focused(motion, ctx.terminal);
            Ok(Flow::Stay(Screen::Detail(screen)))
        }
    }
}

fn react_error(mut screen: ErrorScreen, key: UiKey, ctx: &Ctx<'_>) -> Result<Flow, Faulted> {
    use crate::hotkeys::TraceAction;
    let Some(action) = hotkeys::trace_action(key) else {
        return Ok(Flow::Stay(Screen::Error(screen)));
    };
    match action {
        TraceAction::Back => Ok(Flow::Switch(screen.into_prev())),
        other => {
            screen.apply(other, ctx.terminal);
            Ok(Flow::Stay(Screen::Error(screen)))
        }
    }
}

fn react_debugging(
    mut screen: DebuggingScreen,
    line: &str,
    _ctx: &Ctx<'_>,
) -> Result<Flow, Faulted> {
    match screen.converse(line) {
        Ok(true) => Ok(Flow::Switch(screen.into_prev())),
        Ok(false) => Ok(Flow::Stay(Screen::Debugging(screen))),
        Err(fault) => Err(Faulted {
            screen: Screen::Debugging(screen),
            fault,
        }),
    }
}
