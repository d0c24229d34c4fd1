use serde_json::json;

use crate::bridge::WorkerRunner;
use crate::errors::TestdeckError;
use crate::hotkeys::UiKey;
use crate::logging::{JsonlLogger, LogEvent};
use crate::render;
use crate::runtime::{Terminal, UiEvent};
use crate::screens::{Ctx, DebuggingScreen, ErrorScreen, Faulted, Flow, Screen, ScreenFault, SummaryScreen};

const MIN_COLS: u16 = 40;
const MIN_ROWS: u16 = 10;

/// Event loop driving the screen graph until the user quits.
///
/// The size is polled every pass. A change forces a resize before any
/// further input is consumed, and switches reset the remembered size so
/// the incoming screen gets its own resize pass.
pub fn run(
    terminal: &dyn Terminal,
    runner: &dyn WorkerRunner,
    logger: Option<&JsonlLogger>,
    root: &str,
    stopwords: Vec<String>,
) -> Result<(), TestdeckError> {
    let ctx = Ctx { terminal, runner };
    let mut screen = Screen::Summary(SummaryScreen::new(root, stopwords));
    let mut last = (0u16, 0u16);

    loop {
        let (cols, rows) = terminal.size()?;
        if cols < MIN_COLS || rows < MIN_ROWS {
            terminal.draw(&render::notice_frame(cols, rows, "Terminal too small."))?;
            match terminal.next_event()? {
                UiEvent::Key(UiKey::Char('q')) => return Ok(()),
                _ => continue,
            }
        }

        if (cols, rows) != last {
            last = (cols, rows);
            screen.resize(cols, rows);
            terminal.draw(&render::screen_frame(&screen))?;
            continue;
        }

        if !screen.inited() {
            match screen.init(&ctx) {
                Ok(ready) => {
                    screen = ready;
                    terminal.draw(&render::screen_frame(&screen))?;
                }
                Err(faulted) => {
                    screen = recover(faulted, logger);
                    last = (0, 0);
                }
            }
            continue;
        }

        let flow = if screen.line_input() {
            let line = terminal.read_line()?;
            screen.react_line(&line, &ctx)
        } else {
            match terminal.next_event()? {
                // The next size poll picks the new dimensions up.
                UiEvent::Resize(_, _) => continue,
                UiEvent::Key(key) => screen.react_key(key, &ctx),
            }
        };

        match flow {
            Ok(Flow::Stay(same)) => {
                screen = same;
                terminal.draw(&render::screen_frame(&screen))?;
            }
            Ok(Flow::Switch(next)) => {
                log(
                    logger,
                    "info",
                    "screen_switch",
                    json!({ "to": next.name() }),
                );
                screen = next;
                last = (0, 0);
            }
            Ok(Flow::Quit) => return Ok(()),
            Err(faulted) => {
                screen = recover(faulted, logger);
                last = (0, 0);
            }
        }
    }
}

fn recover(faulted: Faulted, logger: Option<&JsonlLogger>) -> Screen {
    let from = faulted.screen.name();
    match faulted.fault {
        ScreenFault::Handoff(handoff) => {
            log(logger, "info", "handoff", json!({ "screen": from }));
            Screen::Debugging(DebuggingScreen::over(faulted.screen, handoff))
        }
        ScreenFault::Fault(message) => {
            log(
                logger,
                "error",
                "fault",
                json!({ "screen": from, "message": message }),
            );
            Screen::Error(ErrorScreen::over(faulted.screen, message))
        }
    }
}

// Logging never interrupts the session.
fn log(logger: Option<&JsonlLogger>, level: &str, event_type: &str, payload: serde_json::Value) {
    if let Some(logger) = logger {
        let _ = logger.append(&LogEvent {
            level,
            event_type,
            payload,
        });
    }
}
