use crate::bridge::{Turn, WorkerHandoff, WorkerSession};
use crate::screens::{Screen, ScreenFault};

/// Console proxy for a worker stopped at its debugger prompt. Lines
/// typed by the user go to the child; its replies accumulate in the
/// transcript until the child exits.
pub struct DebuggingScreen {
    pub(crate) prev: Box<Screen>,
    pub(crate) session: WorkerSession,
    pub(crate) transcript: String,
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    pub(crate) inited: bool,
}

impl DebuggingScreen {
    pub fn over(prev: Screen, handoff: WorkerHandoff) -> Self {
        DebuggingScreen {
            prev: Box::new(prev),
            session: handoff.session,
            transcript: handoff.intro,
            cols: 0,
            rows: 0,
            inited: false,
        }
    }

    pub fn into_prev(self) -> Screen {
        // Dropping the session here kills a child that is still alive.
        *self.prev
    }

    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.cols = cols;
        self.rows = rows;
    }

    pub fn init(&mut self) -> Result<(), ScreenFault> {
        self.inited = true;
        Ok(())
    }

    /// Sends one command line. Returns true once the child has exited
    /// and the covered screen should take over again.
    pub fn converse(&mut self, line: &str) -> Result<bool, ScreenFault> {
        if self.session.is_finished() {
            return Ok(true);
        }
        self.transcript.push_str(line);
        self.transcript.push('\n');
        match self.session.converse(line).map_err(ScreenFault::from_error)? {
            Turn::Interactive(text) => {
                self.transcript.push_str(&text);
                Ok(false)
            }
            Turn::Complete(text) => {
                self.transcript.push_str(&text);
                Ok(true)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{RecordedInput, WorkerSession};
    use crate::screens::SummaryScreen;

    fn handoff(feed: &str, input: RecordedInput) -> WorkerHandoff {
        WorkerHandoff {
            intro: "AssertionError\n(dbg) ".to_string(),
            session: WorkerSession::scripted(feed, input),
        }
    }

    #[test]
    fn lines_are_proxied_until_the_child_exits() {
        let input = RecordedInput::default();
        let prev = Screen::Summary(SummaryScreen::new("a", Vec::new()));
        let mut screen = DebuggingScreen::over(prev, handoff("x is 42\n(dbg) bye\n", input.clone()));
        screen.init().map_err(|_| "fault").expect("init");

        assert!(!screen.converse("p x").map_err(|_| "fault").expect("turn"));
        assert!(screen.transcript.contains("p x"));
        assert!(screen.transcript.contains("x is 42"));

        assert!(screen.converse("c").map_err(|_| "fault").expect("turn"));
        assert!(screen.transcript.ends_with("bye\n"));
        assert_eq!(input.lines(), vec!["p x", "c"]);

        match screen.into_prev() {
            Screen::Summary(_) => {}
            _ => panic!("expected the summary screen back"),
        }
    }

    #[test]
    fn a_finished_session_returns_control_immediately() {
        let input = RecordedInput::default();
        let prev = Screen::Summary(SummaryScreen::new("a", Vec::new()));
        let mut screen = DebuggingScreen::over(prev, handoff("", input));
        screen.init().map_err(|_| "fault").expect("init");

        assert!(screen.converse("c").map_err(|_| "fault").expect("turn"));
        assert!(screen.converse("anything").map_err(|_| "fault").expect("turn"));
    }
}
