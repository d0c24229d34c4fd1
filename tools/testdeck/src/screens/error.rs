use crate::hotkeys::TraceAction;
use crate::report;
use crate::runtime::Terminal;
use crate::screens::{Screen, ScreenFault};
use crate::viewport::Viewport;

/// Full-screen traceback viewer. Shown for faults and for tracebacks
/// opened from the detail screen; returns to the screen it covered.
pub struct ErrorScreen {
    pub(crate) prev: Box<Screen>,
    pub(crate) traceback: String,
    pub(crate) lines: Vec<String>,
    pub(crate) area: Option<Viewport>,
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    pub(crate) inited: bool,
}

impl ErrorScreen {
    pub fn over(prev: Screen, traceback: String) -> Self {
        ErrorScreen {
            prev: Box::new(prev),
            traceback,
            lines: Vec::new(),
            area: None,
            cols: 0,
            rows: 0,
            inited: false,
        }
    }

    pub fn into_prev(self) -> Screen {
        *self.prev
    }

    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.cols = cols;
        self.rows = rows;
        self.lines = report::wrap_traceback((cols as usize).saturating_sub(2), &self.traceback);
        self.area = Some(Viewport::new(
            (rows as usize).saturating_sub(1),
            self.lines.len(),
            0,
        ));
    }

    pub fn init(&mut self) -> Result<(), ScreenFault> {
        self.inited = true;
        Ok(())
    }

    pub fn apply(&mut self, action: TraceAction, terminal: &dyn Terminal) {
        let Some(area) = self.area.as_mut() else {
            return;
        };
        let outcome = match action {
            TraceAction::LineUp => {
                let _ = area.move_cursor(0);
                area.scroll(-1)
            }
            TraceAction::LineDown => {
                let _ = area.move_cursor(area.num_rows().saturating_sub(1));
                area.scroll(1)
            }
            TraceAction::PageUp => area.page_up(),
            TraceAction::PageDown => area.page_down(),
            TraceAction::Back => return,
        };
        if outcome.refused() {
            terminal.bell();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::FakeTerminal;
    use crate::screens::SummaryScreen;

    fn long_traceback() -> String {
        let mut tb = String::from("Traceback (most recent call last):\n");
        for i in 0..40 {
            tb.push_str(&format!("File \"deck/mod_{i}.py\", line {i}, in step\n"));
        }
        tb.push_str("AssertionError: deep failure");
        tb
    }

    fn screen() -> ErrorScreen {
        let prev = Screen::Summary(SummaryScreen::new("a", Vec::new()));
        let mut screen = ErrorScreen::over(prev, long_traceback());
        screen.resize(80, 24);
        screen.init().map_err(|_| "fault").expect("init");
        screen
    }

    #[test]
    fn resize_rewraps_and_rebuilds_the_viewport() {
        let mut screen = screen();
        assert!(screen.lines.len() > 23);
        let wide = screen.lines.len();
        screen.resize(40, 24);
        assert!(screen.lines.len() >= wide);
        assert!(screen.lines.iter().all(|line| line.len() <= 38));
    }

    #[test]
    fn line_scrolling_moves_the_window_not_the_cursor_row() {
        let terminal = FakeTerminal::new(80, 24);
        let mut screen = screen();
        let area = screen.area.as_ref().expect("area");
        assert_eq!(area.start(), 0);

        screen.apply(TraceAction::LineDown, &terminal);
        let area = screen.area.as_ref().expect("area");
        // cursor pinned to the bottom row; the window slid by one
        assert_eq!(area.start(), 1);

        screen.apply(TraceAction::LineUp, &terminal);
        let area = screen.area.as_ref().expect("area");
        assert_eq!(area.start(), 0);
    }

    #[test]
    fn back_returns_the_covered_screen() {
        let screen = screen();
        match screen.into_prev() {
            Screen::Summary(_) => {}
            _ => panic!("expected the summary screen back"),
        }
    }
}
