use crate::detail::Detail;
use crate::errors::TestdeckError;
use crate::hotkeys::ListMotion;
use crate::render;
use crate::report;
use crate::runtime::Terminal;
use crate::screens::summary::{SummaryScreen, BOTTOM_ROWS, TOP_ROWS};
use crate::screens::{Ctx, ScreenFault};
use crate::spinner::{busy_banner, with_spinner};
use crate::viewport::Viewport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Tests,
    Trace,
}

/// Failing tests for one leaf group, with the selected traceback
/// wrapped into the right-hand pane.
pub struct DetailScreen {
    pub(crate) summary: SummaryScreen,
    pub(crate) leaf: String,
    pub(crate) detail: Detail,
    pub(crate) selected: String,
    pub(crate) focus: Focus,
    pub(crate) tests: Option<Viewport>,
    pub(crate) trace: Option<Viewport>,
    pub(crate) trace_lines: Vec<String>,
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    pub(crate) inited: bool,
}

impl DetailScreen {
    /// Takes the listing screen it was opened from, plus an already
    /// refreshed dataset for the leaf that was selected there.
    pub fn new(summary: SummaryScreen, detail: Detail) -> Self {
        let leaf = detail.group().to_string();
        let (cols, rows) = (summary.cols, summary.rows);
        DetailScreen {
            summary,
            leaf,
            detail,
            selected: String::new(),
            focus: Focus::Tests,
            tests: None,
            trace: None,
            trace_lines: Vec::new(),
            cols,
            rows,
            inited: false,
        }
    }

    pub fn into_summary(self) -> SummaryScreen {
        self.summary
    }

    fn list_rows(&self) -> usize {
        (self.rows as usize).saturating_sub(TOP_ROWS + BOTTOM_ROWS)
    }

    pub(crate) fn tests_width(&self) -> usize {
        ((self.cols as usize) / 2).saturating_sub(5)
    }

    pub(crate) fn trace_width(&self) -> usize {
        (self.cols as usize)
            .saturating_sub(self.tests_width() + 8)
            .max(8)
    }

    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.cols = cols;
        self.rows = rows;
        if self.inited {
            self.populate();
        }
    }

    pub fn init(&mut self) -> Result<(), ScreenFault> {
        if let Some(first) = self.detail.name(0) {
            self.selected = first.to_string();
        }
        self.populate();
        self.inited = true;
        Ok(())
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Tests => Focus::Trace,
            Focus::Trace => Focus::Tests,
        };
    }

    pub fn selected_traceback(&self) -> Result<String, ScreenFault> {
        if self.selected.is_empty() {
            return Err(ScreenFault::from_error(TestdeckError::Selection(
                "No test selected.".to_string(),
            )));
        }
        let index = self
            .detail_index()
            .ok_or_else(|| ScreenFault::Fault(format!("unknown test: {}", self.selected)))?;
        let record = self
            .detail
            .record(index)
            .ok_or_else(|| ScreenFault::Fault(format!("unknown test: {}", self.selected)))?;
        Ok(record.traceback.clone())
    }

    /// Re-runs the leaf. Returns true when everything now passes and
    /// the listing screen should take over again.
    pub fn refresh(&mut self, ctx: &Ctx<'_>) -> Result<bool, ScreenFault> {
        let (cols, rows) = (self.cols, self.rows);
        let terminal = ctx.terminal;
        let detail = &mut self.detail;
        let outcome = with_spinner(
            |frame| {
                let _ = terminal.draw(&render::busy_frame(cols, rows, &busy_banner(frame)));
            },
            || detail.refresh(ctx.runner),
        );
        match outcome {
            Ok(None) => {}
            Ok(Some(handoff)) => return Err(ScreenFault::Handoff(handoff)),
            Err(err) => return Err(ScreenFault::from_error(err)),
        }

        let totals = self
            .detail
            .totals()
            .ok_or_else(|| ScreenFault::Fault("detail run produced no totals".to_string()))?;
        self.summary
            .summary
            .update(&self.leaf, totals)
            .map_err(ScreenFault::from_error)?;

        if totals.all_passing() {
            return Ok(true);
        }
        if self.detail_index().is_none() {
            self.selected = self.detail.name(0).unwrap_or_default().to_string();
        }
        self.populate();
        Ok(false)
    }

    pub fn move_focused(&mut self, motion: ListMotion, terminal: &dyn Terminal) {
        match self.focus {
            Focus::Tests => self.move_tests(motion, terminal),
            Focus::Trace => self.move_trace(motion, terminal),
        }
    }

    fn move_tests(&mut self, motion: ListMotion, terminal: &dyn Terminal) {
        let Some(tests) = self.tests.as_mut() else {
            return;
        };
        let outcome = match motion {
            ListMotion::Up => tests.scroll(-1),
            ListMotion::Down => tests.scroll(1),
            ListMotion::PageUp => tests.page_up(),
            ListMotion::PageDown => tests.page_down(),
            ListMotion::Home => tests.home(),
            ListMotion::End => tests.end_key(),
        };
        if outcome.refused() {
            terminal.bell();
        }
        if let Some(name) = self.tests.as_ref().and_then(|v| self.detail.name(v.cur_item())) {
            self.selected = name.to_string();
        }
        self.populate_trace();
    }

    // The traceback pane scrolls a pinned-cursor window: the cursor is
    // forced to the window edge so a one-line scroll moves the view
    // rather than the selection.
    fn move_trace(&mut self, motion: ListMotion, terminal: &dyn Terminal) {
        let Some(trace) = self.trace.as_mut() else {
            return;
        };
        let outcome = match motion {
            ListMotion::Up => {
                let _ = trace.move_cursor(0);
                trace.scroll(-1)
            }
            ListMotion::Down => {
                let _ = trace.move_cursor(trace.num_rows().saturating_sub(1));
                trace.scroll(1)
            }
            ListMotion::PageUp => trace.page_up(),
            ListMotion::PageDown => trace.page_down(),
            ListMotion::Home | ListMotion::End => return,
        };
        if outcome.refused() {
            terminal.bell();
        }
    }

    fn detail_index(&self) -> Option<usize> {
        (0..self.detail.len()).find(|&i| self.detail.name(i) == Some(self.selected.as_str()))
    }

    pub(crate) fn populate(&mut self) {
        let num_rows = self.list_rows();
        let num_items = self.detail.len();
        let rebuild = match &self.tests {
            Some(v) => !v.has_shape(num_rows, num_items, TOP_ROWS),
            None => true,
        };
        if rebuild {
            self.tests = Some(Viewport::new(num_rows, num_items, TOP_ROWS));
        }
        if let Some(name) = self.tests.as_ref().and_then(|v| self.detail.name(v.cur_item())) {
            self.selected = name.to_string();
        }
        self.populate_trace();
    }

    fn populate_trace(&mut self) {
        self.trace_lines = match self.detail_index().and_then(|i| self.detail.record(i)) {
            Some(record) => report::wrap_traceback(self.trace_width(), &record.traceback),
            None => Vec::new(),
        };
        self.trace = Some(Viewport::new(
            self.list_rows(),
            self.trace_lines.len(),
            TOP_ROWS,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::FakeWorkerRunner;
    use crate::report::{FailKind, BANNER, RULE_DASH, RULE_EQ};
    use crate::runtime::FakeTerminal;

    fn detail_report(names: &[&str], tail: &str) -> String {
        let mut text = String::new();
        text.push_str(BANNER);
        text.push('\n');
        for name in names {
            text.push_str(RULE_EQ);
            text.push('\n');
            text.push_str(&format!("FAIL: {name} (a.b.CaseOne)\n"));
            text.push_str(RULE_DASH);
            text.push('\n');
            text.push_str("Traceback (most recent call last):\nAssertionError: nope\n");
        }
        text.push_str(RULE_DASH);
        text.push('\n');
        text.push_str(tail);
        text
    }

    fn screen_with(names: &[&str], tail: &str) -> DetailScreen {
        let runner = FakeWorkerRunner::with_reports(vec![detail_report(names, tail)]);
        let mut detail = Detail::new("a.b.CaseOne");
        detail.refresh(&runner).expect("refresh");
        let mut summary = SummaryScreen::new("a", Vec::new());
        summary.resize(80, 24);
        let mut screen = DetailScreen::new(summary, detail);
        screen.init().map_err(|_| "fault").expect("init");
        screen
    }

    #[test]
    fn init_selects_the_first_failing_test_and_wraps_its_trace() {
        let screen = screen_with(
            &["test_a", "test_b"],
            "Ran 4 tests in 0.001s\n\nFAILED (failures=2)\n",
        );
        assert_eq!(screen.selected, "test_a");
        assert!(!screen.trace_lines.is_empty());
        assert_eq!(screen.trace_lines[0], "Traceback (most recent call last):");
        assert_eq!(
            screen.detail.record(0).map(|r| r.kind),
            Some(FailKind::Failure)
        );
    }

    #[test]
    fn moving_in_the_tests_pane_follows_the_selection() {
        let terminal = FakeTerminal::new(80, 24);
        let mut screen = screen_with(
            &["test_a", "test_b"],
            "Ran 4 tests in 0.001s\n\nFAILED (failures=2)\n",
        );
        screen.move_focused(ListMotion::Down, &terminal);
        assert_eq!(screen.selected, "test_b");
        screen.move_focused(ListMotion::Down, &terminal);
        assert_eq!(screen.selected, "test_b");
        assert_eq!(terminal.bell_count(), 1);
    }

    #[test]
    fn trace_focus_motion_leaves_the_selection_alone() {
        let terminal = FakeTerminal::new(80, 24);
        let mut screen = screen_with(
            &["test_a", "test_b"],
            "Ran 4 tests in 0.001s\n\nFAILED (failures=2)\n",
        );
        screen.toggle_focus();
        assert_eq!(screen.focus, Focus::Trace);
        screen.move_focused(ListMotion::Down, &terminal);
        assert_eq!(screen.selected, "test_a");
    }

    #[test]
    fn refresh_reports_when_everything_passes() {
        let mut screen = screen_with(
            &["test_a"],
            "Ran 4 tests in 0.001s\n\nFAILED (failures=1)\n",
        );
        // seed the summary with the leaf so update() can find it
        let runner = FakeWorkerRunner::with_reports(vec![{
            use crate::report::{format_row, format_totals_row, GroupStats};
            let mut text = String::new();
            text.push_str(BANNER);
            text.push('\n');
            text.push_str(&format_row(
                "a.b.CaseOne",
                &GroupStats::Discovered { all: 4 },
            ));
            text.push('\n');
            text.push_str(&format_totals_row(&GroupStats::Discovered { all: 4 }));
            text.push('\n');
            text
        }]);
        screen
            .summary
            .summary
            .refresh(&runner, "a", true)
            .expect("seed");

        let clean = FakeWorkerRunner::with_reports(vec![detail_report(
            &[],
            "Ran 4 tests in 0.001s\n\nOK\n",
        )]);
        let terminal = FakeTerminal::new(80, 24);
        let ctx = Ctx {
            terminal: &terminal,
            runner: &clean,
        };
        let back = screen.refresh(&ctx).map_err(|_| "fault").expect("refresh");
        assert!(back);
        assert!(screen
            .summary
            .summary
            .totals()
            .expect("totals")
            .all_passing());
    }

    #[test]
    fn traceback_lookup_without_a_selection_is_a_fault() {
        let mut screen = screen_with(&[], "Ran 4 tests in 0.001s\n\nOK\n");
        screen.selected.clear();
        match screen.selected_traceback() {
            Err(ScreenFault::Fault(msg)) => assert!(msg.contains("selected")),
            _ => panic!("expected a selection fault"),
        }
    }
}
