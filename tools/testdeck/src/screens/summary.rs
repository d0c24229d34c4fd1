use crate::bridge::WorkerRunner;
use crate::detail::Detail;
use crate::errors::TestdeckError;
use crate::hotkeys::ListMotion;
use crate::render;
use crate::runtime::Terminal;
use crate::screens::{Ctx, ScreenFault};
use crate::spinner::{busy_banner, with_spinner};
use crate::summary::Summary;
use crate::viewport::Viewport;

pub(crate) const TOP_ROWS: usize = 3;
pub(crate) const BOTTOM_ROWS: usize = 3;

/// The main group listing.
pub struct SummaryScreen {
    pub(crate) root: String,
    pub(crate) stopwords: Vec<String>,
    pub(crate) summary: Summary,
    pub(crate) listing: Option<Viewport>,
    pub(crate) selected: String,
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    pub(crate) inited: bool,
}

impl SummaryScreen {
    pub fn new(root: &str, stopwords: Vec<String>) -> Self {
        SummaryScreen {
            root: root.to_string(),
            stopwords: stopwords.clone(),
            summary: Summary::new(stopwords),
            listing: None,
            selected: String::new(),
            cols: 0,
            rows: 0,
            inited: false,
        }
    }

    pub(crate) fn list_rows(&self) -> usize {
        (self.rows as usize).saturating_sub(TOP_ROWS + BOTTOM_ROWS)
    }

    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.cols = cols;
        self.rows = rows;
        if self.inited {
            self.populate();
        }
    }

    pub fn init(&mut self, ctx: &Ctx<'_>) -> Result<(), ScreenFault> {
        let root = self.root.clone();
        self.spin_refresh(ctx, &root, true)?;
        self.update_selection();
        self.populate();
        self.inited = true;
        Ok(())
    }

    /// Discard everything and discover the root group afresh.
    pub fn reload(&mut self, ctx: &Ctx<'_>) -> Result<(), ScreenFault> {
        self.summary = Summary::new(self.stopwords.clone());
        let root = self.root.clone();
        self.spin_refresh(ctx, &root, true)?;
        self.update_selection();
        self.populate();
        Ok(())
    }

    /// Run the current selection. A leaf runs in detail mode, updating
    /// its summary row; the fresh dataset is returned unless everything
    /// passed. An interior node re-runs its whole subtree in place.
    pub fn activate(&mut self, ctx: &Ctx<'_>) -> Result<Option<Detail>, ScreenFault> {
        if self.selected.is_empty() {
            return Err(ScreenFault::from_error(TestdeckError::Selection(
                "No group selected.".to_string(),
            )));
        }
        let is_leaf = self
            .summary
            .position_of(&self.selected)
            .and_then(|i| self.summary.row(i))
            .is_some_and(|row| row.is_leaf());

        if is_leaf {
            let detail = self.run_leaf(ctx)?;
            let all_passing = detail.totals().is_some_and(|t| t.all_passing());
            Ok((!all_passing).then_some(detail))
        } else {
            let group = self.selected.clone();
            self.spin_refresh(ctx, &group, false)?;
            self.update_selection();
            self.populate();
            Ok(None)
        }
    }

    pub fn move_listing(&mut self, motion: ListMotion, terminal: &dyn Terminal) {
        let Some(listing) = self.listing.as_mut() else {
            return;
        };
        let outcome = match motion {
            ListMotion::Up => listing.scroll(-1),
            ListMotion::Down => listing.scroll(1),
            ListMotion::PageUp => listing.page_up(),
            ListMotion::PageDown => listing.page_down(),
            ListMotion::Home => listing.home(),
            ListMotion::End => listing.end_key(),
        };
        if outcome.refused() {
            terminal.bell();
        }
        self.sync_selection();
    }

    pub(crate) fn populate(&mut self) {
        let num_rows = self.list_rows();
        let num_items = self.summary.len();
        let rebuild = match &self.listing {
            Some(v) => !v.has_shape(num_rows, num_items, TOP_ROWS),
            None => true,
        };
        if rebuild {
            self.listing = Some(Viewport::new(num_rows, num_items, TOP_ROWS));
        }
        self.sync_selection();
    }

    fn update_selection(&mut self) {
        if self.selected.is_empty() {
            if let Some(first) = self.summary.names().next() {
                self.selected = first.to_string();
            }
        }
    }

    fn sync_selection(&mut self) {
        let Some(listing) = &self.listing else {
            return;
        };
        if let Some(row) = self.summary.row(listing.cur_item()) {
            self.selected = row.name.to_string();
        }
    }

    fn run_leaf(&mut self, ctx: &Ctx<'_>) -> Result<Detail, ScreenFault> {
        let mut detail = Detail::new(&self.selected);
        let outcome = self.spin(ctx, |runner| detail.refresh(runner));
        match outcome {
            Ok(None) => {}
            Ok(Some(handoff)) => return Err(ScreenFault::Handoff(handoff)),
            Err(err) => return Err(ScreenFault::from_error(err)),
        }
        let totals = detail
            .totals()
            .ok_or_else(|| ScreenFault::Fault("detail run produced no totals".to_string()))?;
        self.summary
            .update(&self.selected, totals)
            .map_err(ScreenFault::from_error)?;
        self.populate();
        Ok(detail)
    }

    fn spin_refresh(
        &mut self,
        ctx: &Ctx<'_>,
        group: &str,
        find_only: bool,
    ) -> Result<(), ScreenFault> {
        let (cols, rows) = (self.cols, self.rows);
        let terminal = ctx.terminal;
        let summary = &mut self.summary;
        let outcome = with_spinner(
            |frame| {
                let _ = terminal.draw(&render::busy_frame(cols, rows, &busy_banner(frame)));
            },
            || summary.refresh(ctx.runner, group, find_only),
        );
        match outcome {
            Ok(None) => Ok(()),
            Ok(Some(handoff)) => Err(ScreenFault::Handoff(handoff)),
            Err(err) => Err(ScreenFault::from_error(err)),
        }
    }

    fn spin<T>(
        &self,
        ctx: &Ctx<'_>,
        work: impl FnOnce(&dyn WorkerRunner) -> T,
    ) -> T {
        let (cols, rows) = (self.cols, self.rows);
        let terminal = ctx.terminal;
        with_spinner(
            |frame| {
                let _ = terminal.draw(&render::busy_frame(cols, rows, &busy_banner(frame)));
            },
            || work(ctx.runner),
        )
    }
}
