use std::collections::BTreeMap;

use crate::bridge::{RunOutcome, WorkerHandoff, WorkerRequest, WorkerRunner};
use crate::errors::TestdeckError;
use crate::report::{self, GroupStats};

/// Recency of a row's statistics. Discovered-but-unrun rows start
/// `Unknown`; each refresh demotes previously `Fresh` rows to `Stale`
/// before absorbing new results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Unknown,
    Stale,
    Fresh,
}

#[derive(Debug, Clone)]
struct Entry {
    // None marks a synthesized interior node of the group tree.
    stats: Option<GroupStats>,
    freshness: Freshness,
}

/// A view into one listing row.
#[derive(Debug, Clone, Copy)]
pub struct SummaryRow<'a> {
    pub name: &'a str,
    pub stats: Option<GroupStats>,
    pub freshness: Freshness,
}

impl SummaryRow<'_> {
    /// Interior nodes carry no stats and cannot be run in detail mode.
    pub fn is_leaf(&self) -> bool {
        self.stats.is_some()
    }
}

/// Persistent aggregate over repeated summary-mode worker calls.
///
/// Partial refreshes merge into the existing dataset rather than
/// replacing it, so results for groups outside the refreshed subtree
/// survive as stale rows.
#[derive(Debug)]
pub struct Summary {
    group: String,
    stopwords: Vec<String>,
    data: BTreeMap<String, Entry>,
    names: Vec<String>,
    totals: Option<GroupStats>,
}

impl Summary {
    pub fn new(stopwords: Vec<String>) -> Self {
        Summary {
            group: String::new(),
            stopwords,
            data: BTreeMap::new(),
            names: Vec::new(),
            totals: None,
        }
    }

    /// The group named by the most recent refresh.
    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn totals(&self) -> Option<GroupStats> {
        self.totals
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<SummaryRow<'_>> {
        let name = self.names.get(index)?;
        let entry = self.data.get(name)?;
        Some(SummaryRow {
            name,
            stats: entry.stats,
            freshness: entry.freshness,
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Runs the worker over `group` and merges the resulting rows.
    /// `find_only` discovers tests without executing them. If the worker
    /// stops at a debugger prompt the dataset is left untouched and the
    /// live session is handed back to the caller.
    pub fn refresh(
        &mut self,
        runner: &dyn WorkerRunner,
        group: &str,
        find_only: bool,
    ) -> Result<Option<WorkerHandoff>, TestdeckError> {
        self.group = group.to_string();
        let request = WorkerRequest {
            group: group.to_string(),
            find_only,
            testcase: None,
            stopwords: self.stopwords.clone(),
        };
        let raw = match runner.run(&request)? {
            RunOutcome::Handoff(handoff) => return Ok(Some(handoff)),
            RunOutcome::Report(raw) => raw,
        };
        let parsed = report::parse_summary_report(&raw)?;

        self.mark_stale();
        self.totals = Some(parsed.totals);
        self.absorb(parsed.rows);
        Ok(None)
    }

    /// Replaces one leaf's stats with detail-mode results. The totals
    /// row follows the leaf since it was the only thing just run.
    pub fn update(&mut self, name: &str, stats: GroupStats) -> Result<(), TestdeckError> {
        let Some(entry) = self.data.get_mut(name) else {
            return Err(TestdeckError::Process(format!(
                "detail results for a group not in the summary: {name}"
            )));
        };
        entry.stats = Some(stats);
        entry.freshness = Freshness::Unknown; // reset below with the rest
        self.mark_stale();
        let entry = self
            .data
            .get_mut(name)
            .ok_or_else(|| TestdeckError::Process(format!("lost summary entry: {name}")))?;
        entry.freshness = Freshness::Fresh;
        self.totals = Some(stats);
        Ok(())
    }

    fn mark_stale(&mut self) {
        for entry in self.data.values_mut() {
            if entry.freshness == Freshness::Fresh {
                entry.freshness = Freshness::Stale;
            }
        }
    }

    fn absorb(&mut self, rows: Vec<(String, GroupStats)>) {
        let root_depth = self.group.matches('.').count();
        for (name, stats) in rows {
            // Rows name leaves by full dotted path. Synthesize an
            // interior node for every dotted ancestor down to the
            // refreshed root so the listing shows the tree.
            if let Some((owner, _case)) = name.rsplit_once('.') {
                let parts: Vec<&str> = owner.split('.').collect();
                for i in ((root_depth + 1)..=parts.len()).rev() {
                    self.data.insert(
                        parts[..i].join("."),
                        Entry {
                            stats: None,
                            freshness: Freshness::Unknown,
                        },
                    );
                }
            }
            let freshness = match stats {
                GroupStats::Discovered { .. } => Freshness::Unknown,
                GroupStats::Ran { .. } => Freshness::Fresh,
            };
            self.data.insert(
                name,
                Entry {
                    stats: Some(stats),
                    freshness,
                },
            );
        }
        self.names = self.data.keys().cloned().collect();
    }
}
