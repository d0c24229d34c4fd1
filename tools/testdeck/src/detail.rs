use std::collections::BTreeMap;

use crate::bridge::{RunOutcome, WorkerHandoff, WorkerRequest, WorkerRunner};
use crate::errors::TestdeckError;
use crate::report::{self, DetailRecord, GroupStats};

/// Aggregate over detail-mode worker calls for one leaf group.
///
/// Unlike the summary there are no partial updates. Every refresh
/// re-runs the whole leaf and replaces the dataset.
#[derive(Debug)]
pub struct Detail {
    group: String,
    data: BTreeMap<String, DetailRecord>,
    names: Vec<String>,
    totals: Option<GroupStats>,
}

impl Detail {
    pub fn new(group: &str) -> Self {
        Detail {
            group: group.to_string(),
            data: BTreeMap::new(),
            names: Vec::new(),
            totals: None,
        }
    }

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

    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn record(&self, index: usize) -> Option<&DetailRecord> {
        self.data.get(self.names.get(index)?)
    }

    /// Re-runs the leaf's tests. The worker runs the whole leaf with no
    /// discovery shortcut; a debugger prompt hands the live session back
    /// with the dataset untouched.
    pub fn refresh(
        &mut self,
        runner: &dyn WorkerRunner,
    ) -> Result<Option<WorkerHandoff>, TestdeckError> {
        let (group, testcase) = match self.group.rsplit_once('.') {
            Some((group, testcase)) => (group.to_string(), Some(testcase.to_string())),
            None => (self.group.clone(), None),
        };
        let request = WorkerRequest {
            group,
            find_only: false,
            testcase,
            stopwords: Vec::new(),
        };
        let raw = match runner.run(&request)? {
            RunOutcome::Handoff(handoff) => return Ok(Some(handoff)),
            RunOutcome::Report(raw) => raw,
        };
        let parsed = report::parse_detail_report(&raw, &self.group)?;

        self.totals = Some(parsed.totals);
        self.data = parsed.records.into_iter().collect();
        self.names = self.data.keys().cloned().collect();
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::FakeWorkerRunner;
    use crate::report::{FailKind, BANNER, RULE_DASH, RULE_EQ};

    fn detail_report(blocks: &[(&str, &str, &str)], tail: &str) -> String {
        let mut text = String::from("chatter\n");
        text.push_str(BANNER);
        text.push('\n');
        for (head, owner, body) in blocks {
            text.push_str(RULE_EQ);
            text.push('\n');
            text.push_str(&format!("{head} ({owner})\n"));
            text.push_str(RULE_DASH);
            text.push('\n');
            text.push_str(body);
            text.push('\n');
        }
        text.push_str(RULE_DASH);
        text.push('\n');
        text.push_str(tail);
        text
    }

    #[test]
    fn refresh_replaces_the_dataset_wholesale() {
        let runner = FakeWorkerRunner::with_reports(vec![
            detail_report(
                &[("FAIL: test_one", "a.b.CaseOne", "AssertionError: one")],
                "Ran 3 tests in 0.001s\n\nFAILED (failures=1)\n",
            ),
            detail_report(
                &[("ERROR: test_two", "a.b.CaseOne", "TypeError: two")],
                "Ran 3 tests in 0.001s\n\nFAILED (errors=1)\n",
            ),
        ]);
        let mut detail = Detail::new("a.b.CaseOne");

        detail.refresh(&runner).expect("refresh");
        assert_eq!(detail.len(), 1);
        assert_eq!(detail.name(0), Some("test_one"));
        assert_eq!(detail.record(0).expect("record").kind, FailKind::Failure);

        detail.refresh(&runner).expect("refresh");
        assert_eq!(detail.len(), 1);
        assert_eq!(detail.name(0), Some("test_two"));
        assert_eq!(detail.record(0).expect("record").kind, FailKind::Error);
    }

    #[test]
    fn refresh_targets_the_leaf_as_a_testcase() {
        let runner = FakeWorkerRunner::with_reports(vec![detail_report(
            &[],
            "Ran 2 tests in 0.001s\n\nOK\n",
        )]);
        let mut detail = Detail::new("a.b.CaseOne");
        detail.refresh(&runner).expect("refresh");

        let requests = runner.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].group, "a.b");
        assert_eq!(requests[0].testcase.as_deref(), Some("CaseOne"));
        assert!(!requests[0].find_only);
    }

    #[test]
    fn fully_passing_run_clears_the_records() {
        let runner = FakeWorkerRunner::with_reports(vec![detail_report(
            &[],
            "Ran 4 tests in 0.001s\n\nOK\n",
        )]);
        let mut detail = Detail::new("a.b.CaseOne");
        detail.refresh(&runner).expect("refresh");
        assert!(detail.is_empty());
        assert!(detail.totals().expect("totals").all_passing());
    }

    #[test]
    fn names_come_back_sorted() {
        let runner = FakeWorkerRunner::with_reports(vec![detail_report(
            &[
                ("FAIL: test_zebra", "a.b.CaseOne", "boom"),
                ("FAIL: test_apple", "a.b.CaseOne", "boom"),
            ],
            "Ran 2 tests in 0.001s\n\nFAILED (failures=2)\n",
        )]);
        let mut detail = Detail::new("a.b.CaseOne");
        detail.refresh(&runner).expect("refresh");
        assert_eq!(detail.name(0), Some("test_apple"));
        assert_eq!(detail.name(1), Some("test_zebra"));
    }
}
