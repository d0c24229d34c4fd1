use crate::errors::TestdeckError;

/// Fixed literal marking the start of a machine-parseable report in
/// worker output. Anything before it is incidental process chatter.
pub const BANNER: &str =
    "---------------------------------<| testdeck |>---------------------------------";
pub const BORDER: &str =
    "--------------------------------------------------------------------------------";
pub const HEADERS: &str =
    "GROUP                                                        PASS FAIL  ERR  ALL";

/// Block delimiters used by the detail-mode report.
pub const RULE_EQ: &str = "======================================================================";
pub const RULE_DASH: &str = "----------------------------------------------------------------------";

pub const TOTALS_NAME: &str = "TOTALS";

const NAME_WIDTH: usize = 60;
const COUNT_WIDTH: usize = 4;
const OVERFLOW: &str = "9999";

/// Per-group statistics. `Discovered` is the "not yet run" sentinel: the
/// worker counted tests without executing them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupStats {
    Discovered {
        all: u32,
    },
    Ran {
        pass_percent: u32,
        fail: u32,
        err: u32,
        all: u32,
    },
}

impl GroupStats {
    pub fn all(&self) -> u32 {
        match self {
            GroupStats::Discovered { all } | GroupStats::Ran { all, .. } => *all,
        }
    }

    pub fn failed(&self) -> u32 {
        match self {
            GroupStats::Discovered { .. } => 0,
            GroupStats::Ran { fail, err, .. } => fail + err,
        }
    }

    pub fn all_passing(&self) -> bool {
        matches!(self, GroupStats::Ran { pass_percent: 100, .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailKind {
    Failure,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRecord {
    pub kind: FailKind,
    pub traceback: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryReport {
    pub rows: Vec<(String, GroupStats)>,
    pub totals: GroupStats,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailReport {
    pub records: Vec<(String, DetailRecord)>,
    pub totals: GroupStats,
}

// Encoding
// ========

fn fmt_count(value: u32) -> String {
    if value > 9999 {
        OVERFLOW.to_string()
    } else {
        format!("{value:>COUNT_WIDTH$}")
    }
}

fn fmt_fields(stats: &GroupStats) -> (String, String, String, String) {
    match stats {
        GroupStats::Discovered { all } => (
            "  - ".to_string(),
            "   -".to_string(),
            "   -".to_string(),
            fmt_count(*all),
        ),
        GroupStats::Ran {
            pass_percent,
            fail,
            err,
            all,
        } => (
            format!("{pass_percent:>3}%"),
            fmt_count(*fail),
            fmt_count(*err),
            fmt_count(*all),
        ),
    }
}

/// One report row: name left-justified to 60 columns, then percent,
/// fail, err and all right-justified to 4. Counts wider than the column
/// are clamped to a literal overflow marker rather than growing it.
pub fn format_row(name: &str, stats: &GroupStats) -> String {
    let (pass, fail, err, all) = fmt_fields(stats);
    format!("{name:<NAME_WIDTH$} {pass} {fail} {err} {all}")
}

pub fn format_totals_row(stats: &GroupStats) -> String {
    format_row(TOTALS_NAME, stats)
}

/// The four display fields for a stats value, used by the renderer so
/// screen columns and report columns agree.
pub fn display_fields(stats: &GroupStats) -> [String; 4] {
    let (pass, fail, err, all) = fmt_fields(stats);
    [pass, fail, err, all]
}

// Decoding
// ========

fn parse_count(token: &str) -> Result<u32, TestdeckError> {
    token
        .parse::<u32>()
        .map_err(|_| TestdeckError::Process(format!("bad report field: {token:?}")))
}

fn parse_stats(tokens: &[&str]) -> Result<GroupStats, TestdeckError> {
    if tokens.len() != 4 {
        return Err(TestdeckError::Process(format!(
            "bad report row fields: {tokens:?}"
        )));
    }
    let all = parse_count(tokens[3])?;
    if tokens[..3].contains(&"-") {
        return Ok(GroupStats::Discovered { all });
    }
    Ok(GroupStats::Ran {
        pass_percent: parse_count(tokens[0].trim_end_matches('%'))?,
        fail: parse_count(tokens[1])?,
        err: parse_count(tokens[2])?,
        all,
    })
}

/// Decodes a summary-mode report. Rows are consumed only after the
/// banner line; the final non-empty line must be the totals row.
pub fn parse_summary_report(raw: &str) -> Result<SummaryReport, TestdeckError> {
    if !raw.contains(BANNER) {
        return Err(TestdeckError::Worker(raw.to_string()));
    }

    let mut lines: Vec<&str> = raw.lines().collect();
    while lines.last().is_some_and(|line| line.trim().is_empty()) {
        lines.pop();
    }
    let totals_line = lines
        .pop()
        .ok_or_else(|| TestdeckError::Worker(raw.to_string()))?;
    let totals_tokens: Vec<&str> = totals_line.split_whitespace().collect();
    if totals_tokens.first() != Some(&TOTALS_NAME) {
        return Err(TestdeckError::Process(format!(
            "report does not end with a totals row: {totals_line:?}"
        )));
    }
    let totals = parse_stats(&totals_tokens[1..])?;

    let mut rows = Vec::new();
    let mut reading_report = false;
    for line in lines {
        let line = line.trim_end_matches(['\r', '\n']);
        if line == BANNER {
            reading_report = true;
            continue;
        }
        if !reading_report || line.is_empty() || line == HEADERS || line == BORDER {
            continue;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() != 5 {
            return Err(TestdeckError::Process(format!("bad report row: {line:?}")));
        }
        rows.push((tokens[0].to_string(), parse_stats(&tokens[1..])?));
    }

    Ok(SummaryReport { rows, totals })
}

fn scan_number_after(haystack: &str, key: &str) -> Option<u32> {
    let at = haystack.find(key)?;
    let digits: String = haystack[at + key.len()..]
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

/// Decodes a detail-mode report: one block per failing/erroring test (an
/// `=`-rule, a `FAIL:`/`ERROR:` header naming `test (group.path)`, a
/// `-`-rule, the traceback body), then a result tail from which the
/// totals are recomputed. Records are re-keyed by test name with the
/// requested group's prefix stripped.
pub fn parse_detail_report(raw: &str, group: &str) -> Result<DetailReport, TestdeckError> {
    if !raw.contains(BANNER) {
        return Err(TestdeckError::Worker(raw.to_string()));
    }
    let (_chatter, report) = raw
        .split_once(BANNER)
        .ok_or_else(|| TestdeckError::Worker(raw.to_string()))?;

    let dash_rule = format!("{RULE_DASH}\n");
    let (items, result) = report
        .rsplit_once(dash_rule.as_str())
        .ok_or_else(|| TestdeckError::Worker(raw.to_string()))?;

    let all = scan_number_after(result, "Ran ")
        .ok_or_else(|| TestdeckError::Worker(raw.to_string()))?;
    let (fail, err) = if result.contains("FAILED") {
        (
            scan_number_after(result, "failures=").unwrap_or(0),
            scan_number_after(result, "errors=").unwrap_or(0),
        )
    } else {
        (0, 0)
    };
    let pass_percent = if all > 0 {
        (100.0 * f64::from(all - fail - err) / f64::from(all)).round() as u32
    } else {
        0
    };
    let totals = GroupStats::Ran {
        pass_percent,
        fail,
        err,
        all,
    };

    let eq_rule = format!("{RULE_EQ}\n");
    let mut records = Vec::new();
    for block in items.split(eq_rule.as_str()).skip(1) {
        let mut lines = block.lines();
        let header = lines
            .next()
            .ok_or_else(|| TestdeckError::Process("empty detail block".to_string()))?;
        let mut fields = header.split_whitespace();
        let kind = match fields.next() {
            Some("FAIL:") => FailKind::Failure,
            Some("ERROR:") => FailKind::Error,
            other => {
                return Err(TestdeckError::Process(format!(
                    "bad detail header {other:?}"
                )))
            }
        };
        let test = fields
            .next()
            .ok_or_else(|| TestdeckError::Process(format!("bad detail header: {header:?}")))?;
        let owner = fields
            .next()
            .map(|token| token.trim_matches(['(', ')']))
            .ok_or_else(|| TestdeckError::Process(format!("bad detail header: {header:?}")))?;

        let body: Vec<&str> = lines.skip_while(|line| *line == RULE_DASH).collect();
        let traceback = body.join("\n").trim().to_string();

        let full = format!("{owner}.{test}");
        let name = full
            .strip_prefix(&format!("{group}."))
            .unwrap_or(full.as_str())
            .to_string();
        records.push((name, DetailRecord { kind, traceback }));
    }

    Ok(DetailReport { records, totals })
}

// Traceback wrapping
// ==================

fn wrap_line(line: &str, width: usize, first: &str, rest: &str) -> Vec<String> {
    if line.trim().is_empty() {
        return Vec::new();
    }
    let width = width.max(8);
    let mut out = Vec::new();
    let mut cur = String::from(first);
    let mut has_word = false;
    for word in line.split_whitespace() {
        let mut word = word;
        loop {
            if has_word && cur.len() + 1 + word.len() > width {
                out.push(std::mem::replace(&mut cur, String::from(rest)));
                has_word = false;
                continue;
            }
            let avail = width.saturating_sub(cur.len()).max(1);
            if !has_word && word.len() > avail {
                // Hard-break a word that cannot fit on one line.
                let mut cut = avail.min(word.len());
                while cut > 0 && !word.is_char_boundary(cut) {
                    cut -= 1;
                }
                if cut == 0 {
                    cut = word.chars().next().map_or(1, char::len_utf8);
                }
                let (head, tail) = word.split_at(cut);
                cur.push_str(head);
                out.push(std::mem::replace(&mut cur, String::from(rest)));
                word = tail;
                continue;
            }
            if has_word {
                cur.push(' ');
            }
            cur.push_str(word);
            has_word = true;
            break;
        }
    }
    if has_word {
        out.push(cur);
    }
    out
}

/// Re-wraps a raw traceback to `width` columns for a display pane: the
/// first and last lines flush left, intermediate lines indented, with a
/// blank separator after everything except source-location lines.
pub fn wrap_traceback(width: usize, traceback: &str) -> Vec<String> {
    let raw: Vec<&str> = traceback.lines().collect();
    let Some((first, rest)) = raw.split_first() else {
        return Vec::new();
    };
    let mut lines = wrap_line(first, width, "", "");
    let Some((last, middle)) = rest.split_last() else {
        return lines;
    };
    lines.push(String::new());
    for line in middle {
        let line = line.trim();
        lines.extend(wrap_line(line, width, "  ", "    "));
        if !line.starts_with("File") {
            lines.push(String::new());
        }
    }
    lines.extend(wrap_line(last, width, "", ""));
    lines
}
