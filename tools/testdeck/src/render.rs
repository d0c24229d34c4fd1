use ratatui::backend::TestBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Terminal;

use crate::hotkeys;
use crate::report::{self, GroupStats};
use crate::screens::detail::Focus;
use crate::screens::{DebuggingScreen, DetailScreen, ErrorScreen, Screen, SummaryScreen};
use crate::summary::Freshness;

pub fn screen_frame(screen: &Screen) -> String {
    match screen {
        Screen::Summary(s) => summary_frame(s),
        Screen::Detail(s) => detail_frame(s),
        Screen::Error(s) => error_frame(s),
        Screen::Debugging(s) => debugging_frame(s),
    }
}

pub fn busy_frame(cols: u16, rows: u16, banner: &str) -> String {
    render_with(cols, rows, |frame| {
        let widget = Paragraph::new(banner.to_string())
            .block(Block::default().borders(Borders::ALL).title(" testdeck "));
        frame.render_widget(widget, frame.area());
    })
}

pub fn notice_frame(cols: u16, rows: u16, message: &str) -> String {
    render_with(cols, rows, |frame| {
        frame.render_widget(Paragraph::new(message.to_string()), frame.area());
    })
}

fn summary_frame(screen: &SummaryScreen) -> String {
    let name_width = (screen.cols as usize).saturating_sub(28).max(8);
    let mut rows: Vec<String> = Vec::new();
    if let Some(listing) = &screen.listing {
        for (index, rownum) in listing.rows() {
            let Some(row) = screen.summary.row(index) else {
                continue;
            };
            let marker = if index == listing.cur_item() { '>' } else { ' ' };
            let fresh = match row.freshness {
                Freshness::Fresh => '*',
                Freshness::Stale => '.',
                Freshness::Unknown => ' ',
            };
            let stats = match row.stats {
                Some(stats) => report::display_fields(&stats).join(" "),
                None => " ".repeat(19),
            };
            let bar = bar_char(listing.bar(), rownum);
            rows.push(format!(
                "{marker} {:<name_width$} {fresh} {stats} {bar}",
                display_name(&screen.root, row.name, name_width),
            ));
        }
    }

    let totals = totals_line(screen.summary.group(), screen.summary.totals());
    frame_with_listing(
        screen.cols,
        screen.rows,
        format!("{:<width$} PASS FAIL  ERR  ALL", "GROUP", width = name_width + 2),
        rows,
        totals,
        hotkeys::summary_legend(),
    )
}

fn detail_frame(screen: &DetailScreen) -> String {
    let tests_width = screen.tests_width().max(8);
    let mut rows: Vec<String> = Vec::new();
    if let Some(tests) = &screen.tests {
        for (index, rownum) in tests.rows() {
            let Some(name) = screen.detail.name(index) else {
                continue;
            };
            let kind = match screen.detail.record(index).map(|r| r.kind) {
                Some(report::FailKind::Error) => 'E',
                Some(report::FailKind::Failure) => 'F',
                None => ' ',
            };
            let marker = if index == tests.cur_item() { '>' } else { ' ' };
            let bar = bar_char(tests.bar(), rownum);
            rows.push(format!(
                "{marker} {kind} {:<tests_width$} {bar}",
                clip(name, tests_width)
            ));
        }
    }

    let mut trace_rows: Vec<String> = Vec::new();
    if let Some(trace) = &screen.trace {
        for (index, rownum) in trace.rows() {
            let line = screen.trace_lines.get(index).cloned().unwrap_or_default();
            let bar = bar_char(trace.bar(), rownum);
            trace_rows.push(format!("{line} {bar}"));
        }
    }

    let focus_title = match screen.focus {
        Focus::Tests => (" tests* ", " traceback "),
        Focus::Trace => (" tests ", " traceback* "),
    };
    let totals = totals_line(&screen.leaf, screen.detail.totals());
    let legend = hotkeys::detail_legend();

    render_with(screen.cols, screen.rows, |frame| {
        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(2)])
            .split(frame.area());
        let panes = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(tests_width as u16 + 6),
                Constraint::Min(10),
            ])
            .split(vertical[0]);

        frame.render_widget(
            paragraph_of(rows).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(focus_title.0),
            ),
            panes[0],
        );
        frame.render_widget(
            paragraph_of(trace_rows).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(focus_title.1),
            ),
            panes[1],
        );
        frame.render_widget(
            Paragraph::new(vec![Line::from(totals.clone()), Line::from(legend)]),
            vertical[1],
        );
    })
}

fn error_frame(screen: &ErrorScreen) -> String {
    let mut rows: Vec<String> = Vec::new();
    let mut more = String::new();
    if let Some(area) = &screen.area {
        for (index, _rownum) in area.rows() {
            rows.push(screen.lines.get(index).cloned().unwrap_or_default());
        }
        if area.start() > 0 {
            more.push_str(" ^ ");
        }
        if area.end() < area.num_items() {
            more.push_str(" v ");
        }
    }
    let legend = format!("{}{more}", hotkeys::trace_legend());

    render_with(screen.cols, screen.rows, |frame| {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(frame.area());
        frame.render_widget(paragraph_of(rows), chunks[0]);
        frame.render_widget(Paragraph::new(legend.clone()), chunks[1]);
    })
}

fn debugging_frame(screen: &DebuggingScreen) -> String {
    let visible = (screen.rows as usize).saturating_sub(2).max(1);
    let tail: Vec<String> = screen
        .transcript
        .lines()
        .rev()
        .take(visible)
        .map(str::to_string)
        .collect();
    let rows: Vec<String> = tail.into_iter().rev().collect();

    render_with(screen.cols, screen.rows, |frame| {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(frame.area());
        frame.render_widget(paragraph_of(rows), chunks[0]);
        frame.render_widget(
            Paragraph::new("debugger console; commands go to the worker"),
            chunks[1],
        );
    })
}

// Helpers
// =======

fn render_with(cols: u16, rows: u16, draw: impl FnOnce(&mut ratatui::Frame<'_>)) -> String {
    let cols = cols.max(1);
    let rows = rows.max(1);
    let backend = TestBackend::new(cols, rows);
    let mut terminal = Terminal::new(backend).expect("terminal");
    terminal.draw(draw).expect("draw");
    let buffer = terminal.backend().buffer().clone();
    let mut out = String::new();
    for y in 0..rows {
        for x in 0..cols {
            out.push_str(buffer.cell((x, y)).map_or(" ", |cell| cell.symbol()));
        }
        out.push('\n');
    }
    out
}

fn frame_with_listing(
    cols: u16,
    rows: u16,
    headers: String,
    listing: Vec<String>,
    totals: String,
    legend: &'static str,
) -> String {
    render_with(cols, rows, |frame| {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(3),
                Constraint::Length(2),
            ])
            .split(frame.area());
        frame.render_widget(Paragraph::new(headers.clone()), chunks[0]);
        frame.render_widget(
            paragraph_of(listing).block(Block::default().borders(Borders::ALL).title(" testdeck ")),
            chunks[1],
        );
        frame.render_widget(
            Paragraph::new(vec![Line::from(totals.clone()), Line::from(legend)]),
            chunks[2],
        );
    })
}

fn paragraph_of(rows: Vec<String>) -> Paragraph<'static> {
    Paragraph::new(rows.into_iter().map(Line::from).collect::<Vec<_>>())
}

fn bar_char(bar: Option<std::ops::Range<usize>>, rownum: usize) -> char {
    match bar {
        None => '|',
        Some(range) if range.contains(&rownum) => '#',
        Some(_) => ':',
    }
}

/// Short display name: strip everything above the root's parent, then
/// indent two spaces per remaining level.
fn display_name(root: &str, name: &str, width: usize) -> String {
    let parent_len = root.rsplit_once('.').map_or(0, |(parent, _)| parent.len());
    let relative = name
        .get(parent_len..)
        .unwrap_or(name)
        .trim_start_matches('.');
    let parts: Vec<&str> = relative.split('.').collect();
    let indent = "  ".repeat(parts.len().saturating_sub(1));
    let short = format!("{indent}{}", parts.last().copied().unwrap_or(name));
    clip(&short, width)
}

fn clip(text: &str, width: usize) -> String {
    if text.len() <= width || width <= 3 {
        return text.to_string();
    }
    let mut cut = width - 3;
    while cut > 0 && !text.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...", &text[..cut])
}

fn totals_line(name: &str, totals: Option<GroupStats>) -> String {
    let fields = match totals {
        Some(stats) => report::display_fields(&stats).join(" "),
        None => "  -     -    -    -".to_string(),
    };
    format!("{name}  TOTALS {fields}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::FakeWorkerRunner;
    use crate::report::{format_row, format_totals_row, BANNER};
    use crate::runtime::FakeTerminal;
    use crate::screens::Ctx;

    #[test]
    fn short_names_indent_by_depth_under_the_root() {
        assert_eq!(display_name("a", "a", 20), "a");
        assert_eq!(display_name("a", "a.b", 20), "  b");
        assert_eq!(display_name("a", "a.b.CaseOne", 20), "    CaseOne");
        assert_eq!(display_name("a.b", "a.b.CaseOne", 20), "  CaseOne");
    }

    #[test]
    fn long_names_are_clipped_with_an_ellipsis() {
        assert_eq!(clip("abcdefghij", 8), "abcde...");
        assert_eq!(clip("short", 8), "short");
    }

    #[test]
    fn summary_frame_shows_rows_markers_and_totals() {
        let report = {
            let mut text = String::new();
            text.push_str(BANNER);
            text.push('\n');
            text.push_str(&format_row(
                "a.b.CaseOne",
                &GroupStats::Ran {
                    pass_percent: 50,
                    fail: 1,
                    err: 0,
                    all: 2,
                },
            ));
            text.push('\n');
            text.push_str(&format_totals_row(&GroupStats::Ran {
                pass_percent: 50,
                fail: 1,
                err: 0,
                all: 2,
            }));
            text.push('\n');
            text
        };
        let runner = FakeWorkerRunner::with_reports(vec![report]);
        let terminal = FakeTerminal::new(80, 24);
        let ctx = Ctx {
            terminal: &terminal,
            runner: &runner,
        };
        let mut screen = SummaryScreen::new("a", Vec::new());
        screen.resize(80, 24);
        screen.init(&ctx).map_err(|_| "fault").expect("init");

        let frame = summary_frame(&screen);
        assert!(frame.contains("> a"));
        assert!(frame.contains("CaseOne"));
        assert!(frame.contains("50%"));
        assert!(frame.contains("TOTALS"));
        assert!(frame.contains("GROUP"));
    }

    #[test]
    fn busy_and_notice_frames_render_their_text() {
        assert!(busy_frame(60, 10, "  working.    ").contains("working."));
        assert!(notice_frame(60, 10, "Terminal too small.").contains("Terminal too small."));
    }
}
