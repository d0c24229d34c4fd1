pub mod bridge;
pub mod config;
pub mod detail;
pub mod errors;
pub mod hotkeys;
pub mod logging;
pub mod machine;
pub mod render;
pub mod report;
pub mod runtime;
pub mod screens;
pub mod spinner;
pub mod summary;
pub mod viewport;

use clap::{error::ErrorKind, Parser};

use bridge::{ProductionWorkerRunner, RunOutcome, WorkerRequest, WorkerRunner};
use config::{load_config, CliOverrides};
use errors::TestdeckError;
use logging::JsonlLogger;
use runtime::{ProductionFileSystem, ProductionTerminal, Terminal, TerminalGuard};

#[derive(Debug, Clone, Parser)]
#[command(name = "testdeck")]
#[command(about = "Interactive dashboard over a test-suite worker")]
pub struct Cli {
    /// Dotted test group to inspect.
    pub group: String,
    #[arg(long, default_value_t = false)]
    pub find_only: bool,
    #[arg(long, default_value_t = false)]
    pub scripted: bool,
    #[arg(long)]
    pub testcase: Option<String>,
    #[arg(long, value_delimiter = ',')]
    pub stopwords: Option<Vec<String>>,
    #[arg(long)]
    pub config: Option<std::path::PathBuf>,
    #[arg(long)]
    pub worker: Option<String>,
    #[arg(long)]
    pub log: Option<std::path::PathBuf>,
}

pub fn run() -> Result<i32, TestdeckError> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => match error.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{error}");
                return Ok(0);
            }
            _ => {
                eprint!("{error}");
                return Ok(2);
            }
        },
    };

    let overrides = CliOverrides {
        config_path: cli.config.clone(),
        worker: cli.worker.clone(),
        stopwords: cli.stopwords.clone(),
        log_path: cli.log.clone(),
    };
    let cwd = std::env::current_dir().map_err(|e| TestdeckError::Io(e.to_string()))?;
    let cfg = load_config(&overrides, &cwd, &ProductionFileSystem)?;

    let terminal = ProductionTerminal;
    if cli.scripted || !terminal.stdin_is_tty() {
        // No TUI to surface faults on; emit the structured line instead.
        return run_scripted(&cli, &cfg, &terminal).inspect_err(|error| {
            eprintln!(
                "{}",
                logging::structured_fallback_line("scripted", "fault", &error.to_string())
            );
        });
    }

    let logger = cfg.logging.path.as_ref().map(JsonlLogger::new);
    let runner = ProductionWorkerRunner::new(cfg.worker.command.clone());
    let _guard = TerminalGuard::enter()?;
    machine::run(
        &terminal,
        &runner,
        logger.as_ref(),
        &cli.group,
        cfg.ui.stopwords.clone(),
    )?;
    Ok(0)
}

/// One worker call, report echoed verbatim. The exit code reflects the
/// totals so shell pipelines can gate on it.
fn run_scripted(
    cli: &Cli,
    cfg: &config::AppConfig,
    terminal: &dyn Terminal,
) -> Result<i32, TestdeckError> {
    let request = WorkerRequest {
        group: cli.group.clone(),
        find_only: cli.find_only,
        testcase: cli.testcase.clone(),
        stopwords: if cli.testcase.is_some() {
            Vec::new()
        } else {
            cfg.ui.stopwords.clone()
        },
    };
    let runner = ProductionWorkerRunner::new(cfg.worker.command.clone());
    match runner.run(&request)? {
        RunOutcome::Report(raw) => {
            terminal.write_line(raw.trim_end_matches('\n'))?;
            let totals = if cli.testcase.is_some() {
                report::parse_detail_report(&raw, &cli.group)?.totals
            } else {
                report::parse_summary_report(&raw)?.totals
            };
            Ok(if totals.failed() > 0 { 2 } else { 0 })
        }
        RunOutcome::Handoff(_) => Err(TestdeckError::Process(
            "worker stopped at a debugger prompt with no terminal attached".to_string(),
        )),
    }
}
