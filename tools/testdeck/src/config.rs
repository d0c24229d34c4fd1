use crate::errors::TestdeckError;
use crate::runtime::FileSystem;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the config file discovered in the working directory when
/// `--config` is not given.
pub const DISCOVERED_CONFIG: &str = ".testdeck.toml";

#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_path: Option<PathBuf>,
    pub worker: Option<String>,
    pub stopwords: Option<Vec<String>>,
    pub log_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    pub worker: WorkerConfig,
    pub ui: UiConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkerConfig {
    pub command: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UiConfig {
    pub stopwords: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    pub path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            worker: WorkerConfig {
                command: vec!["testdeck-worker".to_string()],
            },
            ui: UiConfig {
                stopwords: Vec::new(),
            },
            logging: LoggingConfig { path: None },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialAppConfig {
    worker: Option<PartialWorkerConfig>,
    ui: Option<PartialUiConfig>,
    logging: Option<PartialLoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialWorkerConfig {
    command: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialUiConfig {
    stopwords: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialLoggingConfig {
    path: Option<PathBuf>,
}

pub fn load_config(
    overrides: &CliOverrides,
    process_cwd: &Path,
    fs: &dyn FileSystem,
) -> Result<AppConfig, TestdeckError> {
    let mut cfg = AppConfig::default();

    let path = match &overrides.config_path {
        Some(path) => Some(path.clone()),
        None => {
            let discovered = process_cwd.join(DISCOVERED_CONFIG);
            fs.exists(&discovered).then_some(discovered)
        }
    };

    if let Some(path) = path {
        let file_contents = fs.read_to_string(&path)?;
        let partial: PartialAppConfig = toml::from_str(&file_contents)
            .map_err(|e| TestdeckError::ConfigParse(e.to_string()))?;
        merge_partial_config(&mut cfg, partial);
    }

    apply_cli_overrides(&mut cfg, overrides);
    validate_config(&cfg)?;
    Ok(cfg)
}

fn merge_partial_config(cfg: &mut AppConfig, partial: PartialAppConfig) {
    if let Some(worker) = partial.worker {
        if let Some(command) = worker.command {
            cfg.worker.command = command;
        }
    }

    if let Some(ui) = partial.ui {
        if let Some(stopwords) = ui.stopwords {
            cfg.ui.stopwords = stopwords;
        }
    }

    if let Some(logging) = partial.logging {
        if let Some(path) = logging.path {
            cfg.logging.path = Some(path);
        }
    }
}

fn apply_cli_overrides(cfg: &mut AppConfig, overrides: &CliOverrides) {
    if let Some(worker) = &overrides.worker {
        cfg.worker.command = worker.split_whitespace().map(str::to_string).collect();
    }
    if let Some(stopwords) = &overrides.stopwords {
        cfg.ui.stopwords = stopwords.clone();
    }
    if let Some(path) = &overrides.log_path {
        cfg.logging.path = Some(path.clone());
    }
}

fn validate_config(cfg: &AppConfig) -> Result<(), TestdeckError> {
    if cfg.worker.command.is_empty()
        || cfg.worker.command[0].trim().is_empty()
    {
        return Err(TestdeckError::InvalidConfig(
            "worker.command must name a program".to_string(),
        ));
    }
    Ok(())
}
