use thiserror::Error;

#[derive(Debug, Error)]
pub enum TestdeckError {
    #[error("io error: {0}")]
    Io(String),
    #[error("config parse error: {0}")]
    ConfigParse(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("process error: {0}")]
    Process(String),
    #[error("worker report error: {0}")]
    Worker(String),
    #[error("{0}")]
    Selection(String),
}
