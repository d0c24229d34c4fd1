use crate::errors::TestdeckError;
use serde::Serialize;
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const DEFAULT_DISK_BUDGET_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct JsonlLogger {
    pub path: PathBuf,
    pub max_payload_bytes: usize,
    pub budget_bytes: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogEvent<'a> {
    pub level: &'a str,
    pub event_type: &'a str,
    pub payload: Value,
}

impl JsonlLogger {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            max_payload_bytes: 4096,
            budget_bytes: DEFAULT_DISK_BUDGET_BYTES,
        }
    }

    pub fn append(&self, event: &LogEvent<'_>) -> Result<(), TestdeckError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| TestdeckError::Io(e.to_string()))?;
        }
        let truncated = truncate_json(event.payload.clone(), self.max_payload_bytes);
        let line = serde_json::to_string(&LogEvent {
            level: event.level,
            event_type: event.event_type,
            payload: truncated,
        })
        .map_err(|e| TestdeckError::Io(e.to_string()))?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| TestdeckError::Io(e.to_string()))?;
        file.write_all(line.as_bytes())
            .map_err(|e| TestdeckError::Io(e.to_string()))?;
        file.write_all(b"\n")
            .map_err(|e| TestdeckError::Io(e.to_string()))?;

        self.enforce_budget()
    }

    // When the log outgrows its budget, the current file rotates to a
    // single `.old` sibling and a fresh file starts on the next append.
    fn enforce_budget(&self) -> Result<(), TestdeckError> {
        let size = fs::metadata(&self.path)
            .map_err(|e| TestdeckError::Io(e.to_string()))?
            .len();
        if size <= self.budget_bytes {
            return Ok(());
        }
        let mut rotated = self.path.as_os_str().to_owned();
        rotated.push(".old");
        fs::rename(&self.path, PathBuf::from(rotated))
            .map_err(|e| TestdeckError::Io(e.to_string()))
    }
}

pub fn structured_fallback_line(screen: &str, event: &str, message: &str) -> String {
    format!(
        "screen={screen} event={event} message={} ",
        message.replace('\n', "\\n")
    )
}

fn truncate_json(value: Value, max_bytes: usize) -> Value {
    let rendered = serde_json::to_string(&value).unwrap_or_default();
    if rendered.len() <= max_bytes {
        return value;
    }
    let mut truncated = rendered;
    let mut cut = max_bytes.saturating_sub(3);
    while cut > 0 && !truncated.is_char_boundary(cut) {
        cut -= 1;
    }
    truncated.truncate(cut);
    Value::String(format!("{truncated}..."))
}

#[cfg(test)]
mod tests {
    use super::{structured_fallback_line, JsonlLogger, LogEvent};
    use serde_json::json;

    #[test]
    fn logger_truncates_large_payloads_and_writes_jsonl() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("session.jsonl");
        let mut logger = JsonlLogger::new(&path);
        logger.max_payload_bytes = 20;

        logger
            .append(&LogEvent {
                level: "info",
                event_type: "screen_switch",
                payload: json!({"text": "abcdefghijklmnopqrstuvwxyz"}),
            })
            .expect("append");

        let text = std::fs::read_to_string(&path).expect("read");
        assert!(text.contains("\"event_type\":\"screen_switch\""));
        assert!(text.contains("..."));
    }

    #[test]
    fn appended_events_accumulate_one_per_line() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("session.jsonl");
        let logger = JsonlLogger::new(&path);

        for event_type in ["refresh", "handoff"] {
            logger
                .append(&LogEvent {
                    level: "info",
                    event_type,
                    payload: json!({}),
                })
                .expect("append");
        }

        let text = std::fs::read_to_string(&path).expect("read");
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn log_over_budget_rotates_to_an_old_sibling() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("session.jsonl");
        let mut logger = JsonlLogger::new(&path);
        logger.budget_bytes = 16;

        logger
            .append(&LogEvent {
                level: "info",
                event_type: "refresh",
                payload: json!({"group": "a.b"}),
            })
            .expect("append");

        assert!(!path.exists());
        assert!(dir.path().join("session.jsonl.old").exists());
    }

    #[test]
    fn fallback_line_is_deterministic() {
        let line = structured_fallback_line("summary", "fault", "hello\nworld");
        assert_eq!(line, "screen=summary event=fault message=hello\\nworld ");
    }
}
