use std::collections::VecDeque;
use std::io::{Read, Write};
use std::sync::{Arc, Mutex};

use crate::errors::TestdeckError;

/// The signal that the worker has stopped at a debugger and wants to
/// talk. Matched byte for byte against the tail of the stream.
pub const PROMPT: &str = "(dbg) ";

/// One scripted worker invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerRequest {
    pub group: String,
    pub find_only: bool,
    pub testcase: Option<String>,
    pub stopwords: Vec<String>,
}

impl WorkerRequest {
    /// Arguments appended to the configured worker command.
    pub fn argv(&self) -> Vec<String> {
        let mut argv = vec!["--scripted".to_string()];
        if !self.stopwords.is_empty() {
            argv.push(format!("--stopwords={}", self.stopwords.join(",")));
        }
        if self.find_only {
            argv.push("--find-only".to_string());
        }
        if let Some(testcase) = &self.testcase {
            argv.push(format!("--testcase={testcase}"));
        }
        argv.push(self.group.clone());
        argv
    }
}

/// What the worker said on one turn of the conversation.
#[derive(Debug)]
pub enum Turn {
    /// Output up to and including a debugger prompt; the worker is
    /// waiting for a command.
    Interactive(String),
    /// Output up to end of stream; the worker has exited.
    Complete(String),
}

/// A worker that stopped mid-run, wrapped with everything it said
/// before the prompt.
pub struct WorkerHandoff {
    pub intro: String,
    pub session: WorkerSession,
}

impl std::fmt::Debug for WorkerHandoff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerHandoff")
            .field("intro", &self.intro)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub enum RunOutcome {
    Report(String),
    Handoff(WorkerHandoff),
}

pub trait WorkerRunner: Send + Sync {
    fn run(&self, request: &WorkerRequest) -> Result<RunOutcome, TestdeckError>;
}

/// A live conversation with a worker child over its merged output
/// stream and its stdin.
pub struct WorkerSession {
    child: Option<std::process::Child>,
    reader: Box<dyn Read + Send>,
    writer: Box<dyn Write + Send>,
    finished: bool,
}

impl WorkerSession {
    /// Wires a session over arbitrary streams. Sessions built this way
    /// have no child process behind them.
    pub fn from_parts(reader: Box<dyn Read + Send>, writer: Box<dyn Write + Send>) -> Self {
        WorkerSession {
            child: None,
            reader,
            writer,
            finished: false,
        }
    }

    /// A session replaying canned worker output, recording whatever is
    /// sent to it.
    pub fn scripted(output: &str, input: RecordedInput) -> Self {
        Self::from_parts(
            Box::new(std::io::Cursor::new(output.as_bytes().to_vec())),
            Box::new(input),
        )
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Reads until the worker either shows a debugger prompt or closes
    /// its stream. Reads one byte at a time; the prompt carries no
    /// trailing newline so line buffering would deadlock on it.
    pub fn read_turn(&mut self) -> Result<Turn, TestdeckError> {
        let mut output: Vec<u8> = Vec::new();
        let mut byte = [0u8; 1];
        loop {
            let n = self
                .reader
                .read(&mut byte)
                .map_err(|e| TestdeckError::Io(e.to_string()))?;
            if n == 0 {
                self.reap();
                return Ok(Turn::Complete(
                    String::from_utf8_lossy(&output).into_owned(),
                ));
            }
            output.push(byte[0]);
            if output.ends_with(PROMPT.as_bytes()) {
                return Ok(Turn::Interactive(
                    String::from_utf8_lossy(&output).into_owned(),
                ));
            }
        }
    }

    /// Sends one command line and reads the worker's next turn.
    pub fn converse(&mut self, line: &str) -> Result<Turn, TestdeckError> {
        writeln!(self.writer, "{line}").map_err(|e| TestdeckError::Io(e.to_string()))?;
        self.writer
            .flush()
            .map_err(|e| TestdeckError::Io(e.to_string()))?;
        self.read_turn()
    }

    fn reap(&mut self) {
        self.finished = true;
        if let Some(mut child) = self.child.take() {
            let _ = child.wait();
        }
    }
}

impl Drop for WorkerSession {
    fn drop(&mut self) {
        // A session dropped mid-conversation takes its worker with it.
        if let Some(mut child) = self.child.take() {
            if !self.finished {
                let _ = child.kill();
            }
            let _ = child.wait();
        }
    }
}

/// Spawns real worker processes from the configured command line.
pub struct ProductionWorkerRunner {
    command: Vec<String>,
}

impl ProductionWorkerRunner {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }
}

impl WorkerRunner for ProductionWorkerRunner {
    fn run(&self, request: &WorkerRequest) -> Result<RunOutcome, TestdeckError> {
        let (program, leading) = self
            .command
            .split_first()
            .ok_or_else(|| TestdeckError::InvalidConfig("empty worker command".to_string()))?;

        // stdout and stderr share one pipe so chatter and report
        // interleave the way they would on a terminal.
        let (reader, writer) = std::io::pipe().map_err(|e| TestdeckError::Io(e.to_string()))?;
        let writer_clone = writer
            .try_clone()
            .map_err(|e| TestdeckError::Io(e.to_string()))?;

        // The Command must be dropped before reading: it holds the
        // write ends, and while it does the reader never sees EOF.
        let mut child = {
            let mut cmd = std::process::Command::new(program);
            cmd.args(leading)
                .args(request.argv())
                .stdin(std::process::Stdio::piped())
                .stdout(writer_clone)
                .stderr(writer);
            if let Some(path) = std::env::var_os("PATH") {
                cmd.env("PATH", path);
            }
            cmd.spawn()
                .map_err(|e| TestdeckError::Process(e.to_string()))?
        };

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| TestdeckError::Process("worker stdin not captured".to_string()))?;
        let mut session = WorkerSession {
            child: Some(child),
            reader: Box::new(reader),
            writer: Box::new(stdin),
            finished: false,
        };

        match session.read_turn()? {
            Turn::Complete(raw) => Ok(RunOutcome::Report(raw)),
            Turn::Interactive(intro) => Ok(RunOutcome::Handoff(WorkerHandoff { intro, session })),
        }
    }
}

/// Records bytes written to a scripted session's stdin.
#[derive(Default, Clone)]
pub struct RecordedInput {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl RecordedInput {
    pub fn lines(&self) -> Vec<String> {
        let buf = self.buf.lock().expect("input lock");
        String::from_utf8_lossy(&buf)
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl Write for RecordedInput {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        self.buf.lock().expect("input lock").extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Replays queued responses and records every request.
#[derive(Default)]
pub struct FakeWorkerRunner {
    responses: Mutex<VecDeque<Result<RunOutcome, TestdeckError>>>,
    requests: Mutex<Vec<WorkerRequest>>,
}

impl FakeWorkerRunner {
    pub fn with_reports(reports: Vec<String>) -> Self {
        let runner = Self::default();
        for report in reports {
            runner.push(Ok(RunOutcome::Report(report)));
        }
        runner
    }

    pub fn push(&self, response: Result<RunOutcome, TestdeckError>) {
        self.responses
            .lock()
            .expect("responses lock")
            .push_back(response);
    }

    pub fn requests(&self) -> Vec<WorkerRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

impl WorkerRunner for FakeWorkerRunner {
    fn run(&self, request: &WorkerRequest) -> Result<RunOutcome, TestdeckError> {
        self.requests
            .lock()
            .expect("requests lock")
            .push(request.clone());
        self.responses
            .lock()
            .expect("responses lock")
            .pop_front()
            .unwrap_or_else(|| {
                Err(TestdeckError::Process(
                    "no fake worker response queued".to_string(),
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argv_orders_flags_before_the_group() {
        let request = WorkerRequest {
            group: "a.b".to_string(),
            find_only: true,
            testcase: None,
            stopwords: vec!["slow".to_string(), "net".to_string()],
        };
        assert_eq!(
            request.argv(),
            vec!["--scripted", "--stopwords=slow,net", "--find-only", "a.b"]
        );
    }

    #[test]
    fn argv_for_a_detail_run_names_the_testcase() {
        let request = WorkerRequest {
            group: "a.b".to_string(),
            find_only: false,
            testcase: Some("CaseOne".to_string()),
            stopwords: Vec::new(),
        };
        assert_eq!(request.argv(), vec!["--scripted", "--testcase=CaseOne", "a.b"]);
    }

    #[test]
    fn read_turn_stops_at_the_prompt() {
        let mut session = WorkerSession::scripted("chatter\n(dbg) leftover", RecordedInput::default());
        match session.read_turn().expect("turn") {
            Turn::Interactive(text) => assert_eq!(text, "chatter\n(dbg) "),
            Turn::Complete(text) => panic!("unexpected completion: {text:?}"),
        }
        assert!(!session.is_finished());
    }

    #[test]
    fn read_turn_reads_to_eof_when_no_prompt_appears() {
        let mut session = WorkerSession::scripted("all done\n", RecordedInput::default());
        match session.read_turn().expect("turn") {
            Turn::Complete(text) => assert_eq!(text, "all done\n"),
            Turn::Interactive(text) => panic!("unexpected prompt: {text:?}"),
        }
        assert!(session.is_finished());
    }

    #[test]
    fn converse_sends_a_line_and_reads_the_reply() {
        let input = RecordedInput::default();
        let mut session = WorkerSession::scripted("(dbg) x is 42\n(dbg) ", input.clone());
        session.read_turn().expect("intro");

        match session.converse("p x").expect("turn") {
            Turn::Interactive(text) => assert_eq!(text, "x is 42\n(dbg) "),
            Turn::Complete(text) => panic!("unexpected completion: {text:?}"),
        }
        assert_eq!(input.lines(), vec!["p x"]);
    }

    #[test]
    fn conversation_ends_when_the_stream_closes() {
        let input = RecordedInput::default();
        let mut session = WorkerSession::scripted("(dbg) bye\n", input.clone());
        session.read_turn().expect("intro");

        match session.converse("c").expect("turn") {
            Turn::Complete(text) => assert_eq!(text, "bye\n"),
            Turn::Interactive(text) => panic!("unexpected prompt: {text:?}"),
        }
        assert!(session.is_finished());
    }

    #[test]
    fn fake_runner_replays_responses_in_order() {
        let runner = FakeWorkerRunner::with_reports(vec!["one".to_string(), "two".to_string()]);
        let request = WorkerRequest {
            group: "a".to_string(),
            find_only: true,
            testcase: None,
            stopwords: Vec::new(),
        };
        match runner.run(&request).expect("run") {
            RunOutcome::Report(raw) => assert_eq!(raw, "one"),
            RunOutcome::Handoff(_) => panic!("unexpected handoff"),
        }
        match runner.run(&request).expect("run") {
            RunOutcome::Report(raw) => assert_eq!(raw, "two"),
            RunOutcome::Handoff(_) => panic!("unexpected handoff"),
        }
        assert!(runner.run(&request).is_err());
        assert_eq!(runner.requests().len(), 3);
    }
}
