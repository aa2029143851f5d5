//! Out-of-process script execution.
//!
//! [`ScriptExecutor`] is the seam between the bridge and the interpreter:
//! production uses [`OsascriptExecutor`], tests substitute the doubles in
//! [`crate::mock`].

use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::config::ExecutorConfig;
use crate::error::ExecutionError;

use super::builder::ContactScript;

/// Poll interval while waiting for the interpreter to exit.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Runs generated scripts and returns their textual reply.
pub trait ScriptExecutor: Send + Sync {
    /// Run `source` once, synchronously, and return its stdout with trailing
    /// whitespace removed.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError`] when the interpreter cannot be started,
    /// exits non-zero, or exceeds its time bound.
    fn execute(&self, source: &str) -> Result<String, ExecutionError>;

    /// Run a typed script. Renders and delegates to [`execute`] unless the
    /// implementation interprets scripts directly.
    ///
    /// [`execute`]: ScriptExecutor::execute
    fn run(&self, script: &ContactScript) -> Result<String, ExecutionError> {
        self.execute(&script.render())
    }
}

/// Executes AppleScript through `osascript`, feeding the source on stdin.
pub struct OsascriptExecutor {
    interpreter: String,
    timeout: Duration,
}

impl OsascriptExecutor {
    /// Create an executor from configuration.
    pub fn new(config: &ExecutorConfig) -> Self {
        Self {
            interpreter: config.interpreter.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    fn resolve_interpreter(&self) -> Result<PathBuf, ExecutionError> {
        which::which(&self.interpreter).map_err(|e| ExecutionError::InterpreterNotFound {
            program: self.interpreter.clone(),
            reason: e.to_string(),
        })
    }
}

impl Default for OsascriptExecutor {
    fn default() -> Self {
        Self::new(&ExecutorConfig::default())
    }
}

fn spawn_reader<R: Read + Send + 'static>(mut stream: R) -> JoinHandle<std::io::Result<String>> {
    std::thread::spawn(move || {
        let mut buf = String::new();
        stream.read_to_string(&mut buf)?;
        Ok(buf)
    })
}

fn collect(handle: Option<JoinHandle<std::io::Result<String>>>) -> Result<String, ExecutionError> {
    match handle {
        Some(handle) => handle
            .join()
            .map_err(|_| ExecutionError::Io(std::io::Error::other("output reader panicked")))?
            .map_err(ExecutionError::Io),
        None => Ok(String::new()),
    }
}

/// Kill the interpreter and reap it so no zombie is left behind.
fn kill_and_reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

impl ScriptExecutor for OsascriptExecutor {
    fn execute(&self, source: &str) -> Result<String, ExecutionError> {
        let program = self.resolve_interpreter()?;
        let started = Instant::now();

        // `-` makes osascript read the program from stdin, so script text
        // never passes through argument or shell quoting.
        let mut child = Command::new(&program)
            .arg("-")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ExecutionError::Spawn {
                program: program.display().to_string(),
                source,
            })?;

        // Drain both pipes concurrently so a chatty script cannot block on a
        // full pipe while we wait for it to exit.
        let stdout = child.stdout.take().map(spawn_reader);
        let stderr = child.stderr.take().map(spawn_reader);

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = stdin.write_all(source.as_bytes()) {
                kill_and_reap(&mut child);
                return Err(ExecutionError::Io(e));
            }
            // stdin dropped here: EOF tells osascript the program is complete.
        }

        let status = loop {
            let polled = child.try_wait().inspect_err(|_| kill_and_reap(&mut child))?;
            match polled {
                Some(status) => break status,
                None if started.elapsed() > self.timeout => {
                    kill_and_reap(&mut child);
                    tracing::warn!(
                        timeout_secs = self.timeout.as_secs(),
                        "script interpreter timed out; killed"
                    );
                    return Err(ExecutionError::Timeout {
                        secs: self.timeout.as_secs(),
                    });
                }
                None => std::thread::sleep(POLL_INTERVAL),
            }
        };

        let out = collect(stdout)?;
        let err = collect(stderr)?;

        tracing::debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            exit_code = status.code(),
            stdout_bytes = out.len(),
            "script finished"
        );

        if !status.success() {
            return Err(ExecutionError::Failed {
                code: status.code(),
                stderr: err.trim().to_owned(),
            });
        }

        Ok(out.trim_end().to_owned())
    }
}
