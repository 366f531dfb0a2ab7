//! Argv subprocess execution with cooperative timeout.
//!
//! Install and verify commands are argument vectors, executed directly without
//! a shell. Output is captured combined (stdout then stderr) for diagnostics.
//! The timeout is cooperative: the child is polled against a deadline and
//! killed on expiry, then reaped so no zombie is left behind.

use std::io::{self, Read};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// Interval between child liveness polls while a timeout is armed.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Result of executing a command.
#[derive(Debug, Clone)]
pub struct ExecResult {
    /// Exit code (None if killed by signal or timeout).
    pub exit_code: Option<i32>,

    /// Combined standard output and standard error.
    pub output: String,

    /// Whether the command was killed on timeout expiry.
    pub timed_out: bool,

    /// Execution duration.
    pub duration: Duration,
}

impl ExecResult {
    /// Whether the command ran to completion with exit code 0.
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }
}

/// Execute an argument vector, capturing combined output.
///
/// With a `timeout`, the child is killed once the bound expires and the
/// result is flagged `timed_out`; whatever output was produced before the
/// kill is still returned.
///
/// # Errors
///
/// Returns an IO error when `argv` is empty or the process cannot be spawned.
pub fn run_capture(argv: &[String], timeout: Option<Duration>) -> io::Result<ExecResult> {
    let (program, args) = argv.split_first().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "empty command")
    })?;

    let start = Instant::now();

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let stdout = child.stdout.take().expect("stdout was piped");
    let stderr = child.stderr.take().expect("stderr was piped");

    let stdout_handle = thread::spawn(move || read_to_string_lossy(stdout));
    let stderr_handle = thread::spawn(move || read_to_string_lossy(stderr));

    let (status, timed_out) = match timeout {
        None => (Some(child.wait()?), false),
        Some(bound) => {
            let deadline = start + bound;
            loop {
                if let Some(status) = child.try_wait()? {
                    break (Some(status), false);
                }
                if Instant::now() >= deadline {
                    child.kill()?;
                    child.wait()?;
                    break (None, true);
                }
                thread::sleep(POLL_INTERVAL);
            }
        }
    };

    let mut output = stdout_handle.join().unwrap_or_default();
    let stderr_output = stderr_handle.join().unwrap_or_default();
    output.push_str(&stderr_output);

    Ok(ExecResult {
        exit_code: status.and_then(|s| s.code()),
        output,
        timed_out,
        duration: start.elapsed(),
    })
}

fn read_to_string_lossy(mut reader: impl Read) -> String {
    let mut buf = Vec::new();
    let _ = reader.read_to_end(&mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}
