use crate::error::{Result, ZapError};
use log::debug;
use std::ffi::{OsStr, OsString};
use std::io::{self, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// An external program plus the arguments always passed first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tool {
    program: OsString,
    leading_args: Vec<OsString>,
}

/// Captured result of one tool invocation
#[derive(Debug)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl Tool {
    /// Creates a tool invoking `program`
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    /// Adds an argument passed before the per-call arguments
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.leading_args.push(arg.into());
        self
    }

    /// Program name for messages
    pub fn name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    fn command<I, S>(&self, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut command = Command::new(&self.program);
        command.args(&self.leading_args).args(args);
        command
    }

    /// Returns whether the program can be started
    ///
    /// Any exit status counts; output is discarded.
    pub fn probe(&self) -> bool {
        self.command(std::iter::empty::<&OsStr>())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok()
    }

    /// Runs the tool to completion, killing it once `timeout` has elapsed
    ///
    /// # Errors
    ///
    /// - `Io` if the program cannot be started
    /// - `ToolTimeout` if it is still running at the deadline
    pub fn run<I, S>(&self, args: I, timeout: Duration) -> Result<ToolOutput>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut command = self.command(args);
        debug!("Running {:?}", command);

        let mut child = command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdout = spawn_reader(child.stdout.take());
        let stderr = spawn_reader(child.stderr.take());

        let status = match wait_with_deadline(&mut child, timeout)? {
            Some(status) => status,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ZapError::ToolTimeout {
                    program: self.name(),
                    timeout,
                });
            }
        };

        Ok(ToolOutput {
            status,
            stdout: join_reader(stdout)?,
            stderr: join_reader(stderr)?,
        })
    }
}

fn wait_with_deadline(child: &mut Child, timeout: Duration) -> io::Result<Option<ExitStatus>> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

type Reader = Option<thread::JoinHandle<io::Result<String>>>;

// Pipes are drained on their own threads so a chatty child cannot block on a
// full pipe while we poll for its exit.
fn spawn_reader<R: Read + Send + 'static>(pipe: Option<R>) -> Reader {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buffer = Vec::new();
            pipe.read_to_end(&mut buffer)?;
            Ok(String::from_utf8_lossy(&buffer).into_owned())
        })
    })
}

fn join_reader(reader: Reader) -> Result<String> {
    match reader {
        Some(handle) => handle
            .join()
            .map_err(|_| ZapError::Io(io::Error::other("output reader panicked")))?
            .map_err(ZapError::from),
        None => Ok(String::new()),
    }
}
