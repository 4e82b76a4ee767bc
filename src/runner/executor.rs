//! @acp:module "Process Executor"
//! @acp:summary "Process spawning with concurrent output capture"
//! @acp:domain execution
//! @acp:layer service
//!
//! [`Executor`] is the seam between the fluent [`Runner`](super::Runner)
//! and the operating system. [`ProcessExecutor`] is the real thing; tests
//! substitute a scripted executor so workflows run without touching the
//! host.

use std::collections::BTreeMap;
use std::fmt;
use std::io::{ErrorKind, Read};
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use tracing::debug;

use super::result::ExecutionResult;
use super::sink::{OutputSink, OutputStream};
use crate::error::{Result, SoError};

/// A fully rendered, ready-to-spawn invocation
#[derive(Clone)]
pub struct ExecRequest {
    /// The rendered command line, as the caller wrote it
    pub command: String,
    pub program: String,
    pub args: Vec<String>,
    /// Extra environment for the spawned process only
    pub env: BTreeMap<String, String>,
    pub working_dir: Option<PathBuf>,
    pub tty: bool,
    pub sink: Option<Arc<dyn OutputSink>>,
}

impl fmt::Debug for ExecRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecRequest")
            .field("command", &self.command)
            .field("program", &self.program)
            .field("args", &self.args)
            // Values may carry secrets; only the names are shown.
            .field("env", &self.env.keys().collect::<Vec<_>>())
            .field("working_dir", &self.working_dir)
            .field("tty", &self.tty)
            .field("sink", &self.sink.is_some())
            .finish()
    }
}

/// Runs an [`ExecRequest`] to completion
pub trait Executor: Send + Sync {
    fn execute(&self, request: &ExecRequest) -> Result<ExecutionResult>;
}

/// Spawns real child processes with `std::process`
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessExecutor;

impl Executor for ProcessExecutor {
    fn execute(&self, request: &ExecRequest) -> Result<ExecutionResult> {
        let mut command = Command::new(&request.program);
        command
            .args(&request.args)
            .envs(&request.env)
            .stdin(if request.tty { Stdio::inherit() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(dir) = &request.working_dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|source| SoError::Spawn {
            program: request.program.clone(),
            source,
        })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let combined = Mutex::new(String::new());
        let sink = request.sink.as_deref();

        // Both pipes are drained concurrently so a chatty stderr cannot
        // block the child while we wait on stdout.
        let (stdout, stderr) = thread::scope(|scope| {
            let out = scope.spawn(|| drain(stdout, OutputStream::Stdout, &combined, sink));
            let err = scope.spawn(|| drain(stderr, OutputStream::Stderr, &combined, sink));
            (join_reader(out), join_reader(err))
        });

        let status = child.wait()?;
        let exit_code = exit_code(status);
        debug!(command = %request.command, exit_code, "command finished");

        Ok(ExecutionResult::new(
            request.command.clone(),
            exit_code,
            stdout?,
            stderr?,
            combined.into_inner().unwrap_or_else(PoisonError::into_inner),
        ))
    }
}

/// Read size per pipe; output reaches the sink as soon as any of it arrives
const CHUNK_SIZE: usize = 8 * 1024;

fn drain<R: Read>(
    pipe: Option<R>,
    stream: OutputStream,
    combined: &Mutex<String>,
    sink: Option<&dyn OutputSink>,
) -> std::io::Result<String> {
    let Some(mut pipe) = pipe else {
        return Ok(String::new());
    };

    let mut captured = String::new();
    let mut pending = Vec::new();
    let mut buf = [0u8; CHUNK_SIZE];

    let mut emit = |text: &str| {
        if text.is_empty() {
            return;
        }
        captured.push_str(text);
        combined
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_str(text);
        if let Some(sink) = sink {
            sink.write(stream, text);
        }
    };

    loop {
        let read = match pipe.read(&mut buf) {
            Ok(0) => break,
            Ok(read) => read,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };

        pending.extend_from_slice(&buf[..read]);
        emit(&take_decoded(&mut pending));
    }

    // A truncated character at EOF is all that can be left.
    emit(&String::from_utf8_lossy(&pending));

    Ok(captured)
}

/// Decode the complete UTF-8 prefix of `pending`, keeping a trailing
/// partial character for the next read. Invalid bytes become U+FFFD.
fn take_decoded(pending: &mut Vec<u8>) -> String {
    let mut text = String::new();
    let mut start = 0;

    while start < pending.len() {
        match std::str::from_utf8(&pending[start..]) {
            Ok(valid) => {
                text.push_str(valid);
                start = pending.len();
            }
            Err(e) => {
                let valid_up_to = start + e.valid_up_to();
                text.push_str(&String::from_utf8_lossy(&pending[start..valid_up_to]));
                match e.error_len() {
                    Some(len) => {
                        text.push(char::REPLACEMENT_CHARACTER);
                        start = valid_up_to + len;
                    }
                    None => {
                        start = valid_up_to;
                        break;
                    }
                }
            }
        }
    }

    pending.drain(..start);
    text
}

fn join_reader(
    handle: thread::ScopedJoinHandle<'_, std::io::Result<String>>,
) -> std::io::Result<String> {
    handle
        .join()
        .unwrap_or_else(|_| Err(std::io::Error::other("output reader thread panicked")))
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;

    status
        .code()
        .or_else(|| status.signal().map(|signal| 128 + signal))
        .unwrap_or(-1)
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}
