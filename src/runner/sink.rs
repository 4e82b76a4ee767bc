//! @acp:module "Output Sinks"
//! @acp:summary "Live forwarding of child output"
//! @acp:domain execution
//! @acp:layer output

use std::io::Write;

/// Which pipe a chunk of output came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// Receives output while a command is still running.
///
/// Chunks arrive from the stdout and stderr reader threads concurrently,
/// hence `Sync`.
pub trait OutputSink: Send + Sync {
    fn write(&self, stream: OutputStream, chunk: &str);
}

/// Mirrors child output to the invoking terminal
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl OutputSink for ConsoleSink {
    fn write(&self, stream: OutputStream, chunk: &str) {
        // A closed terminal must not abort the child; drop the chunk instead.
        let _ = match stream {
            OutputStream::Stdout => {
                let mut out = std::io::stdout().lock();
                out.write_all(chunk.as_bytes()).and_then(|_| out.flush())
            }
            OutputStream::Stderr => {
                let mut err = std::io::stderr().lock();
                err.write_all(chunk.as_bytes()).and_then(|_| err.flush())
            }
        };
    }
}
