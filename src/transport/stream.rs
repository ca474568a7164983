//! Duplex byte stream over a spawned SSH tool.
//!
//! The child's stdout is the read side, its stdin the write side, and its
//! stderr is drained continuously into a capture buffer so a chatty tool
//! can never block on a full pipe. Closing the stream reaps the process
//! and turns a non-zero exit into a descriptive error carrying whatever
//! stderr text was captured.

use std::collections::HashMap;
use std::io::{self, Read, Write};
use std::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use bytes::BytesMut;

use super::command::TunnelCommand;
use super::types::{ConsoleMode, ServiceType};
use crate::errors::TunnelError;

/// An open tunnel to a remote `git-upload-pack`/`git-receive-pack`,
/// carried by an external SSH subprocess.
pub struct TunnelStream {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: ChildStdout,
    stderr: StderrCapture,
    service: ServiceType,
    url: String,
}

impl TunnelStream {
    /// Spawn the assembled command and wire up its pipes.
    ///
    /// With `environment` set the child gets exactly that block; otherwise
    /// it inherits the parent environment.
    pub(crate) fn spawn(
        command: &TunnelCommand,
        environment: Option<&HashMap<String, String>>,
        service: ServiceType,
        url: &str,
    ) -> Result<Self, TunnelError> {
        let mut process = Command::new(command.program());
        process
            .args(command.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(env) = environment {
            process.env_clear().envs(env);
        }
        apply_console_mode(&mut process, command.console_mode());

        let mut child = process.spawn().map_err(TunnelError::Spawn)?;
        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let (Some(stdin), Some(stdout), Some(stderr)) = (stdin, stdout, stderr) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(TunnelError::Spawn(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "child stdio pipes were not captured",
            )));
        };

        Ok(Self {
            child,
            stdin: Some(stdin),
            stdout,
            stderr: StderrCapture::start(stderr),
            service,
            url: url.to_string(),
        })
    }

    /// Service family this tunnel was opened for.
    pub fn service_type(&self) -> ServiceType {
        self.service
    }

    /// The connection string this tunnel was opened with.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Close the tunnel: signal EOF on stdin, wait for the process, and
    /// surface an abnormal exit together with any captured stderr text.
    pub fn close(mut self) -> Result<(), TunnelError> {
        drop(self.stdin.take());
        let status = self.child.wait()?;
        let stderr_text = self.stderr.finish();
        tracing::debug!(url = %self.url, ?status, "ssh tunnel closed");

        if status.success() {
            return Ok(());
        }
        match status.code() {
            Some(code) if !stderr_text.is_empty() => Err(TunnelError::ProcessFailedWithOutput {
                code,
                stderr: stderr_text,
            }),
            Some(code) => Err(TunnelError::ProcessFailed { code }),
            None => Err(TunnelError::TerminatedBySignal),
        }
    }
}

impl Read for TunnelStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stdout.read(buf)
    }
}

impl Write for TunnelStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.stdin.as_mut() {
            Some(stdin) => stdin.write(buf),
            None => Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "stdin has already been closed",
            )),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.stdin.as_mut() {
            Some(stdin) => stdin.flush(),
            None => Ok(()),
        }
    }
}

impl Drop for TunnelStream {
    fn drop(&mut self) {
        drop(self.stdin.take());

        if let Ok(None) = self.child.try_wait() {
            let _ = self.child.kill();
        }
        let _ = self.child.wait();
        self.stderr.abandon();
    }
}

impl std::fmt::Debug for TunnelStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TunnelStream")
            .field("service", &self.service)
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

/// Drains a child's stderr on a dedicated thread into a shared buffer.
///
/// The thread exits when the pipe reaches EOF, which happens once the
/// child is gone, so joining after reaping cannot hang.
struct StderrCapture {
    buf: Arc<Mutex<BytesMut>>,
    handle: Option<JoinHandle<()>>,
}

impl StderrCapture {
    fn start(mut stderr: ChildStderr) -> Self {
        let buf = Arc::new(Mutex::new(BytesMut::new()));
        let sink = Arc::clone(&buf);
        let handle = std::thread::spawn(move || {
            let mut chunk = [0u8; 8192];
            loop {
                match stderr.read(&mut chunk) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        let Ok(mut buf) = sink.lock() else { break };
                        buf.extend_from_slice(&chunk[..n]);
                    }
                }
            }
        });
        Self {
            buf,
            handle: Some(handle),
        }
    }

    /// Join the drain thread and return the captured text, lossily
    /// decoded with trailing line endings removed.
    fn finish(&mut self) -> String {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        let captured = match self.buf.lock() {
            Ok(buf) => buf.clone(),
            Err(_) => BytesMut::new(),
        };
        String::from_utf8_lossy(&captured).trim_end().to_string()
    }

    /// Join without reading; used on the drop path where the child has
    /// already been reaped.
    fn abandon(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(windows)]
fn apply_console_mode(command: &mut Command, mode: ConsoleMode) {
    use std::os::windows::process::CommandExt;

    const CREATE_NEW_CONSOLE: u32 = 0x0000_0010;
    const DETACHED_PROCESS: u32 = 0x0000_0008;

    command.creation_flags(match mode {
        ConsoleMode::Visible => CREATE_NEW_CONSOLE,
        ConsoleMode::Detached => DETACHED_PROCESS,
    });
}

#[cfg(not(windows))]
fn apply_console_mode(_command: &mut Command, _mode: ConsoleMode) {}
