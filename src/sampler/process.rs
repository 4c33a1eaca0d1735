use std::collections::HashMap;
use std::io::Read;
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use sysinfo::{Pid, ProcessesToUpdate, Signal, System};
use tracing::{debug, warn};

use crate::error::{PortaError, Result};
use crate::sampler::{RawOutput, Sampler};
use crate::tuner::constants::{PROCESS_POLL_INTERVAL_MS, READ_CHUNK_BYTES};

/// Runs benchmark commands through a shell, optionally under a deadline.
#[derive(Debug, Clone)]
pub struct ProcessSampler {
    shell: String,
    timeout: Option<Duration>,
    poll_interval: Duration,
}

impl Default for ProcessSampler {
    fn default() -> Self {
        Self {
            shell: "sh".to_string(),
            timeout: None,
            poll_interval: Duration::from_millis(PROCESS_POLL_INTERVAL_MS),
        }
    }
}

impl ProcessSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill the command and fail with `Timeout` once `timeout` elapses.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn timed_out(&self, command: &str) -> PortaError {
        PortaError::Timeout {
            command: command.to_string(),
            timeout: self.timeout.unwrap_or_default(),
        }
    }
}

/// Forward a pipe's bytes in chunks from its own thread so the child never
/// blocks on a full buffer. The channel disconnects once the pipe closes.
fn spawn_reader<R: Read + Send + 'static>(pipe: Option<R>) -> Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let Some(mut pipe) = pipe else {
            return;
        };
        let mut chunk = [0u8; READ_CHUNK_BYTES];
        loop {
            match pipe.read(&mut chunk) {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    if tx.send(chunk[..n].to_vec()).is_err() {
                        break;
                    }
                }
            }
        }
    });
    rx
}

/// Collect a pipe until every writer has closed it or `deadline` passes.
///
/// Returns the text read so far and whether the pipe reached end of file.
fn drain(rx: &Receiver<Vec<u8>>, deadline: Option<Instant>) -> (String, bool) {
    let mut bytes = Vec::new();
    let closed = loop {
        let next = match deadline {
            Some(deadline) => rx.recv_timeout(deadline.saturating_duration_since(Instant::now())),
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };
        match next {
            Ok(chunk) => bytes.extend_from_slice(&chunk),
            Err(RecvTimeoutError::Disconnected) => break true,
            Err(RecvTimeoutError::Timeout) => break false,
        }
    };
    (String::from_utf8_lossy(&bytes).into_owned(), closed)
}

/// Kill `root` and every process descended from it, children first.
///
/// Killing the shell alone leaves the benchmark it started running.
fn kill_process_tree(root: u32) {
    let root = Pid::from_u32(root);
    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::All, true);

    let mut children: HashMap<Pid, Vec<Pid>> = HashMap::new();
    for (pid, process) in sys.processes() {
        if let Some(parent) = process.parent() {
            children.entry(parent).or_default().push(*pid);
        }
    }

    let mut tree = vec![root];
    let mut next = 0;
    while next < tree.len() {
        if let Some(kids) = children.get(&tree[next]) {
            tree.extend(kids.iter().copied());
        }
        next += 1;
    }

    for pid in tree.into_iter().rev() {
        if let Some(process) = sys.process(pid) {
            if process.kill_with(Signal::Kill) != Some(true) {
                let _ = process.kill();
            }
        }
    }
}

impl Sampler for ProcessSampler {
    fn execute(&mut self, command: &str) -> Result<RawOutput> {
        debug!(command, "running benchmark command");

        let mut child = Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdout_rx = spawn_reader(child.stdout.take());
        let stderr_rx = spawn_reader(child.stderr.take());
        let started = Instant::now();
        let deadline = self.timeout.map(|limit| started + limit);

        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if let Some(limit) = self.timeout {
                if started.elapsed() >= limit {
                    warn!(command, ?limit, "benchmark command timed out, killing it");
                    kill_process_tree(child.id());
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(self.timed_out(command));
                }
            }
            thread::sleep(self.poll_interval);
        };

        // Background processes can hold the pipes open after the shell exits.
        let (stdout, stdout_closed) = drain(&stdout_rx, deadline);
        let (stderr, stderr_closed) = drain(&stderr_rx, deadline);
        if !(stdout_closed && stderr_closed) {
            warn!(command, "benchmark output still open at the deadline");
            return Err(self.timed_out(command));
        }
        debug!(command, elapsed = ?started.elapsed(), %status, "benchmark command finished");

        if !status.success() {
            return Err(PortaError::Execution {
                command: command.to_string(),
                status: status.to_string(),
                stdout,
                stderr,
            });
        }

        Ok(RawOutput {
            command: command.to_string(),
            stdout,
            stderr,
        })
    }
}
