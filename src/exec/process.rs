// src/exec/process.rs

//! One invocation: spawn, capture both pipes, bound by the timeout, return a
//! single consolidated result.

use std::time::Instant;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;
use tokio::sync::mpsc;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, error, info, warn};

use super::environment::EnvironmentDescriptor;
use super::error::ExecError;
use super::launch::build_launch;
use super::output::{ExecutionResult, OutputCollector, OutputLine, StreamSource};

/// Run `command_line` inside the environment described by `env`.
///
/// The result is final only once the process has exited **and** both pipe
/// readers have reached EOF; trailing lines still in flight when the exit
/// status arrives are never dropped.
///
/// On timeout the child's whole process group is killed, the readers are
/// stopped and [`ExecError::Timeout`] carries the partial output. Dropping
/// the returned future before it resolves does the same cleanup.
pub async fn execute(
    env: &EnvironmentDescriptor,
    command_line: &str,
) -> Result<ExecutionResult, ExecError> {
    let timeout = env.timeout();
    let spec = build_launch(env, command_line)?;
    let mut command = spec.command;

    info!(
        cmd = %spec.display,
        timeout_ms = timeout.as_millis() as u64,
        "starting script process"
    );

    let started = Instant::now();
    let mut child = command.spawn().map_err(|source| {
        error!(cmd = %spec.display, error = %source, "failed to start script process");
        ExecError::LaunchFailed {
            program: spec.display.clone(),
            source,
        }
    })?;
    let pid = child.id();

    // Nothing is ever written to the child; closing stdin lets scripts that
    // probe it see EOF instead of blocking.
    drop(child.stdin.take());

    let (line_tx, mut line_rx) = mpsc::unbounded_channel::<OutputLine>();
    let mut readers: Vec<JoinHandle<()>> = Vec::with_capacity(2);
    if let Some(stdout) = child.stdout.take() {
        readers.push(spawn_reader(stdout, StreamSource::Stdout, line_tx.clone(), pid));
    }
    if let Some(stderr) = child.stderr.take() {
        readers.push(spawn_reader(stderr, StreamSource::Stderr, line_tx.clone(), pid));
    }
    // The channel closes once both readers drop their senders (EOF on both).
    drop(line_tx);

    let mut cleanup = CancelCleanup {
        pid,
        readers: readers.iter().map(JoinHandle::abort_handle).collect(),
        armed: true,
    };

    let mut collector = OutputCollector::new(env.error_marker());

    let waited = tokio::time::timeout(timeout, async {
        let drain = async {
            while let Some(line) = line_rx.recv().await {
                collector.push(line);
            }
        };
        let (status, ()) = tokio::join!(child.wait(), drain);
        status
    })
    .await;

    let status = match waited {
        Ok(Ok(status)) => status,
        Ok(Err(e)) => {
            error!(pid, error = %e, "waiting for script process failed");
            terminate(&mut child, pid).await;
            stop_readers(&readers);
            cleanup.disarm();
            return Err(ExecError::Wait(e));
        }
        Err(_elapsed) => {
            warn!(
                pid,
                timeout_ms = timeout.as_millis() as u64,
                "script process timed out; killing process group"
            );
            terminate(&mut child, pid).await;
            stop_readers(&readers);
            cleanup.disarm();

            // Lines already queued by the readers still belong to the result.
            while let Ok(line) = line_rx.try_recv() {
                collector.push(line);
            }
            return Err(ExecError::Timeout {
                timeout,
                partial: collector.finish(),
            });
        }
    };
    // The child has been reaped; its process group id may be reused.
    cleanup.disarm();

    for reader in readers {
        if let Err(e) = reader.await {
            warn!(pid, error = %e, "output reader task did not finish cleanly");
        }
    }

    let mut result = collector.finish();
    result.exit_code = status.code();

    info!(
        pid,
        exit_code = ?result.exit_code,
        stdout_lines = result.stdout_lines,
        stderr_lines = result.diagnostics.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "script process exited"
    );

    if !status.success() {
        if result.is_empty() {
            warn!(
                pid,
                exit_code = ?result.exit_code,
                "script process failed without producing output"
            );
            return Err(ExecError::NonZeroExit {
                code: result.exit_code,
                diagnostics: result.diagnostics,
            });
        }
        warn!(
            pid,
            exit_code = ?result.exit_code,
            "script process failed but produced output; passing it through"
        );
    }

    Ok(result)
}

/// Read `pipe` line by line and forward each line to the collector.
///
/// Bytes are decoded lossily so one bad byte from a script doesn't end the
/// capture early.
fn spawn_reader<R>(
    pipe: R,
    source: StreamSource,
    line_tx: mpsc::UnboundedSender<OutputLine>,
    pid: Option<u32>,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(pipe);
        let mut buf = Vec::new();

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let text = String::from_utf8_lossy(trim_line_end(&buf)).into_owned();
                    debug!(pid, ?source, "{}", text);
                    if line_tx.send(OutputLine { source, text }).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!(pid, ?source, error = %e, "reading script output failed");
                    break;
                }
            }
        }

        debug!(pid, ?source, "output reader ended");
    })
}

fn trim_line_end(buf: &[u8]) -> &[u8] {
    let buf = buf.strip_suffix(b"\n").unwrap_or(buf);
    buf.strip_suffix(b"\r").unwrap_or(buf)
}

fn stop_readers(readers: &[JoinHandle<()>]) {
    for reader in readers {
        reader.abort();
    }
}

/// Kills the process group and stops the readers when an invocation is
/// dropped mid-flight, e.g. because the HTTP client disconnected.
struct CancelCleanup {
    pid: Option<u32>,
    readers: Vec<AbortHandle>,
    armed: bool,
}

impl CancelCleanup {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for CancelCleanup {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        warn!(pid = ?self.pid, "script invocation cancelled; killing process group");
        kill_group(self.pid);
        for reader in &self.readers {
            reader.abort();
        }
    }
}

/// SIGKILL every process in the child's group (unix only).
fn kill_group(pid: Option<u32>) {
    #[cfg(unix)]
    if let Some(pid) = pid {
        if let Ok(pgid) = libc::pid_t::try_from(pid) {
            // SAFETY: plain syscall; the child was spawned with
            // `process_group(0)` so `pgid` names only its group.
            let rc = unsafe { libc::kill(-pgid, libc::SIGKILL) };
            if rc != 0 {
                debug!(
                    pid,
                    error = %std::io::Error::last_os_error(),
                    "process group already gone"
                );
            }
        }
    }
    #[cfg(not(unix))]
    let _ = pid;
}

/// Kill the child and every process in its group, then reap it.
async fn terminate(child: &mut Child, pid: Option<u32>) {
    kill_group(pid);

    if let Err(e) = child.kill().await {
        debug!(?pid, error = %e, "child already exited while killing");
    }
}
