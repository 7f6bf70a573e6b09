//! Running the engine as a child process.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStderr, Command, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::status::check_exit;
use crate::{JobError, JobRequest, JobResult};

/// How often a running child is polled.
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Bytes of engine stderr kept for error messages.
const STDERR_TAIL: usize = 4096;

/// How long stderr may stay open after the engine itself has exited.
const STDERR_GRACE: Duration = Duration::from_millis(500);

/// A finished job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    /// The GLB the engine wrote.
    pub output: PathBuf,
    /// Wall time of the engine run.
    pub elapsed: Duration,
}

/// Launches one engine process per job.
///
/// # Example
///
/// ```no_run
/// use body_jobs::{EngineConfig, JobRequest, JobRunner};
/// use std::time::Duration;
///
/// let runner = JobRunner::new(EngineConfig::default()).with_timeout(Duration::from_secs(60));
/// let outcome = runner.run(&JobRequest {
///     base_mesh: "base_models/male.glb".into(),
///     output: "generated_models/bob/now.glb".into(),
///     height_cm: 180.0,
///     weight_kg: 80.0,
///     texture: None,
/// }).unwrap();
/// println!("{}", outcome.output.display());
/// ```
#[derive(Debug, Clone)]
pub struct JobRunner {
    engine: EngineConfig,
    timeout: Option<Duration>,
    poll_interval: Duration,
}

impl JobRunner {
    /// A runner with no deadline.
    #[must_use]
    pub const fn new(engine: EngineConfig) -> Self {
        Self {
            engine,
            timeout: None,
            poll_interval: POLL_INTERVAL,
        }
    }

    /// Kill the engine if it runs longer than `timeout`.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the polling interval.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// The engine this runner launches.
    #[must_use]
    pub const fn engine(&self) -> &EngineConfig {
        &self.engine
    }

    /// Run the engine for `request` and wait for it.
    ///
    /// On any failure the output path is removed, so a failed job leaves
    /// nothing behind. On Unix the engine runs in its own process group,
    /// and a timeout kills the whole group.
    ///
    /// # Errors
    ///
    /// - [`JobError::Spawn`] if the engine cannot be started.
    /// - [`JobError::Timeout`] if the deadline passes.
    /// - Any error from [`check_exit`](crate::status::check_exit).
    /// - [`JobError::MissingOutput`] if the engine succeeds without writing
    ///   a non-empty file.
    pub fn run(&self, request: &JobRequest) -> JobResult<JobOutcome> {
        let program = self.engine.program.display().to_string();
        let mut command = Command::new(&self.engine.program);
        command
            .args(&self.engine.args)
            .args(request.args())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            // Own group, so helpers the engine forks die with it.
            command.process_group(0);
        }
        let mut child = command.spawn().map_err(|source| JobError::Spawn {
            program: program.clone(),
            source,
        })?;
        let pid = child.id();
        info!(program = %program, pid, output = %request.output.display(), "Started engine");

        let stderr = child.stderr.take().map(StderrTail::drain);

        let started = Instant::now();
        let waited = self.wait(&mut child, started);
        let stderr = stderr.map(StderrTail::collect).unwrap_or_default();

        let result = waited
            .and_then(|code| check_exit(code, stderr))
            .and_then(|()| {
                if has_output(&request.output) {
                    Ok(())
                } else {
                    Err(JobError::MissingOutput {
                        path: request.output.clone(),
                    })
                }
            });

        let elapsed = started.elapsed();
        match result {
            Ok(()) => {
                info!(elapsed_ms = elapsed.as_millis(), "Engine finished");
                Ok(JobOutcome {
                    output: request.output.clone(),
                    elapsed,
                })
            }
            Err(e) => {
                warn!(error = %e, "Engine job failed");
                remove_partial(&request.output, pid);
                Err(e)
            }
        }
    }

    /// Poll until exit or deadline. Returns the exit code, `None` for a signal.
    fn wait(&self, child: &mut Child, started: Instant) -> JobResult<Option<i32>> {
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    debug!(?status, "Engine exited");
                    return Ok(status.code());
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(pid = child.id(), error = %e, "Lost track of engine; killing");
                    kill(child);
                    return Err(e.into());
                }
            }
            if let Some(limit) = self.timeout.filter(|limit| started.elapsed() >= *limit) {
                warn!(pid = child.id(), limit_ms = limit.as_millis(), "Engine timed out; killing");
                kill(child);
                return Err(JobError::Timeout { limit });
            }
            thread::sleep(self.poll_interval);
        }
    }
}

/// Kill the engine and everything in its process group, then reap it.
fn kill(child: &mut Child) {
    #[cfg(unix)]
    {
        if let Ok(pgid) = libc::pid_t::try_from(child.id()) {
            // SAFETY: plain syscall; a negative pid addresses the group the
            // engine leads, created at spawn.
            unsafe {
                libc::kill(-pgid, libc::SIGKILL);
            }
        }
    }
    let _ = child.kill();
    let _ = child.wait();
}

/// The end of a child's stderr, read on a background thread.
///
/// A forked helper can hold the pipe open after the engine is gone, so
/// collection waits at most [`STDERR_GRACE`] for end of file.
struct StderrTail {
    buf: Arc<Mutex<Vec<u8>>>,
    done: Receiver<()>,
}

impl StderrTail {
    fn drain(mut pipe: ChildStderr) -> Self {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let (tx, done) = mpsc::channel();
        let sink = Arc::clone(&buf);
        thread::spawn(move || {
            let mut chunk = [0_u8; 1024];
            while let Ok(n @ 1..) = pipe.read(&mut chunk) {
                let mut buf = sink.lock().unwrap_or_else(PoisonError::into_inner);
                buf.extend_from_slice(&chunk[..n]);
                let excess = buf.len().saturating_sub(STDERR_TAIL);
                buf.drain(..excess);
            }
            let _ = tx.send(());
        });
        Self { buf, done }
    }

    fn collect(self) -> String {
        if self.done.recv_timeout(STDERR_GRACE).is_err() {
            debug!("Engine stderr still open; using what was read");
        }
        let buf = self.buf.lock().unwrap_or_else(PoisonError::into_inner);
        tail(&buf)
    }
}

/// Whether the engine left a non-empty file at `path`.
fn has_output(path: &Path) -> bool {
    std::fs::metadata(path).is_ok_and(|m| m.is_file() && m.len() > 0)
}

/// Remove the output and the engine's temporary sibling, if present.
fn remove_partial(output: &Path, pid: u32) {
    let mut candidates = vec![output.to_path_buf()];
    if let Some(name) = output.file_name() {
        candidates.push(output.with_file_name(format!(".{}.{pid}.tmp", name.to_string_lossy())));
    }
    for path in candidates {
        if path.exists() {
            match std::fs::remove_file(&path) {
                Ok(()) => debug!(path = %path.display(), "Removed partial output"),
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove partial output"),
            }
        }
    }
}

fn tail(buf: &[u8]) -> String {
    let start = buf.len().saturating_sub(STDERR_TAIL);
    String::from_utf8_lossy(&buf[start..]).trim().to_string()
}
