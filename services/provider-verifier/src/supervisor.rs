//! Provider process supervision.
//!
//! [`ProcessSupervisor::ensure_running`] either finds the provider already
//! answering its health check (an externally owned instance, never touched
//! again) or launches it and waits for it to become healthy.
//! [`ProcessSupervisor::release`] stops only what the supervisor started.

use crate::config::ServiceSpec;
use crate::error::HarnessError;
use crate::health::HealthCheck;
use rust_common::PollPolicy;
use std::collections::VecDeque;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Lines of provider output kept for diagnostics.
const OUTPUT_TAIL_LINES: usize = 50;

/// Lifecycle state of a supervised provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    /// Answering its health check
    Healthy,
    /// Terminated by the supervisor
    Stopped,
}

/// Who is responsible for stopping the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// Launched by the supervisor
    Owned {
        /// OS process id at launch
        pid: Option<u32>,
    },
    /// Found already running
    External,
}

/// Bounded tail of a process's combined stdout and stderr.
#[derive(Debug, Clone)]
pub struct OutputTail {
    lines: Arc<Mutex<VecDeque<String>>>,
    capacity: usize,
}

impl OutputTail {
    fn new(capacity: usize) -> Self {
        Self {
            lines: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    async fn push(&self, line: String) {
        let mut lines = self.lines.lock().await;
        if lines.len() == self.capacity {
            lines.pop_front();
        }
        lines.push_back(line);
    }

    /// Snapshot of the retained lines, oldest first.
    pub async fn lines(&self) -> Vec<String> {
        self.lines.lock().await.iter().cloned().collect()
    }
}

#[derive(Debug)]
struct OwnedProcess {
    child: Child,
    output: OutputTail,
}

/// A provider instance the harness can verify against.
///
/// An owned handle dropped without [`ProcessSupervisor::release`] still kills
/// its process.
#[derive(Debug)]
#[must_use = "an owned provider keeps running until released"]
pub struct ServiceHandle {
    address: String,
    ownership: Ownership,
    liveness: Liveness,
    output: Option<OutputTail>,
    process: Option<OwnedProcess>,
}

impl ServiceHandle {
    fn external(address: String) -> Self {
        Self {
            address,
            ownership: Ownership::External,
            liveness: Liveness::Healthy,
            output: None,
            process: None,
        }
    }

    fn owned(address: String, process: OwnedProcess) -> Self {
        Self {
            address,
            ownership: Ownership::Owned {
                pid: process.child.id(),
            },
            liveness: Liveness::Healthy,
            output: Some(process.output.clone()),
            process: Some(process),
        }
    }

    /// Base address to verify against.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Ownership of the instance.
    #[must_use]
    pub const fn ownership(&self) -> Ownership {
        self.ownership
    }

    /// Check whether the supervisor launched this instance.
    #[must_use]
    pub const fn is_owned(&self) -> bool {
        matches!(self.ownership, Ownership::Owned { .. })
    }

    /// Process id of an owned instance.
    #[must_use]
    pub const fn pid(&self) -> Option<u32> {
        match self.ownership {
            Ownership::Owned { pid } => pid,
            Ownership::External => None,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn liveness(&self) -> Liveness {
        self.liveness
    }

    /// Captured output of an owned instance, oldest line first.
    pub async fn output_tail(&self) -> Vec<String> {
        match &self.output {
            Some(output) => output.lines().await,
            None => Vec::new(),
        }
    }
}

/// Starts, detects and stops the provider under test.
#[derive(Debug, Clone)]
pub struct ProcessSupervisor {
    spec: ServiceSpec,
    health: HealthCheck,
}

impl ProcessSupervisor {
    /// Create a supervisor for `spec`.
    ///
    /// # Errors
    ///
    /// Returns an error if the health check client cannot be built.
    pub fn new(spec: ServiceSpec) -> Result<Self, HarnessError> {
        let health = HealthCheck::new(&spec)?;
        Ok(Self { spec, health })
    }

    /// Return a healthy provider, launching one if none answers.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Spawn`] if the start command cannot be run and
    /// [`HarnessError::StartupTimeout`] if the launched process never becomes
    /// healthy. In both cases nothing is left running.
    pub async fn ensure_running(&self) -> Result<ServiceHandle, HarnessError> {
        let address = self.spec.base_address();

        match self.health.check().await {
            Ok(()) => {
                info!(address = %address, "Provider already running, using existing instance");
                return Ok(ServiceHandle::external(address));
            }
            Err(err) => {
                debug!(url = %self.health.url(), error = %err, "Provider not answering, launching it");
            }
        }

        let mut process = spawn(&self.spec)?;
        let max_attempts = self.spec.max_attempts;
        let mut exit_logged = false;

        let policy = PollPolicy::new(self.spec.poll_config());
        let ready = policy
            .until_ready(
                || self.health.check(),
                |attempt, err| {
                    debug!(
                        attempt,
                        max_attempts,
                        listening = !err.is_connection_failure(),
                        error = %err,
                        "Waiting for provider"
                    );
                    if exit_logged {
                        return;
                    }
                    if let Ok(Some(status)) = process.child.try_wait() {
                        warn!(%status, "Provider process exited before becoming healthy");
                        exit_logged = true;
                    }
                },
            )
            .await;

        match ready {
            Ok(()) => {
                info!(
                    address = %address,
                    pid = process.child.id(),
                    "Provider started"
                );
                Ok(ServiceHandle::owned(address, process))
            }
            Err(exhausted) => {
                warn!(
                    address = %address,
                    attempts = exhausted.attempts,
                    last_error = ?exhausted.last_error.as_ref().map(ToString::to_string),
                    "Provider did not become healthy"
                );
                for line in process.output.lines().await {
                    warn!(target: "provider_output", "{line}");
                }
                terminate(&mut process, &self.spec).await;
                Err(HarnessError::StartupTimeout {
                    address,
                    attempts: exhausted.attempts,
                })
            }
        }
    }

    /// Stop the provider if this supervisor launched it.
    ///
    /// Externally owned instances are left alone. Calling this twice is a
    /// no-op the second time.
    pub async fn release(&self, handle: &mut ServiceHandle) {
        let Some(mut process) = handle.process.take() else {
            if !handle.is_owned() {
                debug!(address = %handle.address, "Provider is externally owned, leaving it running");
            }
            return;
        };

        info!(address = %handle.address, pid = handle.pid(), "Stopping provider");
        terminate(&mut process, &self.spec).await;
        handle.liveness = Liveness::Stopped;
    }
}

fn spawn(spec: &ServiceSpec) -> Result<OwnedProcess, HarnessError> {
    let command_line = spec.command_line();
    let spawn_error = |source| HarnessError::Spawn {
        command: command_line.clone(),
        source,
    };

    let (program, args) = spec.start_command.split_first().ok_or_else(|| {
        spawn_error(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "start command is empty",
        ))
    })?;

    let mut command = Command::new(program);
    command
        .args(args)
        .current_dir(&spec.working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    // Own process group, so wrapper shells and their children are stopped together.
    #[cfg(unix)]
    command.process_group(0);
    let mut child = command.spawn().map_err(spawn_error)?;

    let output = OutputTail::new(OUTPUT_TAIL_LINES);
    if let Some(stdout) = child.stdout.take() {
        tokio::spawn(collect_output(stdout, "stdout", output.clone()));
    }
    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(collect_output(stderr, "stderr", output.clone()));
    }

    info!(
        command = %command_line,
        workdir = %spec.working_dir.display(),
        pid = child.id(),
        "Launched provider"
    );
    Ok(OwnedProcess { child, output })
}

/// Drain one output pipe until EOF.
///
/// Lines are split on raw bytes and decoded lossily: the pipe must stay open
/// whatever the provider writes, or its next write fails with `EPIPE`.
async fn collect_output<R: AsyncRead + Unpin>(reader: R, stream: &'static str, tail: OutputTail) {
    let mut segments = BufReader::new(reader).split(b'\n');
    loop {
        match segments.next_segment().await {
            Ok(Some(raw)) => {
                let line = decode_line(&raw);
                debug!(target: "provider_output", stream, "{line}");
                tail.push(line).await;
            }
            Ok(None) => break,
            Err(err) => {
                warn!(stream, error = %err, "Stopped reading provider output");
                break;
            }
        }
    }
}

fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

async fn terminate(process: &mut OwnedProcess, spec: &ServiceSpec) {
    match process.child.try_wait() {
        Ok(Some(status)) => {
            debug!(%status, "Provider already exited");
            return;
        }
        Ok(None) => {}
        Err(err) => warn!(error = %err, "Could not query provider status"),
    }

    request_stop(&mut process.child);

    match tokio::time::timeout(spec.grace_period, process.child.wait()).await {
        Ok(Ok(status)) => info!(%status, "Provider stopped"),
        Ok(Err(err)) => warn!(error = %err, "Failed to wait for provider"),
        Err(_) => {
            warn!(
                grace_ms = u64::try_from(spec.grace_period.as_millis()).unwrap_or(u64::MAX),
                "Provider ignored SIGTERM, killing it"
            );
            force_stop(&mut process.child);
            if let Err(err) = process.child.kill().await {
                warn!(error = %err, "Failed to kill provider");
            }
        }
    }
}

#[cfg(unix)]
fn signal_group(child: &Child, signal: nix::sys::signal::Signal) {
    use nix::sys::signal::killpg;
    use nix::unistd::Pid;

    let Some(pid) = child.id().and_then(|pid| i32::try_from(pid).ok()) else {
        return;
    };
    if let Err(err) = killpg(Pid::from_raw(pid), signal) {
        warn!(pid, signal = signal.as_str(), error = %err, "Failed to signal provider process group");
    }
}

#[cfg(unix)]
fn request_stop(child: &mut Child) {
    signal_group(child, nix::sys::signal::Signal::SIGTERM);
}

#[cfg(unix)]
fn force_stop(child: &mut Child) {
    signal_group(child, nix::sys::signal::Signal::SIGKILL);
}

#[cfg(not(unix))]
fn request_stop(child: &mut Child) {
    if let Err(err) = child.start_kill() {
        warn!(error = %err, "Failed to kill provider");
    }
}

#[cfg(not(unix))]
fn force_stop(_child: &mut Child) {}
