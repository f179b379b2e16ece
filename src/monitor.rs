/// The monitor loop: sample once a minute, keep the countdown honest, and
/// decide between carrying on, aborting on self-overload, and firing the
/// termination on expiry.
///
/// The per-cycle decision (`step`) is pure over the snapshot pair and the
/// elapsed wall time, so every transition is testable without sleeping;
/// `run` wraps it with the real clock, the real sampler, and a blocking
/// one-minute sleep.
use crate::config::WatchConfig;
use crate::countdown::CountdownTimer;
use crate::procdir::ProcessDirectory;
use crate::sampler::{self, CpuTimeSnapshot, SampleError};
use crate::utilization;
use std::time::Duration;

/// Fixed sampling cadence; not adjustable mid-run.
pub const CADENCE: Duration = Duration::from_secs(60);

/// Decision produced by one monitoring cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleDecision {
    /// Still counting down; carries fresh readings for the progress line.
    Continue {
        remaining_minutes: f64,
        cpu_percent: f64,
    },
    /// The watchdog exceeded its own CPU budget. Terminal; the target is
    /// left untouched.
    Abort { cpu_percent: f64 },
    /// The countdown reached zero. Terminal; the termination path fires.
    Expire,
}

/// How a run ended. `Aborted` protects the host from the watchdog's own
/// overhead; the three expiry variants all count as a completed run.
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorOutcome {
    Aborted { cpu_percent: f64 },
    Terminated { pid: u32 },
    TerminateFailed { pid: u32 },
    AlreadyExited,
}

/// Errors fatal to a run. Without a CPU sample there is no safe decision,
/// so a failed sample ends the whole run.
#[derive(Debug)]
pub enum MonitorError {
    Sample { source: SampleError },
}

impl std::fmt::Display for MonitorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MonitorError::Sample { source } => {
                write!(f, "CPU sampling failed mid-run: {}", source)
            }
        }
    }
}

impl std::error::Error for MonitorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MonitorError::Sample { source } => Some(source),
        }
    }
}

pub struct MonitorLoop<D> {
    directory: D,
    countdown: CountdownTimer,
    target: String,
    max_cpu_percent: f64,
    core_count: u32,
    verbose: bool,
}

impl<D: ProcessDirectory> MonitorLoop<D> {
    pub fn new(config: &WatchConfig, directory: D, core_count: u32) -> Self {
        Self {
            directory,
            countdown: CountdownTimer::new(config.timer_minutes),
            target: config.target.clone(),
            max_cpu_percent: config.max_cpu_percent,
            core_count,
            verbose: config.verbose,
        }
    }

    /// Evaluate one cycle: tick the countdown by the elapsed wall time,
    /// estimate utilization from the snapshot delta, then check overload
    /// before expiry. Overload wins even on a cycle where the timer also
    /// ran out.
    pub fn step(
        &mut self,
        prev: &CpuTimeSnapshot,
        curr: &CpuTimeSnapshot,
        elapsed_wall: Duration,
    ) -> CycleDecision {
        let remaining_minutes = self.countdown.tick(elapsed_wall.as_millis() as u64);
        let reading =
            utilization::estimate(prev, curr, elapsed_wall.as_nanos() as u64, self.core_count);

        if reading.percent > self.max_cpu_percent {
            return CycleDecision::Abort {
                cpu_percent: reading.percent,
            };
        }

        if self.countdown.is_expired() {
            return CycleDecision::Expire;
        }

        CycleDecision::Continue {
            remaining_minutes,
            cpu_percent: reading.percent,
        }
    }

    /// Expiry path: one lookup, at most one terminate request, no retry.
    pub fn fire(&mut self) -> MonitorOutcome {
        let record = match self.directory.find_by_name(&self.target) {
            Some(record) => record,
            None => {
                tracing::info!(
                    process = %self.target,
                    "target already exited before the countdown ended"
                );
                return MonitorOutcome::AlreadyExited;
            }
        };

        if self.directory.terminate(record.pid) {
            tracing::info!(
                process = %self.target,
                pid = record.pid,
                minutes = self.countdown.total_minutes(),
                "target terminated after countdown"
            );
            MonitorOutcome::Terminated { pid: record.pid }
        } else {
            tracing::warn!(
                process = %self.target,
                pid = record.pid,
                "terminate request was refused"
            );
            MonitorOutcome::TerminateFailed { pid: record.pid }
        }
    }

    /// Run to completion: a single thread sleeping one wall-clock minute
    /// between cycles. The only early exit is the self-overload abort.
    pub fn run(&mut self) -> Result<MonitorOutcome, MonitorError> {
        let mut prev = sampler::sample().map_err(|e| MonitorError::Sample { source: e })?;

        loop {
            std::thread::sleep(CADENCE);

            let curr = sampler::sample().map_err(|e| MonitorError::Sample { source: e })?;
            let elapsed_wall = curr.taken_at.duration_since(prev.taken_at);

            match self.step(&prev, &curr, elapsed_wall) {
                CycleDecision::Continue {
                    remaining_minutes,
                    cpu_percent,
                } => {
                    if self.verbose {
                        tracing::info!(
                            remaining_minutes,
                            total_minutes = self.countdown.total_minutes(),
                            cpu_percent,
                            "countdown progressing"
                        );
                    }
                    prev = curr;
                }
                CycleDecision::Abort { cpu_percent } => {
                    tracing::warn!(
                        cpu_percent,
                        max_cpu_percent = self.max_cpu_percent,
                        "watchdog exceeded its own CPU budget, leaving the target running"
                    );
                    return Ok(MonitorOutcome::Aborted { cpu_percent });
                }
                CycleDecision::Expire => return Ok(self.fire()),
            }
        }
    }
}
