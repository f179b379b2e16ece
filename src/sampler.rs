/// Self CPU-time sampling: how much kernel and user time has *this* process
/// accumulated since it started.
///
/// The watchdog watches its own consumption, not the target's. Values are
/// cumulative, so consumers must always diff two snapshots; a single
/// snapshot says nothing about current load.
use nix::sys::resource::{getrusage, UsageWho};
use nix::sys::time::TimeVal;
use std::time::Instant;

/// Point-in-time CPU-time reading for the watchdog's own process.
///
/// Tick counts are 100-nanosecond units and monotonically non-decreasing.
/// One snapshot is kept per cycle and superseded by the next.
#[derive(Debug, Clone, Copy)]
pub struct CpuTimeSnapshot {
    /// When the snapshot was captured; pairs the CPU reading with wall time.
    pub taken_at: Instant,
    /// Cumulative kernel-mode CPU time, in 100 ns ticks.
    pub kernel_ticks: u64,
    /// Cumulative user-mode CPU time, in 100 ns ticks.
    pub user_ticks: u64,
}

impl CpuTimeSnapshot {
    /// Total cumulative CPU time (kernel + user), in 100 ns ticks.
    pub fn cpu_ticks(&self) -> u64 {
        self.kernel_ticks + self.user_ticks
    }
}

/// Errors that can occur while sampling.
#[derive(Debug)]
pub enum SampleError {
    /// The rusage query itself failed.
    Rusage { source: nix::Error },
}

impl std::fmt::Display for SampleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SampleError::Rusage { source } => {
                write!(f, "failed to query own process CPU times: {}", source)
            }
        }
    }
}

impl std::error::Error for SampleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SampleError::Rusage { source } => Some(source),
        }
    }
}

/// Capture a fresh snapshot of this process's cumulative CPU times.
///
/// Fails only if the underlying OS query fails; the caller treats that as
/// fatal since no safe monitoring decision can be made without it.
pub fn sample() -> Result<CpuTimeSnapshot, SampleError> {
    let usage = getrusage(UsageWho::RUSAGE_SELF).map_err(|e| SampleError::Rusage { source: e })?;
    Ok(CpuTimeSnapshot {
        taken_at: Instant::now(),
        kernel_ticks: timeval_to_ticks(usage.system_time()),
        user_ticks: timeval_to_ticks(usage.user_time()),
    })
}

/// Convert an rusage timeval (microsecond resolution) to 100 ns ticks.
fn timeval_to_ticks(tv: TimeVal) -> u64 {
    let micros = tv.tv_sec().max(0) as u64 * 1_000_000 + tv.tv_usec().max(0) as u64;
    micros * 10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_succeeds() {
        let snap = sample().unwrap();
        // Cumulative counters can be zero right after start but never "negative".
        assert!(snap.cpu_ticks() >= snap.kernel_ticks);
        assert!(snap.cpu_ticks() >= snap.user_ticks);
    }

    #[test]
    fn test_samples_are_monotonic() {
        let first = sample().unwrap();
        // Burn a little CPU so the second reading has a chance to move.
        let mut acc: u64 = 0;
        for i in 0..2_000_000u64 {
            acc = acc.wrapping_add(i.wrapping_mul(31));
        }
        std::hint::black_box(acc);
        let second = sample().unwrap();

        assert!(second.cpu_ticks() >= first.cpu_ticks());
        assert!(second.taken_at >= first.taken_at);
    }

    #[test]
    fn test_cpu_ticks_sums_kernel_and_user() {
        let snap = CpuTimeSnapshot {
            taken_at: Instant::now(),
            kernel_ticks: 300,
            user_ticks: 700,
        };
        assert_eq!(snap.cpu_ticks(), 1000);
    }
}
