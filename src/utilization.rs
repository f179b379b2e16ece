/// CPU-utilization estimation: turn two cumulative CPU-time snapshots plus
/// elapsed wall time into a machine-wide utilization percentage.
use crate::sampler::CpuTimeSnapshot;

/// A derived utilization value for one monitoring cycle. Never negative;
/// only exceeds 100 if the OS misreports the core count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UtilizationReading {
    pub percent: f64,
}

/// Estimate utilization from the CPU-time delta between two snapshots.
///
/// Ticks are 100 ns units, so `ticks * 100` is the CPU time in nanoseconds.
/// The raw CPU-over-wall ratio is divided by the logical core count to get
/// whole-machine utilization, then scaled to a percentage.
///
/// `wall_elapsed_nanos` must be strictly positive; the fixed one-minute
/// cadence guarantees that for real callers.
pub fn estimate(
    prev: &CpuTimeSnapshot,
    curr: &CpuTimeSnapshot,
    wall_elapsed_nanos: u64,
    core_count: u32,
) -> UtilizationReading {
    let cpu_elapsed_ticks = curr.cpu_ticks().saturating_sub(prev.cpu_ticks());
    let cpu_elapsed_nanos = cpu_elapsed_ticks.saturating_mul(100);

    let raw = cpu_elapsed_nanos as f64 / wall_elapsed_nanos as f64;
    let per_core = raw / core_count as f64;

    UtilizationReading {
        percent: per_core * 100.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    const MINUTE_NANOS: u64 = 60_000_000_000;

    fn snap(cpu_ticks: u64) -> CpuTimeSnapshot {
        CpuTimeSnapshot {
            taken_at: Instant::now(),
            kernel_ticks: 0,
            user_ticks: cpu_ticks,
        }
    }

    #[test]
    fn test_full_core_on_single_core_machine_is_100_percent() {
        // One minute of CPU time over one minute of wall time on one core.
        // 60e9 ns of CPU = 600_000_000 ticks of 100 ns.
        let reading = estimate(&snap(0), &snap(600_000_000), MINUTE_NANOS, 1);
        assert_eq!(reading.percent, 100.0);
    }

    #[test]
    fn test_normalized_across_cores() {
        // A fully busy core on an 8-core machine is 12.5% of the machine.
        let reading = estimate(&snap(0), &snap(600_000_000), MINUTE_NANOS, 8);
        assert_eq!(reading.percent, 12.5);
    }

    #[test]
    fn test_zero_delta_is_zero_percent() {
        let reading = estimate(&snap(5_000), &snap(5_000), MINUTE_NANOS, 4);
        assert_eq!(reading.percent, 0.0);
    }

    #[test]
    fn test_monotone_in_cpu_delta() {
        let prev = snap(0);
        let mut last = -1.0;
        for ticks in [0u64, 1_000, 50_000, 3_000_000, 600_000_000] {
            let reading = estimate(&prev, &snap(ticks), MINUTE_NANOS, 8);
            assert!(reading.percent > last);
            last = reading.percent;
        }
    }

    #[test]
    fn test_idempotent_for_identical_inputs() {
        let prev = snap(1_234);
        let curr = snap(987_654);
        let a = estimate(&prev, &curr, MINUTE_NANOS, 8);
        let b = estimate(&prev, &curr, MINUTE_NANOS, 8);
        assert_eq!(a, b);
    }

    #[test]
    fn test_counter_regression_clamps_to_zero() {
        // Cumulative counters should never go backwards; if they do, report
        // zero load rather than a huge wrapped value.
        let reading = estimate(&snap(1_000_000), &snap(999_999), MINUTE_NANOS, 1);
        assert_eq!(reading.percent, 0.0);
    }

    #[test]
    fn test_tick_to_nanosecond_conversion() {
        // 300_000_000 ticks = 30e9 ns of CPU over 60e9 ns of wall on 1 core = 50%.
        let reading = estimate(&snap(0), &snap(300_000_000), MINUTE_NANOS, 1);
        assert_eq!(reading.percent, 50.0);
    }
}
