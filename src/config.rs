/// Run configuration: the validated, immutable inputs to one watchdog run.
///
/// Built once from CLI arguments and passed by reference into the monitor
/// loop; nothing mutates it afterwards.
use crate::procdir::ProcessDirectory;
use tracing::warn;

/// Default abort threshold for the watchdog's own CPU use, in percent.
pub const DEFAULT_MAX_CPU_PERCENT: f64 = 1.0;

/// Thresholds at or above this are practically unreachable for a process
/// that sleeps a minute between cycles; they get a warning, not an error.
pub const IMPRACTICAL_CPU_PERCENT: f64 = 25.0;

#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Executable base name of the target process.
    pub target: String,
    /// Countdown duration in whole minutes.
    pub timer_minutes: u32,
    /// Abort the watchdog if its own utilization exceeds this percentage.
    pub max_cpu_percent: f64,
    /// Emit a progress line every cycle.
    pub verbose: bool,
}

/// Validation failures; the loop never starts when one is reported.
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    EmptyTarget,
    ZeroTimer,
    NonPositiveThreshold { value: f64 },
    TargetNotRunning { name: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::EmptyTarget => write!(f, "target process name must not be empty"),
            ConfigError::ZeroTimer => write!(f, "timer must be at least 1 minute"),
            ConfigError::NonPositiveThreshold { value } => {
                write!(f, "max CPU utilization must be > 0, got {:.2}", value)
            }
            ConfigError::TargetNotRunning { name } => {
                write!(f, "target process [{}] is not running", name)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl WatchConfig {
    /// Validate raw values into a config. A threshold that is valid but
    /// unreachable in practice is allowed with a warning.
    pub fn new(
        target: String,
        timer_minutes: u32,
        max_cpu_percent: f64,
        verbose: bool,
    ) -> Result<Self, ConfigError> {
        if target.is_empty() {
            return Err(ConfigError::EmptyTarget);
        }
        if timer_minutes < 1 {
            return Err(ConfigError::ZeroTimer);
        }
        if max_cpu_percent <= 0.0 {
            return Err(ConfigError::NonPositiveThreshold {
                value: max_cpu_percent,
            });
        }
        if threshold_is_impractical(max_cpu_percent) {
            warn!(
                max_cpu_percent,
                "threshold is not practical; this process will never reach that level, \
                 something between 0.1 and 5.0 is more useful"
            );
        }

        Ok(Self {
            target,
            timer_minutes,
            max_cpu_percent,
            verbose,
        })
    }

    /// Fail fast if the target is not currently running.
    pub fn ensure_target_running(
        &self,
        directory: &mut dyn ProcessDirectory,
    ) -> Result<(), ConfigError> {
        match directory.find_by_name(&self.target) {
            Some(_) => Ok(()),
            None => Err(ConfigError::TargetNotRunning {
                name: self.target.clone(),
            }),
        }
    }
}

/// True for thresholds the watchdog can never realistically trip.
pub fn threshold_is_impractical(max_cpu_percent: f64) -> bool {
    max_cpu_percent >= IMPRACTICAL_CPU_PERCENT
}
