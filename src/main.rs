mod config;
mod countdown;
mod monitor;
mod procdir;
mod sampler;
mod utilization;

use clap::Parser;
use config::WatchConfig;
use monitor::{MonitorLoop, MonitorOutcome};
use procdir::SystemDirectory;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// A watchdog that terminates a named process after a countdown. It samples
/// its own CPU use once a minute and aborts (leaving the target running) if
/// it ever exceeds the configured utilization budget.
#[derive(Parser, Debug)]
#[command(name = "apptimer", version, about)]
pub struct Cli {
    /// Target process executable name (must currently be running)
    #[arg(short, long, required_unless_present = "list_processes")]
    target: Option<String>,

    /// Countdown duration in whole minutes (>= 1)
    #[arg(short = 'c', long, value_name = "MINUTES", required_unless_present = "list_processes")]
    timer: Option<u32>,

    /// Max CPU utilization percent of the watchdog itself before it aborts
    #[arg(short = 'm', long, value_name = "PERCENT", default_value_t = config::DEFAULT_MAX_CPU_PERCENT)]
    max_cpu: f64,

    /// Print a progress line every cycle
    #[arg(short = 'l', long, value_name = "BOOL", default_value_t = true, action = clap::ArgAction::Set)]
    logs: bool,

    /// Dump all running processes (pid and name) and exit
    #[arg(short = 'p', long)]
    list_processes: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Outcome reports and the startup banner are unconditional; --logs only
    // gates the per-cycle progress line inside the monitor loop.
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(false)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut directory = SystemDirectory::new();

    if cli.list_processes {
        for record in directory.list() {
            println!("PID : {:>6}, Name : {}", record.pid, record.name);
        }
        return ExitCode::SUCCESS;
    }

    // required_unless_present guarantees both are set past this point.
    let (Some(target), Some(timer)) = (cli.target, cli.timer) else {
        return ExitCode::from(2);
    };

    let config = match WatchConfig::new(target, timer, cli.max_cpu, cli.logs) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration, not starting");
            return ExitCode::from(2);
        }
    };

    if let Err(e) = config.ensure_target_running(&mut directory) {
        tracing::error!(error = %e, "refusing to start");
        return ExitCode::from(2);
    }

    let core_count = directory.core_count();
    tracing::info!(
        process = %config.target,
        timer_minutes = config.timer_minutes,
        max_cpu_percent = config.max_cpu_percent,
        logs = config.verbose,
        cores = core_count,
        "apptimer starting"
    );

    let mut monitor = MonitorLoop::new(&config, directory, core_count);
    match monitor.run() {
        Ok(MonitorOutcome::Terminated { pid }) => {
            tracing::info!(pid, process = %config.target, "done, target terminated");
            ExitCode::SUCCESS
        }
        Ok(MonitorOutcome::AlreadyExited) => {
            tracing::info!(process = %config.target, "done, target had already exited");
            ExitCode::SUCCESS
        }
        Ok(MonitorOutcome::TerminateFailed { pid }) => {
            tracing::warn!(pid, process = %config.target, "done, but the target could not be terminated");
            ExitCode::SUCCESS
        }
        Ok(MonitorOutcome::Aborted { cpu_percent }) => {
            tracing::warn!(cpu_percent, "aborted on self-overload, target left running");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "watchdog run failed");
            ExitCode::FAILURE
        }
    }
}
