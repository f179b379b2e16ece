/// Process directory: enumerate running processes, resolve a pid by
/// executable name, and request termination by pid.
///
/// These are simple stateless OS calls, kept behind a trait so the monitor
/// loop can be driven with a scripted directory in tests.
use std::ffi::OsStr;
use sysinfo::{Pid, Process, ProcessesToUpdate, System};

/// Linux reports process names through `/proc/<pid>/comm`, which truncates
/// to 15 bytes. Longer query names need the executable path instead.
const COMM_NAME_LIMIT: usize = 15;

/// A transient lookup result; not owned or retained by the monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessRecord {
    pub pid: u32,
    pub name: String,
}

/// Enumeration and termination as seen by the monitor loop.
pub trait ProcessDirectory {
    /// Exact, case-sensitive match on the executable base name. Returns the
    /// first match in OS enumeration order, which is not stable across
    /// calls. `None` covers both "not running" and "enumeration failed".
    fn find_by_name(&mut self, name: &str) -> Option<ProcessRecord>;

    /// Request termination of `pid`. One non-blocking attempt: no
    /// verification that the process exited, no escalation.
    fn terminate(&mut self, pid: u32) -> bool;
}

/// The real directory, backed by a sysinfo process table.
///
/// The table is re-read inside each call, so every lookup sees a fresh
/// snapshot and nothing leaks past the call that acquired it.
pub struct SystemDirectory {
    system: System,
}

impl SystemDirectory {
    pub fn new() -> Self {
        Self {
            system: System::new_all(),
        }
    }

    /// Logical core count, used to normalize CPU utilization.
    pub fn core_count(&self) -> u32 {
        self.system.cpus().len().max(1) as u32
    }

    /// Every running process, sorted by pid. Backs the `--list-processes`
    /// dump.
    pub fn list(&mut self) -> Vec<ProcessRecord> {
        self.refresh();
        let mut records: Vec<ProcessRecord> = self
            .system
            .processes()
            .iter()
            .map(|(pid, process)| ProcessRecord {
                pid: pid.as_u32(),
                name: process.name().to_string_lossy().into_owned(),
            })
            .collect();
        records.sort_by_key(|record| record.pid);
        records
    }

    fn refresh(&mut self) {
        self.system.refresh_processes(ProcessesToUpdate::All, true);
    }
}

impl Default for SystemDirectory {
    fn default() -> Self {
        Self::new()
    }
}

/// Exact, case-sensitive name match. Names longer than the kernel's comm
/// limit can never match the reported name, so those fall back to the file
/// name of the executable path.
fn name_matches(process: &Process, name: &str) -> bool {
    if process.name() == OsStr::new(name) {
        return true;
    }
    name.len() > COMM_NAME_LIMIT
        && process
            .exe()
            .and_then(|path| path.file_name())
            .is_some_and(|file| file == OsStr::new(name))
}

impl ProcessDirectory for SystemDirectory {
    fn find_by_name(&mut self, name: &str) -> Option<ProcessRecord> {
        self.refresh();
        self.system
            .processes()
            .iter()
            .find(|(_, process)| name_matches(process, name))
            .map(|(pid, process)| ProcessRecord {
                pid: pid.as_u32(),
                name: process.name().to_string_lossy().into_owned(),
            })
    }

    fn terminate(&mut self, pid: u32) -> bool {
        self.refresh();
        match self.system.process(Pid::from_u32(pid)) {
            Some(process) => process.kill(),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_sees_running_processes() {
        let mut directory = SystemDirectory::new();
        let records = directory.list();
        assert!(!records.is_empty());
        // Sorted by pid.
        for pair in records.windows(2) {
            assert!(pair[0].pid <= pair[1].pid);
        }
    }

    #[test]
    fn test_find_by_name_missing_process() {
        let mut directory = SystemDirectory::new();
        assert_eq!(
            directory.find_by_name("definitely-not-a-running-process-4f9c"),
            None
        );
    }

    #[test]
    fn test_terminate_unknown_pid_is_refused() {
        let mut directory = SystemDirectory::new();
        // Way above any default pid_max; lookup fails, so no signal is sent.
        assert!(!directory.terminate(u32::MAX - 1));
    }

    #[test]
    fn test_find_by_name_longer_than_comm_limit() {
        // Test binaries are named `apptimer-<hash>`, well past the 15-byte
        // comm limit, so this exercises the executable-path fallback.
        let exe = std::env::current_exe().unwrap();
        let name = exe.file_name().unwrap().to_str().unwrap().to_string();
        assert!(name.len() > COMM_NAME_LIMIT);

        let mut directory = SystemDirectory::new();
        let record = directory.find_by_name(&name);
        assert_eq!(record.map(|r| r.pid), Some(std::process::id()));
    }

    #[test]
    fn test_core_count_is_positive() {
        let directory = SystemDirectory::new();
        assert!(directory.core_count() >= 1);
    }

    #[test]
    fn test_default_matches_new() {
        let directory = SystemDirectory::default();
        assert!(directory.core_count() >= 1);
    }
}
