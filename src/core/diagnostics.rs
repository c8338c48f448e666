//! Process diagnostics captured when the engine misbehaves
//!
//! eSpeak-NG has a history of leaking file handles and child processes under
//! load. When a phonemization call fails we log a snapshot of the process so
//! leaks show up next to the failure that exposed them.

use std::collections::{HashSet, VecDeque};
use std::fmt;

use sysinfo::{Pid, ProcessesToUpdate, System};

/// Point-in-time view of this process. `None` means the value could not be read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessDiagnostics {
    pub open_files: Option<usize>,
    pub resident_memory_bytes: Option<u64>,
    pub child_processes: Option<usize>,
}

impl fmt::Display for ProcessDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.open_files {
            Some(n) => write!(f, "open_files={n}")?,
            None => write!(f, "open_files=unavailable")?,
        }
        match self.resident_memory_bytes {
            Some(bytes) => write!(f, " memory={:.1}MB", bytes as f64 / 1024.0 / 1024.0)?,
            None => write!(f, " memory=unavailable")?,
        }
        match self.child_processes {
            Some(n) => write!(f, " subprocesses={n}"),
            None => write!(f, " subprocesses=unavailable"),
        }
    }
}

/// Source of process diagnostics. Must not panic; unreadable values are `None`.
pub trait DiagnosticsProvider: Send + Sync {
    fn capture(&self) -> ProcessDiagnostics;
}

/// Diagnostics read from the operating system via `sysinfo`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemDiagnostics;

impl DiagnosticsProvider for SystemDiagnostics {
    fn capture(&self) -> ProcessDiagnostics {
        let open_files = count_open_files();

        let Ok(pid) = sysinfo::get_current_pid() else {
            return ProcessDiagnostics {
                open_files,
                ..Default::default()
            };
        };

        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::All, true);

        ProcessDiagnostics {
            open_files,
            resident_memory_bytes: sys.process(pid).map(|p| p.memory()),
            child_processes: Some(count_descendants(&sys, pid)),
        }
    }
}

/// Count live descendants of `root`, skipping threads
fn count_descendants(sys: &System, root: Pid) -> usize {
    let mut seen = HashSet::new();
    let mut queue = VecDeque::from([root]);

    while let Some(parent) = queue.pop_front() {
        for (pid, process) in sys.processes() {
            if process.thread_kind().is_some() || process.parent() != Some(parent) {
                continue;
            }
            if seen.insert(*pid) {
                queue.push_back(*pid);
            }
        }
    }

    seen.len()
}

#[cfg(target_os = "linux")]
fn count_open_files() -> Option<usize> {
    std::fs::read_dir("/proc/self/fd")
        .ok()
        .map(|entries| entries.count())
}

#[cfg(not(target_os = "linux"))]
fn count_open_files() -> Option<usize> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_values() {
        let diagnostics = ProcessDiagnostics {
            open_files: Some(12),
            resident_memory_bytes: Some(50 * 1024 * 1024),
            child_processes: Some(1),
        };
        assert_eq!(
            diagnostics.to_string(),
            "open_files=12 memory=50.0MB subprocesses=1"
        );
    }

    #[test]
    fn test_display_unavailable() {
        assert_eq!(
            ProcessDiagnostics::default().to_string(),
            "open_files=unavailable memory=unavailable subprocesses=unavailable"
        );
    }

    #[test]
    fn test_system_diagnostics_reads_own_process() {
        let diagnostics = SystemDiagnostics.capture();
        assert!(diagnostics.resident_memory_bytes.unwrap_or(1) > 0);
        #[cfg(target_os = "linux")]
        assert!(diagnostics.open_files.unwrap() >= 3);
    }

    #[test]
    fn test_child_process_is_counted() {
        let Ok(mut child) = std::process::Command::new("sleep").arg("5").spawn() else {
            return; // no `sleep` binary on this host
        };

        let diagnostics = SystemDiagnostics.capture();
        let _ = child.kill();
        let _ = child.wait();

        assert!(diagnostics.child_processes.unwrap_or(0) >= 1);
    }
}
