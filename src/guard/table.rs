//! Access to the operating system's process table.

use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid as NixPid;
use serde::Serialize;
use std::sync::Mutex;
use sysinfo::{Pid, ProcessStatus, ProcessesToUpdate, System};

use crate::error::Result;

/// Longest process name the kernel reports before truncating.
const COMM_LEN: usize = 15;

/// A running process identified by pid and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ProcessHandle {
    pub pid: u32,
    pub name: String,
}

/// Trait for process table backends.
pub trait ProcessTable: Send + Sync {
    /// Running processes whose name matches any of `names`.
    fn find_by_name(&self, names: &[String]) -> Vec<ProcessHandle>;

    /// Ask a process to exit.
    fn request_stop(&self, handle: &ProcessHandle) -> Result<()>;

    /// Kill a process without giving it a chance to clean up.
    fn force_kill(&self, handle: &ProcessHandle) -> Result<()>;

    /// Whether the process behind `handle` is still alive.
    ///
    /// A recycled pid running under another name does not count.
    fn is_running(&self, handle: &ProcessHandle) -> bool;
}

/// Process table backed by `sysinfo` for enumeration and POSIX signals
/// for termination.
pub struct SystemProcessTable {
    system: Mutex<System>,
}

impl SystemProcessTable {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }

    fn signal(&self, handle: &ProcessHandle, sig: Signal) -> Result<()> {
        match signal::kill(NixPid::from_raw(handle.pid as i32), sig) {
            Ok(()) => Ok(()),
            // Already gone
            Err(Errno::ESRCH) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Default for SystemProcessTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessTable for SystemProcessTable {
    fn find_by_name(&self, names: &[String]) -> Vec<ProcessHandle> {
        let mut system = match self.system.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        system.refresh_processes(ProcessesToUpdate::All, true);

        let own_pid = std::process::id();
        let mut found: Vec<ProcessHandle> = system
            .processes()
            .values()
            .filter(|p| p.status() != ProcessStatus::Zombie)
            .filter(|p| p.pid().as_u32() != own_pid)
            .filter_map(|p| {
                let name = p.name().to_string_lossy();
                names
                    .iter()
                    .any(|wanted| name_matches(&name, wanted))
                    .then(|| ProcessHandle {
                        pid: p.pid().as_u32(),
                        name: name.into_owned(),
                    })
            })
            .collect();

        found.sort_by_key(|h| h.pid);
        found
    }

    fn request_stop(&self, handle: &ProcessHandle) -> Result<()> {
        self.signal(handle, Signal::SIGTERM)
    }

    fn force_kill(&self, handle: &ProcessHandle) -> Result<()> {
        self.signal(handle, Signal::SIGKILL)
    }

    fn is_running(&self, handle: &ProcessHandle) -> bool {
        let mut system = match self.system.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let pid = Pid::from_u32(handle.pid);
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);

        match system.process(pid) {
            Some(p) => {
                p.status() != ProcessStatus::Zombie
                    && name_matches(&p.name().to_string_lossy(), &handle.name)
            }
            None => false,
        }
    }
}

/// Case-insensitive process name comparison.
///
/// Tolerates a `.exe` suffix and the kernel's 15-byte truncation of
/// long names.
pub fn name_matches(actual: &str, wanted: &str) -> bool {
    let actual = strip_exe(actual);
    let wanted = strip_exe(wanted);

    if actual.eq_ignore_ascii_case(wanted) {
        return true;
    }

    actual.len() == COMM_LEN
        && wanted.len() > COMM_LEN
        && wanted
            .get(..COMM_LEN)
            .map(|prefix| prefix.eq_ignore_ascii_case(actual))
            .unwrap_or(false)
}

fn strip_exe(name: &str) -> &str {
    let len = name.len();
    if len > 4 && name.is_char_boundary(len - 4) && name[len - 4..].eq_ignore_ascii_case(".exe") {
        &name[..len - 4]
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;
    use std::time::{Duration, Instant};

    #[test]
    fn test_name_matches_exact_and_case() {
        assert!(name_matches("Unity", "Unity"));
        assert!(name_matches("unity", "Unity"));
        assert!(!name_matches("Unity Hub", "Unity"));
    }

    #[test]
    fn test_name_matches_exe_suffix() {
        assert!(name_matches("Unity.exe", "Unity"));
        assert!(name_matches("Unity Hub.EXE", "Unity Hub"));
    }

    #[test]
    fn test_name_matches_truncated_comm() {
        assert!(name_matches("UnityCrashHandl", "UnityCrashHandler"));
        assert!(!name_matches("UnityCrash", "UnityCrashHandler"));
    }

    #[test]
    fn test_own_process_is_never_listed() {
        let table = SystemProcessTable::new();
        let own = std::env::current_exe()
            .ok()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .unwrap();

        let found = table.find_by_name(&[own]);
        assert!(found.iter().all(|h| h.pid != std::process::id()));
    }

    #[test]
    fn test_stop_real_child() {
        let mut child = Command::new("sleep").arg("30").spawn().unwrap();
        let handle = ProcessHandle {
            pid: child.id(),
            name: "sleep".to_string(),
        };
        let table = SystemProcessTable::new();

        assert!(table.is_running(&handle));
        table.request_stop(&handle).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while table.is_running(&handle) && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(50));
        }
        assert!(!table.is_running(&handle));

        let _ = child.wait();
    }

    #[test]
    fn test_signal_to_vanished_process_is_ok() {
        // Above the kernel's maximum pid, so never allocated
        let handle = ProcessHandle {
            pid: 4_194_400,
            name: "ghost".to_string(),
        };
        let table = SystemProcessTable::new();

        assert!(!table.is_running(&handle));
        assert!(table.request_stop(&handle).is_ok());
        assert!(table.force_kill(&handle).is_ok());
    }
}
