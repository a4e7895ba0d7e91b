// Sat Oct 17 2026 - Alex

#[cfg(unix)]
use libc::pid_t;

pub struct ProcessUtils;

impl ProcessUtils {
    #[cfg(unix)]
    pub fn is_process_running(pid: u32) -> bool {
        unsafe { libc::kill(pid as pid_t, 0) == 0 }
    }

    #[cfg(not(unix))]
    pub fn is_process_running(_pid: u32) -> bool {
        false
    }

    /// Asks the process to stop. Returns `false` if the signal could not be delivered.
    #[cfg(unix)]
    pub fn send_terminate(pid: u32) -> bool {
        unsafe { libc::kill(pid as pid_t, libc::SIGTERM) == 0 }
    }

    #[cfg(not(unix))]
    pub fn send_terminate(_pid: u32) -> bool {
        false
    }

    pub fn get_current_pid() -> u32 {
        std::process::id()
    }
}

pub fn is_running(pid: u32) -> bool {
    ProcessUtils::is_process_running(pid)
}

pub fn terminate(pid: u32) -> bool {
    ProcessUtils::send_terminate(pid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_current_process_is_running() {
        assert!(is_running(ProcessUtils::get_current_pid()));
    }

    #[cfg(unix)]
    #[test]
    fn test_terminate_child() {
        let mut child = std::process::Command::new("sleep").arg("30").spawn().unwrap();
        assert!(terminate(child.id()));
        let status = child.wait().unwrap();
        assert!(!status.success());
    }
}
