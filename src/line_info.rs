//! Best-effort source-line lookup through an out-of-process helper.
//!
//! Spawning `addr2line` from a signal handler is the least safe thing this
//! crate does, and the report treats it accordingly: a helper that cannot
//! be spawned, exits unhappily, prints nothing or outlives its deadline
//! just costs that frame its annotation. Nothing here aborts the report.

use std::io::Read;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// Maps instruction pointers to `file:line` text by invoking
/// `addr2line <address> -e <executable>` and capturing its stdout verbatim.
///
/// Only constructed when the executable path is configured; without it the
/// locator does not exist and every frame simply has no annotation.
pub struct LineLocator {
    helper: String,
    executable: PathBuf,
    timeout: Duration,
}

impl LineLocator {
    pub fn new(executable: PathBuf, timeout: Duration) -> LineLocator {
        LineLocator {
            helper: "addr2line".to_string(),
            executable,
            timeout,
        }
    }

    /// Overrides the helper command. Exists for tests and for toolchains
    /// that ship a prefixed addr2line.
    pub fn with_helper(mut self, helper: &str) -> LineLocator {
        self.helper = helper.to_string();
        self
    }

    /// Best effort; `None` means no annotation for this frame.
    pub fn lookup(&self, ip: usize) -> Option<String> {
        let mut child = Command::new(&self.helper)
            .arg(format!("{:#x}", ip))
            .arg("-e")
            .arg(&self.executable)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .ok()?;

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if Instant::now() >= deadline {
                        // A wedged helper must not wedge the whole report.
                        let _ = child.kill();
                        let _ = child.wait();
                        return None;
                    }
                    thread::sleep(Duration::from_millis(5));
                }
                Err(_) => {
                    let _ = child.kill();
                    return None;
                }
            }
        };
        if !status.success() {
            return None;
        }

        let mut out = String::new();
        child.stdout.take()?.read_to_string(&mut out).ok()?;
        let out = out.trim_end();
        if out.is_empty() {
            None
        } else {
            Some(out.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locator_with(helper: &str) -> LineLocator {
        LineLocator::new(PathBuf::from("/bin/true"), Duration::from_millis(500))
            .with_helper(helper)
    }

    #[test]
    fn missing_helper_yields_no_annotation() {
        let locator = locator_with("/nonexistent/definitely-not-addr2line");
        assert_eq!(locator.lookup(0x1000), None);
    }

    #[test]
    fn helper_stdout_is_captured_verbatim() {
        // echo stands in for addr2line and parrots the arguments back.
        let locator = locator_with("echo");
        let out = locator.lookup(0x1000).expect("echo output");
        assert!(out.starts_with("0x1000 -e "));
    }

    #[test]
    fn wedged_helper_is_killed_at_the_deadline() {
        // `yes` never exits on its own.
        let locator = LineLocator::new(PathBuf::from("/bin/true"), Duration::from_millis(100))
            .with_helper("yes");
        let started = Instant::now();
        assert_eq!(locator.lookup(0x1000), None);
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
