//! The signal-delivery entry point.
//!
//! Everything reachable from here runs inside a signal handler on a process
//! that is already dying. The operations that are not strictly
//! async-signal-safe (`dladdr`, the formatting allocations, spawning the
//! line helper) are deliberate, documented trade-offs: the alternatives are
//! no report at all, and the worst case is the death the process was headed
//! for anyway.

use std::fmt::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::context;
use crate::line_info::LineLocator;
use crate::memory::LiveMemory;
use crate::report;
use crate::resolve::DlAddrResolver;
use crate::types::FaultInfo;

/// Status the process exits with once the report is out; the shell sees the
/// classic `_exit(-1)`.
pub const EXIT_STATUS: libc::c_int = 255;

static REPORTING: AtomicBool = AtomicBool::new(false);

/// Unbuffered, unsynchronized writer straight to the stderr fd.
///
/// Locks and stream buffers are useless to a process this close to death;
/// every write has to reach the fd before `_exit`.
struct RawStderr;

impl Write for RawStderr {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let ret = unsafe {
            libc::write(
                libc::STDERR_FILENO,
                s.as_ptr() as *const libc::c_void,
                s.len(),
            )
        };
        if ret == -1 {
            Err(fmt::Error)
        } else {
            Ok(())
        }
    }
}

#[cfg(target_os = "linux")]
unsafe fn fault_address(info: *const libc::siginfo_t) -> usize {
    (*info).si_addr() as usize
}

#[cfg(not(target_os = "linux"))]
unsafe fn fault_address(info: *const libc::siginfo_t) -> usize {
    (*info).si_addr as usize
}

/// Fault-signal entry point. Emits the report and terminates the process;
/// control never returns to the interrupted program.
///
/// Reentrancy policy: the first delivery wins the `REPORTING` flag. A
/// delivery on another thread while a report is being written gets one
/// minimal line and an immediate exit. A fault inside this handler itself
/// falls through to the default disposition, because registration used
/// `SA_RESETHAND`.
pub(crate) extern "C" fn fault_handler(
    signum: libc::c_int,
    info: *mut libc::siginfo_t,
    ctx: *mut libc::c_void,
) {
    if REPORTING.swap(true, Ordering::SeqCst) {
        let _ = RawStderr.write_str("Fault while reporting a fault, giving up.\n");
        unsafe { libc::_exit(EXIT_STATUS) };
    }

    let fault = unsafe {
        FaultInfo {
            signo: signum as i32,
            errno: (*info).si_errno as i32,
            code: (*info).si_code as i32,
            addr: fault_address(info),
        }
    };
    let regs = unsafe { context::capture(ctx as *const libc::c_void) };

    let config = crate::config();
    let entry_symbol = config.map_or("main", |c| c.entry_symbol.as_str());
    let timeout = config.map_or(Duration::from_secs(1), |c| c.helper_timeout);
    let locator = config
        .and_then(|c| c.executable.clone())
        .map(|exe| LineLocator::new(exe, timeout));

    let _ = report::emit(
        &mut RawStderr,
        &fault,
        &regs,
        &DlAddrResolver,
        &LiveMemory,
        locator.as_ref(),
        entry_symbol,
    );

    unsafe { libc::_exit(EXIT_STATUS) };
}
