//! faultline prints a symbolized stack trace to stderr when the process
//! takes a fatal memory fault, then terminates it. It is meant for crashes
//! in the field, where attaching a debugger is impractical: the report
//! carries the signal metadata, a register dump, and one line per frame
//! with the demangled symbol, its byte offset and the owning module, plus a
//! best-effort `file:line` from an out-of-process `addr2line`.
//!
//! Install it before anything that might fault:
//!
//! ```no_run
//! use faultline::{install, Config};
//!
//! fn main() {
//!     let mut config = Config::default();
//!     if let Ok(exe) = std::env::current_exe() {
//!         config = config.with_executable(exe);
//!     }
//!     install(config);
//!     // ... the rest of the program ...
//! }
//! ```
//!
//! The whole pipeline runs inside the signal handler, so it avoids every
//! facility it can that assumes an intact process, and treats the ones it
//! cannot avoid as best-effort: a broken frame chain, a stripped binary or
//! a missing helper degrade the report, never abort it.

use std::path::PathBuf;
use std::ptr;
use std::sync::OnceLock;
use std::time::Duration;

use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};

mod context;
mod handler;

pub mod demangle;
pub mod line_info;
pub mod memory;
pub mod report;
pub mod resolve;
pub mod types;
pub mod walker;

pub use crate::context::RegisterSnapshot;
pub use crate::handler::EXIT_STATUS;
pub use crate::types::{Arch, FaultInfo, Frame, ResolvedFrame, SymbolInfo};

/// Process-wide crash-reporting configuration.
///
/// Created by the embedding application, frozen at [`install`] time; the
/// fault handler only ever reads it.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path of the running executable, handed to the line-lookup helper.
    /// When unset, line annotations are skipped entirely; the rest of the
    /// report is unaffected.
    pub executable: Option<PathBuf>,
    /// Signals to trap.
    pub signals: Vec<Signal>,
    /// How long one helper invocation may run before it is killed and the
    /// frame goes unannotated.
    pub helper_timeout: Duration,
    /// Symbol the walk stops at, so startup frames below user code are not
    /// reported.
    pub entry_symbol: String,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            executable: None,
            signals: vec![Signal::SIGSEGV, Signal::SIGBUS],
            helper_timeout: Duration::from_secs(1),
            entry_symbol: "main".to_string(),
        }
    }
}

impl Config {
    pub fn with_executable(mut self, path: PathBuf) -> Config {
        self.executable = Some(path);
        self
    }

    pub fn with_signals(mut self, signals: Vec<Signal>) -> Config {
        self.signals = signals;
        self
    }
}

static CONFIG: OnceLock<Config> = OnceLock::new();

pub(crate) fn config() -> Option<&'static Config> {
    CONFIG.get()
}

/// Registers the fault handler for every signal in `config.signals`.
///
/// Call once, at startup, before any code that might fault. A registration
/// failure is reported on stderr and otherwise ignored: a signal without a
/// handler falls through to the default terminating disposition, which is a
/// usable degraded mode. A second call keeps the first configuration.
pub fn install(config: Config) {
    let signals = config.signals.clone();
    if CONFIG.set(config).is_err() {
        eprintln!("faultline: install called twice, keeping the first configuration");
        return;
    }

    install_alt_stack();

    let action = SigAction::new(
        SigHandler::SigAction(handler::fault_handler),
        // One-shot: a fault inside the handler reverts to the default
        // disposition and kills the process instead of recursing.
        SaFlags::SA_SIGINFO | SaFlags::SA_ONSTACK | SaFlags::SA_NODEFER | SaFlags::SA_RESETHAND,
        SigSet::empty(),
    );
    for signal in signals {
        if let Err(err) = unsafe { sigaction(signal, &action) } {
            eprintln!("faultline: failed to install handler for {:?}: {}", signal, err);
        }
    }
}

/// A fault caused by stack exhaustion cannot be reported from the stack
/// that just ran out, so the handler gets its own.
fn install_alt_stack() {
    unsafe {
        let size = libc::SIGSTKSZ.max(libc::MINSIGSTKSZ) + 64 * 1024;
        let ss_sp = libc::malloc(size);
        if ss_sp.is_null() {
            return;
        }
        let stack = libc::stack_t {
            ss_sp,
            ss_flags: 0,
            ss_size: size,
        };
        if libc::sigaltstack(&stack, ptr::null_mut()) != 0 {
            libc::free(ss_sp);
        }
    }
}
