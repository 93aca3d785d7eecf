//! Read-only register snapshots taken from the `ucontext_t` delivered with
//! a fault signal. One capture routine per supported architecture; the
//! fallback produces an empty snapshot so unsupported targets still get the
//! header portion of the report.

use crate::types::Arch;

#[cfg(all(target_os = "linux", target_arch = "x86_64"))]
mod x86_64;
#[cfg(all(target_os = "linux", target_arch = "x86_64"))]
pub use self::x86_64::capture;

#[cfg(all(target_os = "linux", target_arch = "x86"))]
mod x86;
#[cfg(all(target_os = "linux", target_arch = "x86"))]
pub use self::x86::capture;

#[cfg(all(target_os = "linux", target_arch = "aarch64"))]
mod aarch64;
#[cfg(all(target_os = "linux", target_arch = "aarch64"))]
pub use self::aarch64::capture;

#[cfg(not(all(
    target_os = "linux",
    any(target_arch = "x86_64", target_arch = "x86", target_arch = "aarch64")
)))]
mod generic;
#[cfg(not(all(
    target_os = "linux",
    any(target_arch = "x86_64", target_arch = "x86", target_arch = "aarch64")
)))]
pub use self::generic::capture;

/// Enough for the largest general-register file we dump (aarch64: x0-x30,
/// sp, pc, pstate).
pub const MAX_REGS: usize = 34;

/// The saved integer register file at the moment of the fault, plus the two
/// registers the walk cares about, picked out by the per-architecture
/// capture routine.
///
/// Storage is inline so taking a snapshot never allocates.
#[derive(Debug, Clone, Copy)]
pub struct RegisterSnapshot {
    arch: Arch,
    regs: [u64; MAX_REGS],
    len: usize,
    ip: usize,
    bp: usize,
}

impl RegisterSnapshot {
    pub fn new(arch: Arch, regs: &[u64], ip: usize, bp: usize) -> RegisterSnapshot {
        let mut storage = [0u64; MAX_REGS];
        let len = regs.len().min(MAX_REGS);
        storage[..len].copy_from_slice(&regs[..len]);
        RegisterSnapshot {
            arch,
            regs: storage,
            len,
            ip,
            bp,
        }
    }

    pub fn arch(&self) -> Arch {
        self.arch
    }

    /// Where execution faulted.
    pub fn instruction_pointer(&self) -> usize {
        self.ip
    }

    /// Value of the frame-pointer register, the head of the saved-frame
    /// chain.
    pub fn frame_pointer(&self) -> usize {
        self.bp
    }

    /// Registers in platform-native dump order.
    pub fn registers(&self) -> &[u64] {
        &self.regs[..self.len]
    }
}
