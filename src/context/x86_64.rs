use super::RegisterSnapshot;
use crate::types::Arch;

/// Reads the saved general registers out of the `ucontext_t` delivered to
/// an `SA_SIGINFO` handler. Faulting ip is `RIP`, the chain head is `RBP`.
///
/// # Safety
///
/// `ctx` must point at the `ucontext_t` the kernel passed to the handler.
pub unsafe fn capture(ctx: *const libc::c_void) -> RegisterSnapshot {
    let ucontext = &*(ctx as *const libc::ucontext_t);
    let gregs = &ucontext.uc_mcontext.gregs;

    let mut regs = [0u64; super::MAX_REGS];
    let len = gregs.len().min(super::MAX_REGS);
    for (slot, greg) in regs.iter_mut().zip(gregs.iter()) {
        *slot = *greg as u64;
    }

    RegisterSnapshot::new(
        Arch::X86_64,
        &regs[..len],
        gregs[libc::REG_RIP as usize] as usize,
        gregs[libc::REG_RBP as usize] as usize,
    )
}
