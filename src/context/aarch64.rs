use super::RegisterSnapshot;
use crate::types::Arch;

/// Reads the saved general registers out of the `ucontext_t` delivered to
/// an `SA_SIGINFO` handler. Faulting ip is `pc`; by convention `x29` is the
/// frame pointer. Dump order is x0-x30, sp, pc, pstate.
///
/// # Safety
///
/// `ctx` must point at the `ucontext_t` the kernel passed to the handler.
pub unsafe fn capture(ctx: *const libc::c_void) -> RegisterSnapshot {
    let ucontext = &*(ctx as *const libc::ucontext_t);
    let mcontext = &ucontext.uc_mcontext;

    let mut regs = [0u64; super::MAX_REGS];
    let mut len = 0;
    for x in mcontext.regs.iter() {
        regs[len] = *x;
        len += 1;
    }
    regs[len] = mcontext.sp;
    regs[len + 1] = mcontext.pc;
    regs[len + 2] = mcontext.pstate;
    len += 3;

    RegisterSnapshot::new(
        Arch::Aarch64,
        &regs[..len],
        mcontext.pc as usize,
        mcontext.regs[29] as usize,
    )
}
