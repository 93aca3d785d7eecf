//! Report formatting and the emission pipeline.
//!
//! Everything here is generic over the sink, the resolver and the memory
//! reader so the complete report can be exercised against a `String` with
//! synthetic stacks; the handler runs the same code against raw stderr and
//! the live process.

use std::fmt::{self, Write};

use crate::context::RegisterSnapshot;
use crate::demangle::demangle;
use crate::line_info::LineLocator;
use crate::memory::ReadWord;
use crate::resolve::Resolve;
use crate::types::{Arch, FaultInfo, ResolvedFrame};
use crate::walker::StackWalker;

/// Mnemonic for the kernel's fault-reason code. Unknown codes render as a
/// marker rather than indexing anything.
pub fn si_code_str(code: i32) -> &'static str {
    match code {
        0 => "",
        1 => "address not mapped",
        2 => "access violation on mapped address",
        _ => "code out of range",
    }
}

fn write_register<W: Write>(w: &mut W, arch: Arch, index: usize, value: u64) -> fmt::Result {
    match arch {
        Arch::X86 => writeln!(w, "reg[{:02}]       = 0x{:08x}", index, value),
        Arch::Other => writeln!(w, "reg[{:02}]       = 0x{:x}", index, value),
        Arch::X86_64 | Arch::Aarch64 => {
            writeln!(w, "reg[{:02}]       = 0x{:016x}", index, value)
        }
    }
}

/// Signal metadata and the full register dump, one line per register in
/// platform-native order.
pub fn write_header<W: Write>(
    w: &mut W,
    fault: &FaultInfo,
    regs: &RegisterSnapshot,
) -> fmt::Result {
    writeln!(w, "Segmentation Fault!")?;
    writeln!(w, "info.si_signo = {}", fault.signo)?;
    writeln!(w, "info.si_errno = {}", fault.errno)?;
    writeln!(w, "info.si_code  = {} ({})", fault.code, si_code_str(fault.code))?;
    writeln!(w, "info.si_addr  = 0x{:x}", fault.addr)?;
    for (index, value) in regs.registers().iter().enumerate() {
        write_register(w, regs.arch(), index, *value)?;
    }
    Ok(())
}

fn write_frame<W: Write>(w: &mut W, counter: usize, resolved: &ResolvedFrame) -> fmt::Result {
    writeln!(w, "=== {}", resolved.symbol.module)?;
    writeln!(
        w,
        "{:2}: 0x{:x} <{}+{}> ({})",
        counter,
        resolved.frame.ip,
        resolved.display_name,
        resolved.symbol.offset_from(resolved.frame.ip),
        resolved.symbol.module
    )?;
    if let Some(line) = &resolved.line_info {
        writeln!(w, "On File Line:")?;
        writeln!(w, "{}", line)?;
    }
    Ok(())
}

/// Emits the whole report: header, register dump, one numbered line per
/// walked frame and the trailer. Each frame is completed, annotation
/// included, before the next one is resolved.
pub fn emit<W, R, M>(
    w: &mut W,
    fault: &FaultInfo,
    regs: &RegisterSnapshot,
    resolver: &R,
    memory: &M,
    locator: Option<&LineLocator>,
    entry_symbol: &str,
) -> fmt::Result
where
    W: Write,
    R: Resolve,
    M: ReadWord,
{
    write_header(w, fault, regs)?;
    writeln!(w, "Stack trace:")?;

    let walker = StackWalker::new(
        resolver,
        memory,
        entry_symbol,
        regs.instruction_pointer(),
        regs.frame_pointer(),
    );
    for (index, (frame, symbol)) in walker.enumerate() {
        let display_name = demangle(symbol.name.as_deref()).into_owned();
        let line_info = locator.and_then(|locator| locator.lookup(frame.ip));
        let resolved = ResolvedFrame {
            frame,
            symbol,
            display_name,
            line_info,
        };
        write_frame(w, index + 1, &resolved)?;
    }

    writeln!(w, "End of stack trace.")
}
