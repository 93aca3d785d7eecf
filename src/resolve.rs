//! Instruction-pointer to symbol resolution through the dynamic loader.
//!
//! `dladdr` is not on the strict async-signal-safe list, but it only reads
//! loader state that never changes while the process is dying, and glibc's
//! own `backtrace_symbols_fd` relies on it from signal handlers. Accepted
//! here for the same reason.

use std::ffi::CStr;
use std::mem::MaybeUninit;

use crate::types::SymbolInfo;

/// Maps an instruction pointer to its owning module and the nearest
/// preceding exported symbol.
pub trait Resolve {
    /// `None` means the address lies outside every loaded module. The walk
    /// treats that as the end of the chain, never as something to guess
    /// around.
    fn resolve(&self, ip: usize) -> Option<SymbolInfo>;
}

/// Resolver backed by `libc::dladdr`.
pub struct DlAddrResolver;

impl Resolve for DlAddrResolver {
    fn resolve(&self, ip: usize) -> Option<SymbolInfo> {
        let mut info = MaybeUninit::<libc::Dl_info>::uninit();
        let found = unsafe { libc::dladdr(ip as *const libc::c_void, info.as_mut_ptr()) };
        if found == 0 {
            return None;
        }
        let info = unsafe { info.assume_init() };
        if info.dli_fname.is_null() {
            return None;
        }

        let module = unsafe { CStr::from_ptr(info.dli_fname) }
            .to_string_lossy()
            .into_owned();
        let mut name = if info.dli_sname.is_null() {
            None
        } else {
            Some(
                unsafe { CStr::from_ptr(info.dli_sname) }
                    .to_string_lossy()
                    .into_owned(),
            )
        };
        let mut start = if info.dli_saddr.is_null() {
            None
        } else {
            Some(info.dli_saddr as usize)
        };

        // A name without a start at or below the queried address is not a
        // symbol we can report an offset against.
        if name.is_some() && start.map_or(true, |s| s > ip) {
            name = None;
            start = None;
        }

        Some(SymbolInfo {
            module,
            name,
            start,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_a_libc_function() {
        let ip = libc::getpid as usize;
        let sym = DlAddrResolver.resolve(ip).expect("getpid is in a module");
        assert!(!sym.module.is_empty());
        if let Some(start) = sym.start {
            assert!(start <= ip);
            assert!(sym.name.is_some());
        }
    }

    #[test]
    fn unmapped_address_does_not_resolve() {
        // Page zero is never mapped.
        assert!(DlAddrResolver.resolve(1).is_none());
    }
}
