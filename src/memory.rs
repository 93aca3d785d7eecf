//! The frame-pointer chase expressed as "read the word at address X".
//! Keeping it behind a trait lets the walker observe a read failing closed
//! instead of dereferencing blind, and lets tests substitute a synthetic
//! stack.

use std::mem;
use std::ptr;

/// A word-sized read of the target's memory.
pub trait ReadWord {
    /// `None` means the address was refused or unreadable; the walk stops
    /// there.
    fn read_word(&self, addr: usize) -> Option<usize>;
}

/// Reads from the faulted process's own address space.
///
/// Null and misaligned addresses are refused outright. Anything else is a
/// volatile load; if a corrupted chain points into an unmapped page the
/// resulting nested fault hits the handler's one-shot disposition and the
/// process dies immediately instead of looping.
pub struct LiveMemory;

impl ReadWord for LiveMemory {
    fn read_word(&self, addr: usize) -> Option<usize> {
        if addr == 0 || addr % mem::size_of::<usize>() != 0 {
            return None;
        }
        Some(unsafe { ptr::read_volatile(addr as *const usize) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_own_stack() {
        let word: usize = 0xfeed_face;
        let addr = &word as *const usize as usize;
        assert_eq!(LiveMemory.read_word(addr), Some(0xfeed_face));
    }

    #[test]
    fn refuses_null() {
        assert_eq!(LiveMemory.read_word(0), None);
    }

    #[test]
    fn refuses_misaligned() {
        let word: usize = 0;
        let addr = &word as *const usize as usize;
        assert_eq!(LiveMemory.read_word(addr + 1), None);
    }
}
