//! Frame-pointer stack walking, innermost frame first.

use std::mem;

use crate::memory::ReadWord;
use crate::resolve::Resolve;
use crate::types::{Frame, SymbolInfo};

/// Upper bound on emitted frames. A chain that has been stomped into a loop
/// would otherwise walk forever; past this depth it is not telling us
/// anything new anyway.
pub const MAX_FRAMES: usize = 128;

/// Walks the saved-frame-pointer chain from a fault context.
///
/// Every step has to clear two hurdles before the walk continues: the
/// instruction pointer must resolve to a loaded module, and the saved
/// return address and frame pointer at `bp` must be readable, non-null and
/// strictly above the current frame. Failing either ends the walk. The
/// frame whose symbol matches the entry symbol is emitted and then the walk
/// stops, so runtime startup frames never appear.
pub struct StackWalker<'a, R, M> {
    resolver: &'a R,
    memory: &'a M,
    entry_symbol: &'a str,
    ip: usize,
    bp: usize,
    emitted: usize,
    done: bool,
}

impl<'a, R: Resolve, M: ReadWord> StackWalker<'a, R, M> {
    pub fn new(
        resolver: &'a R,
        memory: &'a M,
        entry_symbol: &'a str,
        ip: usize,
        bp: usize,
    ) -> StackWalker<'a, R, M> {
        // A null ip or bp means the chain was never valid to begin with.
        let done = ip == 0 || bp == 0;
        StackWalker {
            resolver,
            memory,
            entry_symbol,
            ip,
            bp,
            emitted: 0,
            done,
        }
    }

    /// Loads the conventional saved slots: the caller's frame pointer at
    /// `bp`, the return address one word above it.
    fn advance(&mut self) {
        let word = mem::size_of::<usize>();
        let ret_slot = match self.bp.checked_add(word) {
            Some(addr) => addr,
            None => {
                self.done = true;
                return;
            }
        };
        let ret = self.memory.read_word(ret_slot);
        let saved_bp = self.memory.read_word(self.bp);
        match (ret, saved_bp) {
            // The chain must ascend; a repeated or descending frame pointer
            // is a loop, not a caller.
            (Some(ret), Some(saved_bp)) if ret != 0 && saved_bp > self.bp => {
                self.ip = ret;
                self.bp = saved_bp;
            }
            _ => self.done = true,
        }
    }
}

impl<'a, R: Resolve, M: ReadWord> Iterator for StackWalker<'a, R, M> {
    type Item = (Frame, SymbolInfo);

    fn next(&mut self) -> Option<(Frame, SymbolInfo)> {
        if self.done || self.emitted >= MAX_FRAMES {
            return None;
        }
        let symbol = match self.resolver.resolve(self.ip) {
            Some(symbol) => symbol,
            None => {
                self.done = true;
                return None;
            }
        };
        let frame = Frame {
            ip: self.ip,
            bp: self.bp,
        };
        self.emitted += 1;
        if symbol.name.as_deref() == Some(self.entry_symbol) {
            self.done = true;
        } else {
            self.advance();
        }
        Some((frame, symbol))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    const WORD: usize = mem::size_of::<usize>();

    /// Synthetic stack memory: a sparse map of address to word.
    struct SparseStack(HashMap<usize, usize>);

    impl ReadWord for SparseStack {
        fn read_word(&self, addr: usize) -> Option<usize> {
            self.0.get(&addr).copied()
        }
    }

    /// Resolver backed by a fixed ip-to-name table.
    struct TableResolver(HashMap<usize, &'static str>);

    impl Resolve for TableResolver {
        fn resolve(&self, ip: usize) -> Option<SymbolInfo> {
            self.0.get(&ip).map(|name| SymbolInfo {
                module: "/proc/self/exe".to_string(),
                name: Some(name.to_string()),
                start: Some(ip - 0x10),
            })
        }
    }

    /// Builds a frame chain of the given symbols, innermost first, with the
    /// innermost frame at `base`. Returns the walker inputs and the fakes.
    fn chain(symbols: &[&'static str], base: usize) -> (usize, usize, TableResolver, SparseStack) {
        let mut memory = HashMap::new();
        let mut table = HashMap::new();
        let first_ip = 0x40_0000;
        for (i, name) in symbols.iter().enumerate() {
            let ip = first_ip + i * 0x100;
            table.insert(ip, *name);
            let bp = base + i * 4 * WORD;
            let caller_bp = bp + 4 * WORD;
            memory.insert(bp, caller_bp);
            memory.insert(bp + WORD, first_ip + (i + 1) * 0x100);
        }
        (first_ip, base, TableResolver(table), SparseStack(memory))
    }

    #[test]
    fn walks_chain_to_entry_symbol() {
        let (ip, bp, resolver, memory) = chain(&["a", "b", "main"], 0x7000);
        let names: Vec<String> = StackWalker::new(&resolver, &memory, "main", ip, bp)
            .map(|(_, sym)| sym.name.unwrap())
            .collect();
        assert_eq!(names, ["a", "b", "main"]);
    }

    #[test]
    fn depth_n_chain_yields_n_frames() {
        let symbols = ["f0", "f1", "f2", "f3", "f4", "main"];
        let (ip, bp, resolver, memory) = chain(&symbols, 0x7000);
        let frames: Vec<_> = StackWalker::new(&resolver, &memory, "main", ip, bp).collect();
        assert_eq!(frames.len(), symbols.len());
        // Innermost first.
        assert_eq!(frames[0].0.ip, ip);
    }

    #[test]
    fn unresolvable_ip_ends_walk_without_a_frame() {
        let (_, bp, resolver, memory) = chain(&["a", "main"], 0x7000);
        let frames: Vec<_> = StackWalker::new(&resolver, &memory, "main", 0xdead_0000, bp).collect();
        assert!(frames.is_empty());
    }

    #[test]
    fn unresolvable_caller_stops_after_inner_frames() {
        let (ip, bp, resolver, mut memory) = chain(&["a", "b", "main"], 0x7000);
        // Point b's return address somewhere no module covers.
        memory.0.insert(0x7000 + 4 * WORD + WORD, 0xdead_0000);
        let names: Vec<String> = StackWalker::new(&resolver, &memory, "main", ip, bp)
            .map(|(_, sym)| sym.name.unwrap())
            .collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn null_ip_or_bp_yields_nothing() {
        let (ip, bp, resolver, memory) = chain(&["a", "main"], 0x7000);
        assert_eq!(StackWalker::new(&resolver, &memory, "main", 0, bp).count(), 0);
        assert_eq!(StackWalker::new(&resolver, &memory, "main", ip, 0).count(), 0);
    }

    #[test]
    fn unreadable_saved_slot_ends_walk() {
        let (ip, bp, resolver, mut memory) = chain(&["a", "b", "main"], 0x7000);
        memory.0.remove(&(0x7000 + 4 * WORD));
        let names: Vec<String> = StackWalker::new(&resolver, &memory, "main", ip, bp)
            .map(|(_, sym)| sym.name.unwrap())
            .collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn looping_chain_ends_walk() {
        let (ip, bp, resolver, mut memory) = chain(&["a", "b", "main"], 0x7000);
        // b's saved frame pointer points back at the innermost frame.
        memory.0.insert(0x7000 + 4 * WORD, 0x7000);
        let names: Vec<String> = StackWalker::new(&resolver, &memory, "main", ip, bp)
            .map(|(_, sym)| sym.name.unwrap())
            .collect();
        assert_eq!(names, ["a", "b"]);
    }

    /// A chain that always produces a plausible next frame.
    struct EndlessStack;

    impl ReadWord for EndlessStack {
        fn read_word(&self, addr: usize) -> Option<usize> {
            Some(addr + 0x100)
        }
    }

    struct AlwaysResolves;

    impl Resolve for AlwaysResolves {
        fn resolve(&self, _ip: usize) -> Option<SymbolInfo> {
            Some(SymbolInfo {
                module: "/proc/self/exe".to_string(),
                name: None,
                start: None,
            })
        }
    }

    #[test]
    fn frame_cap_bounds_an_endless_chain() {
        let count = StackWalker::new(&AlwaysResolves, &EndlessStack, "main", 0x40_0000, 0x7000)
            .count();
        assert_eq!(count, MAX_FRAMES);
    }
}
