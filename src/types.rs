/// Architecture tag for a captured register set. Selected once per target
/// at snapshot time; everything downstream matches on this instead of
/// sprinkling `cfg` branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    X86_64,
    X86,
    Aarch64,
    /// Register layout unknown. The report carries the header only.
    Other,
}

/// Signal metadata captured from `siginfo_t` at delivery.
#[derive(Debug, Clone, Copy)]
pub struct FaultInfo {
    pub signo: i32,
    pub errno: i32,
    pub code: i32,
    /// Address the faulting access touched.
    pub addr: usize,
}

/// One step of the walk: the instruction pointer being reported and the
/// frame pointer used to continue to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub ip: usize,
    pub bp: usize,
}

/// What the dynamic loader knows about an instruction pointer.
///
/// If `name` is present then `start` is present and lies at or below the
/// queried address; the resolver demotes anything else to "no symbol".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolInfo {
    /// Path of the loaded object containing the address.
    pub module: String,
    pub name: Option<String>,
    pub start: Option<usize>,
}

impl SymbolInfo {
    /// Byte offset of `ip` from the symbol start, zero when no start is
    /// known.
    pub fn offset_from(&self, ip: usize) -> usize {
        self.start.map_or(0, |start| ip.saturating_sub(start))
    }
}

/// A fully annotated frame, the unit the report prints.
#[derive(Debug, Clone)]
pub struct ResolvedFrame {
    pub frame: Frame,
    pub symbol: SymbolInfo,
    /// Demangled name, the raw name if demangling did not apply, or `??`
    /// when the resolver found no symbol at all.
    pub display_name: String,
    /// Output of the line-lookup helper, absent when the helper is
    /// unavailable or produced nothing.
    pub line_info: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::SymbolInfo;

    #[test]
    fn offset_against_symbol_start() {
        let sym = SymbolInfo {
            module: "/usr/lib/libc.so.6".to_string(),
            name: Some("getpid".to_string()),
            start: Some(0x1000),
        };
        assert_eq!(sym.offset_from(0x1035), 0x35);
    }

    #[test]
    fn offset_without_symbol_is_zero() {
        let sym = SymbolInfo {
            module: "/usr/lib/libc.so.6".to_string(),
            name: None,
            start: None,
        };
        assert_eq!(sym.offset_from(0x1035), 0);
    }
}
