//! Symbol-name demangling with pass-through semantics. Nothing in here can
//! fail in a way the fault handler has to care about.

use std::borrow::Cow;

/// Human-readable form of a possibly-mangled symbol name.
///
/// Mangled Rust names come back demangled with the trailing hash stripped.
/// A name the demangler does not recognize passes through unchanged, and a
/// missing name becomes `??`.
pub fn demangle(name: Option<&str>) -> Cow<'_, str> {
    match name {
        None => Cow::Borrowed("??"),
        Some(raw) => match rustc_demangle::try_demangle(raw) {
            Ok(demangled) => Cow::Owned(format!("{:#}", demangled)),
            Err(_) => Cow::Borrowed(raw),
        },
    }
}
