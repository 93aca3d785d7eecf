use std::os::raw::c_void;

use super::RegisterSnapshot;
use crate::types::Arch;

/// No register layout is known for this target. The snapshot is empty and
/// carries null ip/bp, so the report prints its header and stops before the
/// walk.
///
/// # Safety
///
/// Trivially safe; `ctx` is not dereferenced.
pub unsafe fn capture(_ctx: *const c_void) -> RegisterSnapshot {
    RegisterSnapshot::new(Arch::Other, &[], 0, 0)
}
