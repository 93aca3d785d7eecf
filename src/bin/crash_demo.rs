//! Crashes on purpose through a three-level call chain so the report can be
//! eyeballed: expect frames 1..3 naming `a`, `b` and `main`, and nothing
//! below `main`.
//!
//! Build with frame pointers kept (`-C force-frame-pointers=yes`) for a
//! full chain.

use faultline::{install, Config};

#[inline(never)]
fn a() {
    let p: *const u32 = std::ptr::null();
    let v = unsafe { std::ptr::read_volatile(p) };
    println!("unreachable: {}", v);
}

#[inline(never)]
fn b() {
    a();
}

fn main() {
    let mut config = Config::default();
    if let Ok(exe) = std::env::current_exe() {
        config = config.with_executable(exe);
    }
    install(config);
    b();
}
