//! Implementations of [`lowstub::arch::LowTarget`] for various architectures.
//!
//! Each architecture lives in its own module, and exposes a single unit
//! struct implementing `LowTarget`. Host agents typically don't name these
//! directly, and instead start from the [`registry`] of every bundled target:
//!
//! ```
//! let registry = lowstub_arch::registry();
//! assert!(registry.get(lowstub_arch::riscv::RiscvLinux::ARCH_ID).is_some());
//! ```
//!
//! Only the Linux flavour of each architecture is provided, i.e: regsets are
//! laid out the way the Linux kernel exposes them through
//! `PTRACE_GETREGSET` / `PTRACE_SETREGSET`.

#![cfg_attr(not(test), no_std)]
#![deny(missing_docs)]

extern crate alloc;

#[macro_use]
extern crate log;

use alloc::boxed::Box;

use lowstub::arch::Registry;

pub mod riscv;

/// Build a [`Registry`] holding every low target this crate provides.
pub fn registry() -> Registry {
    let mut registry = Registry::new();
    registry.register(Box::new(riscv::RiscvLinux));
    registry
}
