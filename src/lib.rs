//! Architecture-facing building blocks for the low layer of a remote debugging
//! agent.
//!
//! A debugging agent attached to a stopped process has to move register state
//! between two very different representations: the agent's own register cache,
//! addressed by logical register number, and the fixed-layout register blocks
//! ("regsets") exchanged with the operating system's process-control facility.
//! It also has to know how software breakpoints are encoded on the target.
//!
//! `lowstub` provides the generic, architecture-agnostic half of that job:
//!
//! - [`tdesc::TargetDescription`]: the ordered register layout of a process,
//!   plus the layout metadata marshalling code needs.
//! - [`regcache::RegCache`]: a per-thread register cache.
//! - [`regset::RegsetInfo`] / [`regset::RegsetTable`]: OS regset descriptors
//!   and the per-process logic that decides which of them apply.
//! - [`arch::LowTarget`]: the set of operations each architecture implements,
//!   and [`arch::Registry`] to select one at attach time.
//! - [`process::Process`]: the per-process record tying it all together.
//!
//! Architecture implementations live in the companion `lowstub_arch` crate.
//!
//! ## Features
//!
//! - `std`:
//!   - Implements `std::error::Error` for [`Error`]
//! - `trace-regs`:
//!   - Dumps every regset buffer sent to / received from the host via
//!     `trace!`

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(missing_docs)]

extern crate alloc;

#[macro_use]
extern crate log;

mod error;

pub mod arch;
pub mod common;
pub mod internal;
pub mod process;
pub mod regcache;
pub mod regset;
pub mod target;
pub mod tdesc;

pub use error::Error;
