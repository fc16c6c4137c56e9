//! Interfaces `lowstub` consumes from the host debugging agent.
//!
//! The host owns the actual process-control plumbing (e.g: `ptrace` on Linux).
//! `lowstub` only ever touches a stopped process through these two narrow
//! traits, which keeps every architecture implementation testable against an
//! in-memory fake.
//!
//! Both traits are object safe: architecture code receives them as
//! `&mut dyn TargetMemory` / `&mut dyn RegsetIo`.

use core::fmt::{self, Display};

use crate::common::{Addr, Tid};
use crate::regset::NoteType;

/// An errno-style failure reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostError {
    /// The process does not expose the requested regset, or rejected the
    /// requested transfer size (`EINVAL` / `ENODATA` from `PTRACE_GETREGSET`).
    Unsupported,
    /// The requested memory is not mapped / not accessible (`EFAULT`, `EIO`).
    Fault,
    /// Any other host error, as a raw errno value.
    Errno(i32),
}

impl Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostError::Unsupported => write!(f, "operation not supported by the process"),
            HostError::Fault => write!(f, "bad address"),
            HostError::Errno(e) => write!(f, "errno {}", e),
        }
    }
}

/// Read/write access to the memory of a stopped process.
pub trait TargetMemory {
    /// Fill `buf` with the bytes starting at `addr`.
    ///
    /// Partial reads must be reported as errors.
    fn read_memory(&mut self, addr: Addr, buf: &mut [u8]) -> Result<(), HostError>;

    /// Write `data` starting at `addr`.
    fn write_memory(&mut self, addr: Addr, data: &[u8]) -> Result<(), HostError>;
}

/// Transfer of whole OS regsets for a stopped thread.
///
/// Semantics follow `PTRACE_GETREGSET` / `PTRACE_SETREGSET`.
pub trait RegsetIo {
    /// Fetch the regset identified by `note` into `buf`.
    ///
    /// The host fills at most `buf.len()` bytes and returns the number of bytes
    /// the OS actually reported, which may be smaller than `buf.len()`.
    fn get_regset(&mut self, tid: Tid, note: NoteType, buf: &mut [u8]) -> Result<usize, HostError>;

    /// Write `buf` as the new contents of the regset identified by `note`.
    fn set_regset(&mut self, tid: Tid, note: NoteType, buf: &[u8]) -> Result<(), HostError>;
}
