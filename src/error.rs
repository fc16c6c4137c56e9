use core::fmt::{self, Display};

use crate::arch::ArchId;
use crate::common::Addr;
use crate::regset::NoteType;
use crate::target::HostError;

/// Errors which may occur while operating on a stopped process.
///
/// Programming errors (e.g: marshalling registers with a target description
/// that doesn't match the process) are _not_ represented here. Those panic.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// Host failed to read target memory.
    MemoryRead {
        /// Start of the failed read.
        addr: Addr,
        /// Underlying host error.
        source: HostError,
    },
    /// Host failed to write target memory.
    MemoryWrite {
        /// Start of the failed write.
        addr: Addr,
        /// Underlying host error.
        source: HostError,
    },
    /// Host failed to transfer a regset.
    Regset {
        /// The regset involved.
        note: NoteType,
        /// Underlying host error.
        source: HostError,
    },
    /// The host reported a regset size that matches no known register layout.
    UnexpectedRegsetSize {
        /// The regset involved.
        note: NoteType,
        /// Size reported by the host, in bytes.
        size: usize,
    },
    /// The operation is known to be unsafe for this process, and was refused.
    Unsupported(&'static str),
    /// No low target is registered for the requested architecture.
    UnknownArch(ArchId),
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use self::Error::*;
        match self {
            MemoryRead { addr, source } => {
                write!(f, "Could not read target memory at {:#x}: {}", addr, source)
            }
            MemoryWrite { addr, source } => {
                write!(f, "Could not write target memory at {:#x}: {}", addr, source)
            }
            Regset { note, source } => write!(f, "Could not transfer regset {}: {}", note, source),
            UnexpectedRegsetSize { note, size } => {
                write!(f, "Regset {} has unexpected size {} bytes", note, size)
            }
            Unsupported(what) => write!(f, "Unsupported operation: {}", what),
            UnknownArch(id) => write!(f, "No low target registered for architecture `{}`", id),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
