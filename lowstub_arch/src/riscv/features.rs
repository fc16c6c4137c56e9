//! Detection of the optional register extensions of a live process.

use lowstub::common::Tid;
use lowstub::regset::NoteType;
use lowstub::target::{HostError, RegsetIo};
use lowstub::Error;

use super::regs::{FP_D_SIZE, FP_F_SIZE, FP_Q_SIZE, MAX_REGSET_SIZE};

/// Width of the general purpose registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Xlen {
    /// 32-bit registers.
    Rv32,
    /// 64-bit registers.
    Rv64,
}

impl Xlen {
    /// Register size, in bytes.
    pub fn bytes(self) -> usize {
        match self {
            Xlen::Rv32 => 4,
            Xlen::Rv64 => 8,
        }
    }

    /// The matching GDB architecture name.
    pub fn arch_name(self) -> &'static str {
        match self {
            Xlen::Rv32 => "riscv:rv32",
            Xlen::Rv64 => "riscv:rv64",
        }
    }
}

/// Width of the floating point registers, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flen {
    /// No floating point registers.
    None,
    /// Single precision (F extension).
    F32,
    /// Double precision (D extension).
    F64,
    /// Quad precision (Q extension).
    F128,
}

impl Flen {
    /// Register size in bytes. `0` for [`Flen::None`].
    pub fn bytes(self) -> usize {
        match self {
            Flen::None => 0,
            Flen::F32 => 4,
            Flen::F64 => 8,
            Flen::F128 => 16,
        }
    }
}

/// The register extensions a process exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Features {
    /// General purpose register width.
    pub xlen: Xlen,
    /// Floating point register width.
    pub flen: Flen,
    /// Whether general purpose registers are CHERI capabilities.
    pub capabilities: bool,
}

impl Features {
    /// Size of a capability register in bytes, if capabilities are present.
    pub fn clen(&self) -> Option<usize> {
        if self.capabilities {
            Some(2 * self.xlen.bytes())
        } else {
            None
        }
    }
}

/// Probe the register extensions of stopped thread `tid`, based on the
/// regset sizes the kernel reports.
///
/// Nothing is written to the thread.
pub fn probe(io: &mut dyn RegsetIo, tid: Tid) -> Result<Features, Error> {
    let mut buf = [0; MAX_REGSET_SIZE];

    let note = NoteType::PRSTATUS;
    let size = io
        .get_regset(tid, note, &mut buf)
        .map_err(|source| Error::Regset { note, source })?;
    let (xlen, capabilities) = match size {
        128 => (Xlen::Rv32, false),
        256 => (Xlen::Rv64, false),
        264 => (Xlen::Rv32, true),
        528 => (Xlen::Rv64, true),
        size => return Err(Error::UnexpectedRegsetSize { note, size }),
    };

    let note = NoteType::FPREGSET;
    let flen = match io.get_regset(tid, note, &mut buf) {
        Ok(FP_F_SIZE) => Flen::F32,
        Ok(FP_D_SIZE) => Flen::F64,
        Ok(FP_Q_SIZE) => Flen::F128,
        Ok(size) => return Err(Error::UnexpectedRegsetSize { note, size }),
        Err(HostError::Unsupported) => Flen::None,
        Err(source) => return Err(Error::Regset { note, source }),
    };

    let features = Features {
        xlen,
        flen,
        capabilities,
    };
    debug!("thread {}: probed {:?}", tid, features);
    Ok(features)
}

#[cfg(test)]
mod tests {
    use super::super::fake::{tid, FakeInferior};
    use super::*;
    use alloc::vec;

    #[test]
    fn probe_size_table() {
        let cases = [
            (FakeInferior::rv32(Flen::None, false), Xlen::Rv32, Flen::None, false),
            (FakeInferior::rv64(Flen::F64, false), Xlen::Rv64, Flen::F64, false),
            (FakeInferior::rv32(Flen::F32, true), Xlen::Rv32, Flen::F32, true),
            (FakeInferior::rv64(Flen::F128, true), Xlen::Rv64, Flen::F128, true),
        ];

        for (mut inferior, xlen, flen, capabilities) in cases.iter().cloned() {
            let features = probe(&mut inferior, tid()).unwrap();
            assert_eq!(
                features,
                Features {
                    xlen,
                    flen,
                    capabilities
                }
            );
            assert!(inferior.writes.is_empty());
        }
    }

    #[test]
    fn capability_size() {
        let features = probe(&mut FakeInferior::rv64(Flen::None, true), tid()).unwrap();
        assert_eq!(features.clen(), Some(16));
        let features = probe(&mut FakeInferior::rv32(Flen::None, false), tid()).unwrap();
        assert_eq!(features.clen(), None);
    }

    #[test]
    fn unknown_gpr_size() {
        let mut inferior = FakeInferior::rv64(Flen::None, false);
        inferior.gregs = vec![0; 200];
        assert_eq!(
            probe(&mut inferior, tid()),
            Err(Error::UnexpectedRegsetSize {
                note: NoteType::PRSTATUS,
                size: 200
            })
        );
    }

    #[test]
    fn fp_host_failure() {
        let mut inferior = FakeInferior::rv64(Flen::F64, false);
        inferior.fp_error = Some(HostError::Errno(3));
        assert_eq!(
            probe(&mut inferior, tid()),
            Err(Error::Regset {
                note: NoteType::FPREGSET,
                source: HostError::Errno(3)
            })
        );
    }
}
