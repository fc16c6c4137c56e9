//! An in-memory stand-in for a stopped RISC-V Linux thread.

use alloc::vec::Vec;
use core::num::NonZeroUsize;

use lowstub::common::{Addr, Tid};
use lowstub::regset::NoteType;
use lowstub::target::{HostError, RegsetIo, TargetMemory};

use super::regs::{FP_D_SIZE, FP_F_SIZE, FP_Q_SIZE};
use super::Flen;

pub fn tid() -> Tid {
    NonZeroUsize::new(1234).unwrap()
}

fn pattern(len: usize, seed: u8) -> Vec<u8> {
    (0..len).map(|i| (i as u8).wrapping_mul(7).wrapping_add(seed)).collect()
}

#[derive(Debug, Clone)]
pub struct FakeInferior {
    pub gregs: Vec<u8>,
    pub fpregs: Option<Vec<u8>>,
    pub fp_error: Option<HostError>,
    pub mem_base: Addr,
    pub mem: Vec<u8>,
    pub writes: Vec<(NoteType, Vec<u8>)>,
}

impl FakeInferior {
    fn new(gpr_size: usize, flen: Flen) -> FakeInferior {
        let fpregs = match flen {
            Flen::None => None,
            Flen::F32 => Some(pattern(FP_F_SIZE, 0x40)),
            Flen::F64 => Some(pattern(FP_D_SIZE, 0x40)),
            Flen::F128 => Some(pattern(FP_Q_SIZE, 0x40)),
        };
        FakeInferior {
            gregs: pattern(gpr_size, 1),
            fpregs,
            fp_error: None,
            mem_base: 0x1_0000,
            mem: vec![0; 64],
            writes: Vec::new(),
        }
    }

    pub fn rv32(flen: Flen, capabilities: bool) -> FakeInferior {
        FakeInferior::new(if capabilities { 33 * 8 } else { 32 * 4 }, flen)
    }

    pub fn rv64(flen: Flen, capabilities: bool) -> FakeInferior {
        FakeInferior::new(if capabilities { 33 * 16 } else { 32 * 8 }, flen)
    }

    fn mem_range(&self, addr: Addr, len: usize) -> Result<core::ops::Range<usize>, HostError> {
        let start = addr.checked_sub(self.mem_base).ok_or(HostError::Fault)? as usize;
        let end = start.checked_add(len).ok_or(HostError::Fault)?;
        if end > self.mem.len() {
            return Err(HostError::Fault);
        }
        Ok(start..end)
    }
}

impl RegsetIo for FakeInferior {
    fn get_regset(
        &mut self,
        _tid: Tid,
        note: NoteType,
        buf: &mut [u8],
    ) -> Result<usize, HostError> {
        let src = match note {
            NoteType::PRSTATUS => &self.gregs,
            NoteType::FPREGSET => {
                if let Some(e) = self.fp_error {
                    return Err(e);
                }
                self.fpregs.as_ref().ok_or(HostError::Unsupported)?
            }
            _ => return Err(HostError::Unsupported),
        };
        let n = src.len().min(buf.len());
        buf[..n].copy_from_slice(&src[..n]);
        Ok(n)
    }

    fn set_regset(&mut self, _tid: Tid, note: NoteType, buf: &[u8]) -> Result<(), HostError> {
        self.writes.push((note, buf.to_vec()));
        let dst = match note {
            NoteType::PRSTATUS => &mut self.gregs,
            NoteType::FPREGSET => self.fpregs.as_mut().ok_or(HostError::Unsupported)?,
            _ => return Err(HostError::Unsupported),
        };
        let n = dst.len().min(buf.len());
        dst[..n].copy_from_slice(&buf[..n]);
        Ok(())
    }
}

impl TargetMemory for FakeInferior {
    fn read_memory(&mut self, addr: Addr, buf: &mut [u8]) -> Result<(), HostError> {
        let range = self.mem_range(addr, buf.len())?;
        buf.copy_from_slice(&self.mem[range]);
        Ok(())
    }

    fn write_memory(&mut self, addr: Addr, data: &[u8]) -> Result<(), HostError> {
        let range = self.mem_range(addr, data.len())?;
        self.mem[range].copy_from_slice(data);
        Ok(())
    }
}
