//! Implementation for [RISC-V](https://riscv.org/) Linux processes.
//!
//! Supports RV32 and RV64, with or without the F / D / Q floating point
//! extensions, and the CHERI capability extension (read-only: capability
//! registers can't be written back without clearing their validity tags).
//!
//! Useful links:
//! * [GNU binutils-gdb XML descriptions](https://github.com/bminor/binutils-gdb/blob/master/gdb/features/riscv)
//! * [riscv-tdep.h](https://github.com/bminor/binutils-gdb/blob/master/gdb/riscv-tdep.h)
//! * [Linux `ptrace.h`](https://github.com/torvalds/linux/blob/master/arch/riscv/include/uapi/asm/ptrace.h)

use lowstub::arch::{ArchId, LowTarget};
use lowstub::common::{Addr, Tid};
use lowstub::regcache::RegCache;
use lowstub::regset::RegsetInfo;
use lowstub::target::{RegsetIo, TargetMemory};
use lowstub::tdesc::TargetDescription;
use lowstub::Error;

pub mod breakpoint;
pub mod features;
pub mod pc;
pub mod regs;
pub mod tdesc;

#[cfg(test)]
mod fake;

pub use features::{Features, Flen, Xlen};

/// Implements `LowTarget` for RISC-V Linux.
#[derive(Debug, Clone, Copy, Default)]
pub struct RiscvLinux;

impl RiscvLinux {
    /// The [`ArchId`] `RiscvLinux` registers under.
    pub const ARCH_ID: ArchId = ArchId("riscv");
}

impl LowTarget for RiscvLinux {
    fn arch_id(&self) -> ArchId {
        Self::ARCH_ID
    }

    fn arch_setup(&self, io: &mut dyn RegsetIo, tid: Tid) -> Result<TargetDescription, Error> {
        let features = features::probe(io, tid)?;
        Ok(tdesc::build(&features))
    }

    fn regsets(&self) -> &'static [RegsetInfo] {
        &regs::REGSETS
    }

    fn fetch_register(&self, cache: &mut RegCache, regno: usize) -> bool {
        let name = cache.tdesc().register(regno).name;
        match name {
            "zero" | "cnull" => {
                cache.supply_zeroed(regno);
                true
            }
            _ => false,
        }
    }

    fn cannot_fetch_register(&self, regno: usize) -> bool {
        unreachable!("riscv: no regset provides register {}", regno)
    }

    fn cannot_store_register(&self, regno: usize) -> bool {
        unreachable!("riscv: no regset can store register {}", regno)
    }

    fn supports_breakpoints(&self) -> bool {
        true
    }

    fn get_pc(&self, cache: &RegCache) -> Addr {
        pc::get_pc(cache)
    }

    fn set_pc(&self, cache: &mut RegCache, pc: Addr) {
        pc::set_pc(cache, pc)
    }

    fn breakpoint_kind_from_pc(
        &self,
        mem: &mut dyn TargetMemory,
        pc: Addr,
    ) -> Result<usize, Error> {
        breakpoint::breakpoint_kind_from_pc(mem, pc)
    }

    fn sw_breakpoint_from_kind(&self, kind: usize) -> &'static [u8] {
        breakpoint::sw_breakpoint_from_kind(kind)
    }

    fn breakpoint_at(&self, mem: &mut dyn TargetMemory, pc: Addr) -> bool {
        breakpoint::breakpoint_at(mem, pc)
    }
}
