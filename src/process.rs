//! The per-process record a host agent keeps for each attached inferior.

use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;

use crate::arch::LowTarget;
use crate::common::{Addr, Tid};
use crate::regcache::{RegCache, RegStatus};
use crate::regset::RegsetTable;
use crate::target::{RegsetIo, TargetMemory};
use crate::tdesc::TargetDescription;
use crate::Error;

/// A software breakpoint inserted by [`Process::insert_sw_breakpoint`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwBreakpoint {
    /// Address of the breakpoint.
    pub addr: Addr,
    /// Architecture-specific breakpoint kind.
    pub kind: usize,
    saved: Vec<u8>,
}

impl SwBreakpoint {
    /// The instruction bytes the breakpoint replaced.
    pub fn saved(&self) -> &[u8] {
        &self.saved
    }
}

/// Per-process state: the selected [`LowTarget`], the process's target
/// description, and which regsets apply to it.
///
/// The target description is built once, at attach time, and never changes
/// afterwards.
#[derive(Debug)]
pub struct Process<'a> {
    low: &'a dyn LowTarget,
    tdesc: Arc<TargetDescription>,
    regsets: RegsetTable,
}

impl<'a> Process<'a> {
    /// Set up a newly attached process through `low`, using thread `tid` to
    /// probe the process's register extensions.
    pub fn attach(
        low: &'a dyn LowTarget,
        io: &mut dyn RegsetIo,
        tid: Tid,
    ) -> Result<Process<'a>, Error> {
        let tdesc = low.arch_setup(io, tid)?;
        debug!(
            "attached to thread {}: {} with {} registers, expedited {:?}",
            tid,
            tdesc.arch(),
            tdesc.num_registers(),
            tdesc.expedite_regs()
        );

        Ok(Process {
            low,
            tdesc: Arc::new(tdesc),
            regsets: RegsetTable::new(low.regsets()),
        })
    }

    /// The low target driving this process.
    pub fn low(&self) -> &'a dyn LowTarget {
        self.low
    }

    /// The process's target description.
    pub fn tdesc(&self) -> &Arc<TargetDescription> {
        &self.tdesc
    }

    /// The process's regset selection state.
    pub fn regsets(&self) -> &RegsetTable {
        &self.regsets
    }

    /// Names of the registers to report on every stop.
    pub fn expedite_regs(&self) -> &[&'static str] {
        self.tdesc.expedite_regs()
    }

    /// Create an empty register cache for one of the process's threads.
    pub fn new_regcache(&self) -> RegCache {
        RegCache::new(Arc::clone(&self.tdesc))
    }

    fn fill_missing(&self, cache: &mut RegCache, regno: usize) {
        if cache.status(regno) == RegStatus::Valid || self.low.fetch_register(cache, regno) {
            return;
        }
        if self.low.cannot_fetch_register(regno) {
            cache.mark_unavailable(regno);
        }
    }

    /// Fill every register of `cache` from thread `tid`.
    pub fn fetch_registers(
        &mut self,
        io: &mut dyn RegsetIo,
        tid: Tid,
        cache: &mut RegCache,
    ) -> Result<(), Error> {
        self.regsets.fetch(io, tid, cache)?;
        for regno in 0..self.tdesc.num_registers() {
            self.fill_missing(cache, regno);
        }
        Ok(())
    }

    /// Fill register `regno` of `cache` from thread `tid`.
    ///
    /// Registers are transferred a whole regset at a time, so other registers
    /// of `cache` may be refreshed as well.
    pub fn fetch_register(
        &mut self,
        io: &mut dyn RegsetIo,
        tid: Tid,
        cache: &mut RegCache,
        regno: usize,
    ) -> Result<(), Error> {
        if self.low.fetch_register(cache, regno) {
            return Ok(());
        }
        self.regsets.fetch(io, tid, cache)?;
        self.fill_missing(cache, regno);
        Ok(())
    }

    /// Write every register of `cache` back to thread `tid`.
    ///
    /// With capabilities, the general-purpose regset is never written; the
    /// other regsets are, and `Unsupported` is returned afterwards.
    pub fn store_registers(
        &mut self,
        io: &mut dyn RegsetIo,
        tid: Tid,
        cache: &RegCache,
    ) -> Result<(), Error> {
        let summary = self.regsets.store(io, tid, cache)?;
        if summary.refused > 0 {
            return Err(Error::Unsupported(
                "storing capability registers would clear their validity tags",
            ));
        }
        Ok(())
    }

    fn in_gpr_regset(&self, regno: usize) -> bool {
        self.tdesc
            .gpr_layout()
            .map_or(false, |gpr| gpr.offset_of(regno).is_some())
    }

    /// Write register `regno` of `cache` back to thread `tid`.
    pub fn store_register(
        &mut self,
        io: &mut dyn RegsetIo,
        tid: Tid,
        cache: &RegCache,
        regno: usize,
    ) -> Result<(), Error> {
        let summary = self.regsets.store(io, tid, cache)?;
        if summary.refused > 0 && self.in_gpr_regset(regno) {
            return Err(Error::Unsupported(
                "storing capability registers would clear their validity tags",
            ));
        }
        if summary.written == 0
            && summary.refused == 0
            && !self.low.cannot_store_register(regno)
        {
            return Err(Error::Unsupported("no regset can store this register"));
        }
        Ok(())
    }

    /// Read the program counter from `cache`.
    pub fn get_pc(&self, cache: &RegCache) -> Addr {
        self.low.get_pc(cache)
    }

    /// Write the program counter into `cache`.
    pub fn set_pc(&self, cache: &mut RegCache, pc: Addr) {
        self.low.set_pc(cache, pc)
    }

    /// Whether a software breakpoint instruction is present at `addr`.
    pub fn breakpoint_at(&self, mem: &mut dyn TargetMemory, addr: Addr) -> bool {
        self.low.breakpoint_at(mem, addr)
    }

    /// Insert a software breakpoint at `addr`, saving the instruction bytes it
    /// overwrites.
    pub fn insert_sw_breakpoint(
        &self,
        mem: &mut dyn TargetMemory,
        addr: Addr,
    ) -> Result<SwBreakpoint, Error> {
        if !self.low.supports_breakpoints() {
            return Err(Error::Unsupported("software breakpoints"));
        }

        let kind = self.low.breakpoint_kind_from_pc(mem, addr)?;
        let pattern = self.low.sw_breakpoint_from_kind(kind);

        let mut saved = vec![0; pattern.len()];
        mem.read_memory(addr, &mut saved)
            .map_err(|source| Error::MemoryRead { addr, source })?;
        mem.write_memory(addr, pattern)
            .map_err(|source| Error::MemoryWrite { addr, source })?;

        debug!("inserted {}-byte breakpoint at {:#x}", pattern.len(), addr);
        Ok(SwBreakpoint { addr, kind, saved })
    }

    /// Remove a software breakpoint, restoring the original instruction bytes.
    pub fn remove_sw_breakpoint(
        &self,
        mem: &mut dyn TargetMemory,
        bp: &SwBreakpoint,
    ) -> Result<(), Error> {
        mem.write_memory(bp.addr, &bp.saved)
            .map_err(|source| Error::MemoryWrite {
                addr: bp.addr,
                source,
            })?;
        debug!("removed breakpoint at {:#x}", bp.addr);
        Ok(())
    }
}
