//! The per-architecture operations `lowstub` is driven through.
//!
//! Every supported architecture implements [`LowTarget`] exactly once (see the
//! `lowstub_arch` crate). The host agent registers the implementations it
//! wants to support in a [`Registry`] at startup, then picks one per process at
//! attach time, typically based on the ELF machine of the inferior.
//!
//! `LowTarget` is object safe, and implementations are expected to be
//! stateless: all per-process state lives in the
//! [`TargetDescription`](crate::tdesc::TargetDescription) returned by
//! [`LowTarget::arch_setup`] and in the [`Process`] record built around it.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use core::fmt::{self, Display};

use crate::common::{Addr, Tid};
use crate::process::Process;
use crate::regcache::RegCache;
use crate::regset::RegsetInfo;
use crate::target::{RegsetIo, TargetMemory};
use crate::tdesc::TargetDescription;
use crate::Error;

/// Identifies an architecture in a [`Registry`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArchId(pub &'static str);

impl Display for ArchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Architecture-specific operations on a stopped process.
pub trait LowTarget {
    /// The architecture this target implements.
    fn arch_id(&self) -> ArchId;

    /// Called once per newly attached process: probe the optional register
    /// extensions of thread `tid` and build the process's target description.
    ///
    /// Must not modify any register of the process.
    fn arch_setup(&self, io: &mut dyn RegsetIo, tid: Tid) -> Result<TargetDescription, Error>;

    /// The regset descriptors registers are transferred through.
    fn regsets(&self) -> &'static [RegsetInfo];

    /// Give the target a chance to supply register `regno` without asking the
    /// OS (e.g: registers hard-wired to a constant).
    ///
    /// Returns `true` if the register was supplied.
    fn fetch_register(&self, cache: &mut RegCache, regno: usize) -> bool {
        let _ = (cache, regno);
        false
    }

    /// Called when register `regno` could not be fetched through any regset.
    ///
    /// Return `true` to mark the register unavailable and carry on.
    fn cannot_fetch_register(&self, regno: usize) -> bool;

    /// Called when register `regno` could not be stored through any regset.
    ///
    /// Return `true` to silently skip the register.
    fn cannot_store_register(&self, regno: usize) -> bool;

    /// Whether the target supports software breakpoints.
    fn supports_breakpoints(&self) -> bool {
        false
    }

    /// Read the program counter.
    fn get_pc(&self, cache: &RegCache) -> Addr;

    /// Write the program counter.
    fn set_pc(&self, cache: &mut RegCache, pc: Addr);

    /// Decide which breakpoint kind should be inserted at `pc`.
    fn breakpoint_kind_from_pc(&self, mem: &mut dyn TargetMemory, pc: Addr) -> Result<usize, Error>;

    /// The instruction bytes implementing a software breakpoint of `kind`.
    ///
    /// The length of the returned slice is the size of the breakpoint.
    fn sw_breakpoint_from_kind(&self, kind: usize) -> &'static [u8];

    /// Whether a software breakpoint instruction is present at `pc`.
    ///
    /// Unreadable memory is reported as `false`.
    fn breakpoint_at(&self, mem: &mut dyn TargetMemory, pc: Addr) -> bool;
}

impl fmt::Debug for dyn LowTarget + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LowTarget({})", self.arch_id())
    }
}

/// The set of [`LowTarget`]s a host agent supports, keyed by [`ArchId`].
#[derive(Default)]
pub struct Registry {
    targets: BTreeMap<ArchId, Box<dyn LowTarget>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Registry {
        Registry::default()
    }

    /// Register `target` under its own [`ArchId`], returning the target it
    /// replaced, if any.
    pub fn register(&mut self, target: Box<dyn LowTarget>) -> Option<Box<dyn LowTarget>> {
        let id = target.arch_id();
        debug!("registering low target `{}`", id);
        self.targets.insert(id, target)
    }

    /// Look up the target registered for `id`.
    pub fn get(&self, id: ArchId) -> Option<&dyn LowTarget> {
        self.targets.get(&id).map(|t| t.as_ref())
    }

    /// Identifiers of every registered target.
    pub fn arch_ids(&self) -> impl Iterator<Item = ArchId> + '_ {
        self.targets.keys().copied()
    }

    /// Attach to thread `tid` of a new process running architecture `id`.
    pub fn attach(
        &self,
        id: ArchId,
        io: &mut dyn RegsetIo,
        tid: Tid,
    ) -> Result<Process<'_>, Error> {
        let low = self.get(id).ok_or(Error::UnknownArch(id))?;
        Process::attach(low, io, tid)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.targets.keys()).finish()
    }
}
