//! OS regset descriptors, and the per-process logic deciding which of them
//! apply to a live process.

use alloc::vec;
use alloc::vec::Vec;
use core::fmt::{self, Display};

use bitflags::bitflags;

use crate::common::Tid;
use crate::regcache::RegCache;
use crate::target::{HostError, RegsetIo};
use crate::Error;

/// ELF note type identifying an OS regset (the `NT_*` constants).
#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NoteType(pub u32);

#[allow(clippy::upper_case_acronyms)]
#[rustfmt::skip]
impl NoteType {
    #[doc = "General purpose registers"]        pub const PRSTATUS: Self = Self(1);
    #[doc = "Floating point registers"]         pub const FPREGSET: Self = Self(2);
}

impl Display for NoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            NoteType::PRSTATUS => write!(f, "NT_PRSTATUS"),
            NoteType::FPREGSET => write!(f, "NT_FPREGSET"),
            NoteType(n) => write!(f, "NT_{:#x}", n),
        }
    }
}

/// How a regset's declared size is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegsetKind {
    /// Always present. The declared size is an upper bound; the OS may
    /// report fewer bytes.
    General,
    /// May be absent. Several descriptors may share a note type, differing
    /// only in size; the one whose size the OS reports exactly is used and
    /// its siblings are disabled.
    Optional,
}

bitflags! {
    /// Operations a regset supports.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RegsetAccess: u8 {
        /// The regset can be read from the process.
        const FETCH = 1 << 0;
        /// The regset can be written back to the process.
        const STORE = 1 << 1;
        /// Writing the regset back preserves capability validity tags.
        ///
        /// Regsets without this flag are never stored while the process uses a
        /// capability-extended register layout.
        const TAG_SAFE = 1 << 2;
    }
}

/// Copies register values from a cache into a regset buffer.
pub type CollectFn = fn(&RegCache, &mut [u8]);

/// Copies register values from a regset buffer into a cache.
pub type SupplyFn = fn(&mut RegCache, &[u8]);

/// Describes one OS-level register transfer unit.
#[derive(Clone, Copy)]
pub struct RegsetInfo {
    /// Note type identifying the regset to the OS.
    pub note: NoteType,
    /// Declared size in bytes (see [`RegsetKind`]).
    pub size: usize,
    /// How `size` is interpreted.
    pub kind: RegsetKind,
    /// Supported operations.
    pub access: RegsetAccess,
    /// Cache -> buffer.
    pub collect: CollectFn,
    /// Buffer -> cache.
    pub supply: SupplyFn,
}

impl fmt::Debug for RegsetInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegsetInfo")
            .field("note", &self.note)
            .field("size", &self.size)
            .field("kind", &self.kind)
            .field("access", &self.access)
            .finish()
    }
}

impl RegsetInfo {
    fn accepts(&self, reported: usize) -> bool {
        match self.kind {
            RegsetKind::General => reported > 0 && reported <= self.size,
            RegsetKind::Optional => reported == self.size,
        }
    }
}

/// Per-process view of an architecture's regset descriptors.
///
/// Descriptors the process turns out not to support (the OS rejects them, or
/// reports a size that doesn't fit) are disabled for the rest of the
/// process's lifetime. Among optional descriptors sharing a note type, at most
/// one is ever selected.
#[derive(Debug, Clone)]
pub struct RegsetTable {
    infos: &'static [RegsetInfo],
    disabled: Vec<bool>,
    selected: Vec<bool>,
}

impl RegsetTable {
    /// Create a table with every descriptor enabled.
    pub fn new(infos: &'static [RegsetInfo]) -> RegsetTable {
        RegsetTable {
            infos,
            disabled: vec![false; infos.len()],
            selected: vec![false; infos.len()],
        }
    }

    /// All descriptors, enabled or not.
    pub fn infos(&self) -> &'static [RegsetInfo] {
        self.infos
    }

    /// Whether descriptor `idx` is still a candidate for this process.
    pub fn is_enabled(&self, idx: usize) -> bool {
        !self.disabled[idx]
    }

    /// The descriptor selected for `note`, once a fetch has succeeded.
    pub fn selected(&self, note: NoteType) -> Option<&'static RegsetInfo> {
        self.infos
            .iter()
            .zip(&self.selected)
            .find(|(info, selected)| info.note == note && **selected)
            .map(|(info, _)| info)
    }

    fn disable(&mut self, idx: usize, why: &str) {
        let info = &self.infos[idx];
        debug!("disabling regset {} ({} bytes): {}", info.note, info.size, why);
        self.disabled[idx] = true;
    }

    fn select(&mut self, idx: usize) {
        if self.selected[idx] {
            return;
        }
        let infos = self.infos;
        let info = infos[idx];
        debug!("selected regset {} ({} bytes)", info.note, info.size);
        self.selected[idx] = true;
        if info.kind == RegsetKind::Optional {
            for (i, other) in infos.iter().enumerate() {
                if i != idx && other.note == info.note && !self.disabled[i] {
                    self.disable(i, "sibling regset selected");
                }
            }
        }
    }

    /// Read descriptor `idx` from the process.
    ///
    /// Returns `Ok(None)` (and disables the descriptor) if the process doesn't
    /// support it.
    fn read(
        &mut self,
        idx: usize,
        io: &mut dyn RegsetIo,
        tid: Tid,
    ) -> Result<Option<Vec<u8>>, Error> {
        let info = self.infos[idx];
        let mut buf = vec![0; info.size];
        match io.get_regset(tid, info.note, &mut buf) {
            Ok(n) if info.accepts(n) => {
                trace!("<-- {} ({} bytes)", info.note, n);
                buf.truncate(n);
                #[cfg(feature = "trace-regs")]
                trace!("<-- {} {:02x?}", info.note, buf);
                self.select(idx);
                Ok(Some(buf))
            }
            Ok(n) => {
                self.disable(idx, "size mismatch");
                trace!("{} reported {} bytes, expected {}", info.note, n, info.size);
                Ok(None)
            }
            Err(HostError::Unsupported) => {
                self.disable(idx, "not supported by the process");
                Ok(None)
            }
            Err(source) => Err(Error::Regset {
                note: info.note,
                source,
            }),
        }
    }

    /// Fill `cache` from every enabled regset.
    pub fn fetch(
        &mut self,
        io: &mut dyn RegsetIo,
        tid: Tid,
        cache: &mut RegCache,
    ) -> Result<(), Error> {
        for idx in 0..self.infos.len() {
            let info = self.infos[idx];
            if self.disabled[idx] || !info.access.contains(RegsetAccess::FETCH) {
                continue;
            }

            if let Some(buf) = self.read(idx, io, tid)? {
                (info.supply)(cache, &buf);
            }
        }
        Ok(())
    }

    /// Write `cache` back through every enabled, storable regset.
    ///
    /// Each regset is read first and the cache collected over its current
    /// contents, so bytes the cache doesn't describe are preserved.
    ///
    /// While the process uses a capability-extended register layout, regsets
    /// without [`RegsetAccess::TAG_SAFE`] are left untouched and counted in
    /// [`StoreSummary::refused`]. The remaining regsets are still written.
    pub fn store(
        &mut self,
        io: &mut dyn RegsetIo,
        tid: Tid,
        cache: &RegCache,
    ) -> Result<StoreSummary, Error> {
        let capabilities = cache.tdesc().has_capabilities();

        let mut summary = StoreSummary::default();
        for idx in 0..self.infos.len() {
            let info = self.infos[idx];
            if self.disabled[idx] || !info.access.contains(RegsetAccess::STORE) {
                continue;
            }

            if capabilities && !info.access.contains(RegsetAccess::TAG_SAFE) {
                debug!(
                    "not storing regset {}: would clear capability validity tags",
                    info.note
                );
                summary.refused += 1;
                continue;
            }

            let mut buf = match self.read(idx, io, tid)? {
                Some(buf) => buf,
                None => continue,
            };
            (info.collect)(cache, &mut buf);

            trace!("--> {} ({} bytes)", info.note, buf.len());
            #[cfg(feature = "trace-regs")]
            trace!("--> {} {:02x?}", info.note, buf);
            io.set_regset(tid, info.note, &buf)
                .map_err(|source| Error::Regset {
                    note: info.note,
                    source,
                })?;
            summary.written += 1;
        }
        Ok(summary)
    }
}

/// Outcome of [`RegsetTable::store`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreSummary {
    /// Regsets written back to the process.
    pub written: usize,
    /// Regsets skipped because writing them would clear capability validity
    /// tags.
    pub refused: usize,
}
