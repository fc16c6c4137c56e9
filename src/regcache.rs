//! Per-thread register cache.

use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;

use crate::internal::LeBytes;
use crate::tdesc::TargetDescription;

/// State of a single cached register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegStatus {
    /// Not fetched yet.
    Unknown,
    /// Holds the register's current value.
    Valid,
    /// The register could not be fetched.
    Unavailable,
}

/// Raw register values of one stopped thread, laid out as described by a
/// shared [`TargetDescription`].
///
/// Values are stored as raw bytes in target (little-endian) byte order.
///
/// Operations taking a register number or name panic if the register is not
/// part of the description: addressing a register the process doesn't have is
/// a programming error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegCache {
    tdesc: Arc<TargetDescription>,
    bytes: Vec<u8>,
    status: Vec<RegStatus>,
}

impl RegCache {
    /// Create an empty cache. Every register starts out as
    /// [`RegStatus::Unknown`].
    pub fn new(tdesc: Arc<TargetDescription>) -> RegCache {
        RegCache {
            bytes: vec![0; tdesc.regcache_size()],
            status: vec![RegStatus::Unknown; tdesc.num_registers()],
            tdesc,
        }
    }

    /// The description this cache is laid out by.
    pub fn tdesc(&self) -> &TargetDescription {
        &self.tdesc
    }

    /// Look up a register number by name.
    pub fn find_regno(&self, name: &str) -> usize {
        match self.tdesc.find_regno(name) {
            Some(regno) => regno,
            None => panic!("{}: unknown register `{}`", self.tdesc.arch(), name),
        }
    }

    /// Size of register `regno`, in bytes.
    pub fn register_size(&self, regno: usize) -> usize {
        self.tdesc.register_size(regno)
    }

    /// Status of register `regno`.
    pub fn status(&self, regno: usize) -> RegStatus {
        self.tdesc.register(regno);
        self.status[regno]
    }

    /// Whether every described register holds a value.
    pub fn is_complete(&self) -> bool {
        self.status.iter().all(|s| *s == RegStatus::Valid)
    }

    /// Raw bytes of register `regno`.
    pub fn raw(&self, regno: usize) -> &[u8] {
        let reg = self.tdesc.register(regno);
        &self.bytes[reg.offset..reg.offset + reg.size]
    }

    /// Set register `regno` from the first `register_size(regno)` bytes of
    /// `src`, marking it valid.
    pub fn supply(&mut self, regno: usize, src: &[u8]) {
        let reg = self.tdesc.register(regno);
        assert!(
            src.len() >= reg.size,
            "supplying `{}` needs {} bytes, got {}",
            reg.name,
            reg.size,
            src.len()
        );
        self.bytes[reg.offset..reg.offset + reg.size].copy_from_slice(&src[..reg.size]);
        self.status[regno] = RegStatus::Valid;
    }

    /// Set register `regno` to zero, marking it valid.
    pub fn supply_zeroed(&mut self, regno: usize) {
        let reg = self.tdesc.register(regno);
        self.bytes[reg.offset..reg.offset + reg.size]
            .iter_mut()
            .for_each(|b| *b = 0);
        self.status[regno] = RegStatus::Valid;
    }

    /// [`supply`](Self::supply), by register name.
    pub fn supply_by_name(&mut self, name: &str, src: &[u8]) {
        let regno = self.find_regno(name);
        self.supply(regno, src)
    }

    /// Mark register `regno` as unavailable.
    pub fn mark_unavailable(&mut self, regno: usize) {
        let reg = self.tdesc.register(regno);
        self.bytes[reg.offset..reg.offset + reg.size]
            .iter_mut()
            .for_each(|b| *b = 0);
        self.status[regno] = RegStatus::Unavailable;
    }

    /// Copy register `regno` into the first `register_size(regno)` bytes of
    /// `dst`.
    pub fn collect(&self, regno: usize, dst: &mut [u8]) {
        let raw = self.raw(regno);
        assert!(
            dst.len() >= raw.len(),
            "collecting `{}` needs {} bytes, got {}",
            self.tdesc.register(regno).name,
            raw.len(),
            dst.len()
        );
        dst[..raw.len()].copy_from_slice(raw);
    }

    /// [`collect`](Self::collect), by register name.
    pub fn collect_by_name(&self, name: &str, dst: &mut [u8]) {
        self.collect(self.find_regno(name), dst)
    }

    /// Read register `regno` as an integer.
    ///
    /// Returns `None` if the register is wider than `U`.
    pub fn read_int<U: LeBytes>(&self, regno: usize) -> Option<U> {
        U::from_le_bytes(self.raw(regno))
    }

    /// Set register `regno` from an integer of exactly the register's width.
    ///
    /// Panics if `U` is not as wide as the register.
    pub fn write_int<U: LeBytes>(&mut self, regno: usize, val: U) {
        let mut buf = [0; 16];
        let len = val.to_le_bytes(&mut buf);
        let size = self.register_size(regno);
        assert_eq!(
            len,
            Some(size),
            "integer width does not match `{}`",
            self.tdesc.register(regno).name
        );
        self.supply(regno, &buf[..size]);
    }

    /// Forget every cached value.
    pub fn invalidate(&mut self) {
        self.status.iter_mut().for_each(|s| *s = RegStatus::Unknown);
    }
}
