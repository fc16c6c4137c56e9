//! Common types and definitions used across `lowstub`.

/// Thread ID, as understood by the host's process-control facility (e.g: a
/// Linux LWP id).
pub type Tid = core::num::NonZeroUsize;

/// Guest address.
pub type Addr = u64;
