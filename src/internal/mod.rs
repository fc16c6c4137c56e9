//! Types / traits which are not expected to be directly implemented by
//! `lowstub` users.

mod le_bytes;

pub use le_bytes::*;
