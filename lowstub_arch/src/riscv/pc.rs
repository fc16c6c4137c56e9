//! Program counter access.
//!
//! With CHERI, `pc` and `pcc` share a regset slot, and `pc` is the address
//! field of `pcc`. Only the plain `pc` is ever read or written here.

use lowstub::common::Addr;
use lowstub::internal::LeBytes;
use lowstub::regcache::RegCache;
use num_traits::PrimInt;

fn read_pc<U: PrimInt + LeBytes>(cache: &RegCache, regno: usize) -> Addr {
    match cache.read_int::<U>(regno).and_then(|pc| pc.to_u64()) {
        Some(pc) => pc,
        None => panic!(
            "{}: pc does not fit {} bytes",
            cache.tdesc().arch(),
            core::mem::size_of::<U>()
        ),
    }
}

fn write_pc<U: PrimInt + LeBytes>(cache: &mut RegCache, regno: usize, pc: Addr) {
    let val = U::from(pc).unwrap_or_else(|| {
        let mask = U::max_value().to_u64().unwrap_or(u64::MAX);
        warn!("truncating pc {:#x} to {:#x}", pc, pc & mask);
        U::from(pc & mask).unwrap_or_else(U::zero)
    });
    cache.write_int(regno, val)
}

/// Read the program counter, dispatching on the width of `pc`.
///
/// Panics if `pc` is neither 4 nor 8 bytes wide.
pub fn get_pc(cache: &RegCache) -> Addr {
    let regno = cache.find_regno("pc");
    match cache.register_size(regno) {
        4 => read_pc::<u32>(cache, regno),
        8 => read_pc::<u64>(cache, regno),
        size => panic!("{}: unexpected pc width {}", cache.tdesc().arch(), size),
    }
}

/// Write the program counter, dispatching on the width of `pc`.
///
/// Values too wide for a 32-bit `pc` are truncated. Panics if `pc` is neither
/// 4 nor 8 bytes wide.
pub fn set_pc(cache: &mut RegCache, pc: Addr) {
    let regno = cache.find_regno("pc");
    match cache.register_size(regno) {
        4 => write_pc::<u32>(cache, regno, pc),
        8 => write_pc::<u64>(cache, regno, pc),
        size => panic!("{}: unexpected pc width {}", cache.tdesc().arch(), size),
    }
}

#[cfg(test)]
mod tests {
    use super::super::features::{Features, Flen, Xlen};
    use super::super::tdesc::build;
    use super::*;
    use alloc::sync::Arc;
    use lowstub::tdesc::{RegGroup, TdescBuilder};

    fn cache(xlen: Xlen, capabilities: bool) -> RegCache {
        RegCache::new(Arc::new(build(&Features {
            xlen,
            flen: Flen::None,
            capabilities,
        })))
    }

    #[test]
    fn rv32() {
        let mut cache = cache(Xlen::Rv32, false);
        set_pc(&mut cache, 0x8000_1234);
        assert_eq!(cache.raw(32), &[0x34, 0x12, 0x00, 0x80]);
        assert_eq!(get_pc(&cache), 0x8000_1234);
    }

    #[test]
    fn rv32_truncates() {
        let mut cache = cache(Xlen::Rv32, false);
        set_pc(&mut cache, 0x1_0000_0010);
        assert_eq!(get_pc(&cache), 0x10);
    }

    #[test]
    fn rv64() {
        let mut cache = cache(Xlen::Rv64, false);
        set_pc(&mut cache, 0xffff_ffc0_0000_1000);
        assert_eq!(get_pc(&cache), 0xffff_ffc0_0000_1000);
    }

    #[test]
    fn capability_pc_is_plain_pc() {
        let mut cache = cache(Xlen::Rv64, true);
        set_pc(&mut cache, 0x1_0000);
        let pc = cache.find_regno("pc");
        assert_eq!(cache.register_size(pc), 8);
        assert_eq!(get_pc(&cache), 0x1_0000);
    }

    #[test]
    #[should_panic(expected = "unexpected pc width 2")]
    fn odd_width() {
        let mut b = TdescBuilder::new("toy");
        b.feature("toy.cpu");
        b.reg("pc", 2, RegGroup::General);
        let cache = RegCache::new(Arc::new(b.build()));
        get_pc(&cache);
    }
}
