//! Conversion between the register cache and the Linux RISC-V regsets.
//!
//! - `NT_PRSTATUS` (`struct user_regs_struct`): `pc` followed by `x1..x31`,
//!   i.e: the program counter travels in the slot of the hard-wired `x0`. With
//!   CHERI, every slot holds a capability (`pcc`, `c1..c31`) and a trailing
//!   slot holds `ddc`.
//! - `NT_FPREGSET` (`__riscv_{f,d,q}_ext_state`): `f0..f31` followed by
//!   `fcsr`. The three variants differ only in register width, and are told
//!   apart by their size.
//!
//! All functions panic if the cache's target description doesn't match the
//! layout being marshalled.

use lowstub::regcache::RegCache;
use lowstub::regset::{NoteType, RegsetAccess, RegsetInfo, RegsetKind};
use lowstub::tdesc::{FpBank, GprBank, GprLayout};

/// Number of registers in the floating point regset (`f0..f31` + `fcsr`).
pub const NFPREG: usize = 33;

/// Largest general purpose regset: 33 capability registers of 16 bytes each.
pub const MAX_REGSET_SIZE: usize = 33 * 16;

/// Size of `struct __riscv_f_ext_state`.
pub const FP_F_SIZE: usize = 32 * 4 + 4;
/// Size of `struct __riscv_d_ext_state`.
pub const FP_D_SIZE: usize = 32 * 8 + 8;
/// Size of `struct __riscv_q_ext_state`.
pub const FP_Q_SIZE: usize = 32 * 16 + 16;

const FCSR_SIZE: usize = 4;

/// Regsets of a RISC-V Linux process.
///
/// The floating point variants are listed widest first: the kernel truncates
/// its reply to the requested size, so a narrower request would match a wider
/// regset as well.
///
/// General purpose registers can't be written back while capabilities are in
/// use, as the kernel would clear the capabilities' validity tags.
pub static REGSETS: [RegsetInfo; 4] = [
    RegsetInfo {
        note: NoteType::PRSTATUS,
        size: MAX_REGSET_SIZE,
        kind: RegsetKind::General,
        access: RegsetAccess::FETCH.union(RegsetAccess::STORE),
        collect: collect_gregset,
        supply: supply_gregset,
    },
    RegsetInfo {
        note: NoteType::FPREGSET,
        size: FP_Q_SIZE,
        kind: RegsetKind::Optional,
        access: RegsetAccess::all(),
        collect: collect_fpregset,
        supply: supply_fpregset,
    },
    RegsetInfo {
        note: NoteType::FPREGSET,
        size: FP_D_SIZE,
        kind: RegsetKind::Optional,
        access: RegsetAccess::all(),
        collect: collect_fpregset,
        supply: supply_fpregset,
    },
    RegsetInfo {
        note: NoteType::FPREGSET,
        size: FP_F_SIZE,
        kind: RegsetKind::Optional,
        access: RegsetAccess::all(),
        collect: collect_fpregset,
        supply: supply_fpregset,
    },
];

fn gpr_layout(cache: &RegCache, buf_len: usize) -> GprLayout {
    let tdesc = cache.tdesc();
    let layout = match tdesc.gpr_layout() {
        Some(layout) => *layout,
        None => panic!("{}: no general purpose register layout", tdesc.arch()),
    };
    assert!(
        buf_len >= layout.regset_size(),
        "{}: general purpose regset needs {} bytes, got {}",
        tdesc.arch(),
        layout.regset_size(),
        buf_len
    );
    layout
}

fn fp_bank(cache: &RegCache, buf_len: usize) -> FpBank {
    let tdesc = cache.tdesc();
    let fp = match tdesc.fp_bank() {
        Some(fp) => *fp,
        None => panic!("{}: no floating point registers", tdesc.arch()),
    };
    assert_eq!(fp.count, NFPREG - 1, "{}: malformed floating point bank", tdesc.arch());
    assert!(
        buf_len >= fp.status_offset() + FCSR_SIZE,
        "{}: floating point regset needs {} bytes, got {}",
        tdesc.arch(),
        fp.status_offset() + FCSR_SIZE,
        buf_len
    );
    fp
}

/// `(regno, slot)` of every register of `bank` with a slot of its own.
fn slots(bank: GprBank) -> impl Iterator<Item = (usize, usize)> {
    (bank.zero..=bank.pc).filter_map(move |regno| bank.slot(regno).map(|slot| (regno, slot)))
}

/// Collect general purpose registers from `cache` into `buf`.
///
/// The zero register is never written, its slot carries the program counter.
/// With capabilities the integer registers are collected after the
/// capability registers, over the address field of the slot they alias.
pub fn collect_gregset(cache: &RegCache, buf: &mut [u8]) {
    let layout = gpr_layout(cache, buf.len());
    let stride = layout.stride();

    for (regno, slot) in slots(*layout.primary()) {
        cache.collect(regno, &mut buf[slot * stride..]);
    }
    if let GprLayout::Capability { caps, ddc, integer } = layout {
        cache.collect(ddc, &mut buf[caps.len() * stride..]);
        for (regno, slot) in slots(integer) {
            cache.collect(regno, &mut buf[slot * stride..]);
        }
    }
}

/// Supply general purpose registers from `buf` into `cache`.
///
/// The zero register (and the null capability) always read as zero. With
/// capabilities, the integer registers are supplied from the address field
/// of the capability slot they alias.
pub fn supply_gregset(cache: &mut RegCache, buf: &[u8]) {
    let layout = gpr_layout(cache, buf.len());
    let stride = layout.stride();

    let primary = *layout.primary();
    cache.supply_zeroed(primary.zero);
    for (regno, slot) in slots(primary) {
        cache.supply(regno, &buf[slot * stride..]);
    }

    if let GprLayout::Capability { caps, ddc, integer } = layout {
        cache.supply(ddc, &buf[caps.len() * stride..]);
        cache.supply_zeroed(integer.zero);
        for (regno, slot) in slots(integer) {
            cache.supply(regno, &buf[slot * stride..]);
        }
    }
}

/// Collect floating point registers from `cache` into `buf`.
///
/// `fflags` and `frm` are views of `fcsr`, and are not collected.
pub fn collect_fpregset(cache: &RegCache, buf: &mut [u8]) {
    let fp = fp_bank(cache, buf.len());

    for (i, chunk) in buf.chunks_exact_mut(fp.size).take(fp.count).enumerate() {
        cache.collect(fp.first + i, chunk);
    }
    cache.collect(fp.status, &mut buf[fp.status_offset()..]);
}

/// Supply floating point registers from `buf` into `cache`, deriving `fflags`
/// and `frm` from `fcsr`.
pub fn supply_fpregset(cache: &mut RegCache, buf: &[u8]) {
    let fp = fp_bank(cache, buf.len());

    for (i, chunk) in buf.chunks_exact(fp.size).take(fp.count).enumerate() {
        cache.supply(fp.first + i, chunk);
    }
    cache.supply(fp.status, &buf[fp.status_offset()..]);

    let fcsr: u32 = match cache.read_int(fp.status) {
        Some(fcsr) => fcsr,
        None => panic!("{}: fcsr wider than 32 bits", cache.tdesc().arch()),
    };
    let fflags = cache.find_regno("fflags");
    cache.write_int(fflags, fcsr & 0x1f);
    let frm = cache.find_regno("frm");
    cache.write_int(frm, (fcsr >> 5) & 0x7);
}
