//! Target descriptions for RISC-V processes.

use lowstub::tdesc::{FpBank, GprBank, GprLayout, RegGroup, TargetDescription, TdescBuilder};

use super::Features;

/// Integer registers (and the program counter).
pub const CPU_FEATURE: &str = "org.gnu.gdb.riscv.cpu";
/// Floating point registers.
pub const FPU_FEATURE: &str = "org.gnu.gdb.riscv.fpu";
/// CHERI capability registers.
pub const CHERI_FEATURE: &str = "org.gnu.gdb.riscv.cheri";

#[rustfmt::skip]
const GPR_NAMES: [&str; 32] = [
    "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2",
    "fp", "s1", "a0", "a1", "a2", "a3", "a4", "a5",
    "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7",
    "s8", "s9", "s10", "s11", "t3", "t4", "t5", "t6",
];

#[rustfmt::skip]
const FPR_NAMES: [&str; 32] = [
    "ft0", "ft1", "ft2", "ft3", "ft4", "ft5", "ft6", "ft7",
    "fs0", "fs1", "fa0", "fa1", "fa2", "fa3", "fa4", "fa5",
    "fa6", "fa7", "fs2", "fs3", "fs4", "fs5", "fs6", "fs7",
    "fs8", "fs9", "fs10", "fs11", "ft8", "ft9", "ft10", "ft11",
];

#[rustfmt::skip]
const CAP_NAMES: [&str; 32] = [
    "cnull", "cra", "csp", "cgp", "ctp", "ct0", "ct1", "ct2",
    "cs0", "cs1", "ca0", "ca1", "ca2", "ca3", "ca4", "ca5",
    "ca6", "ca7", "cs2", "cs3", "cs4", "cs5", "cs6", "cs7",
    "cs8", "cs9", "cs10", "cs11", "ct3", "ct4", "ct5", "ct6",
];

/// Add a bank of 32 registers named `names` followed by `pc`, returning the
/// bank.
fn add_bank(
    b: &mut TdescBuilder,
    names: &[&'static str; 32],
    pc: &'static str,
    size: usize,
) -> GprBank {
    let zero = b.reg(names[0], size, RegGroup::General);
    for &name in &names[1..] {
        b.reg(name, size, RegGroup::General);
    }
    let pc = b.reg(pc, size, RegGroup::General);
    GprBank { zero, pc, size }
}

/// Build the target description of a process with the given `features`.
///
/// Register numbering is a pure function of `features`.
pub fn build(features: &Features) -> TargetDescription {
    let xlen = features.xlen.bytes();
    let mut b = TdescBuilder::new(features.xlen.arch_name());

    b.feature(CPU_FEATURE);
    let integer = add_bank(&mut b, &GPR_NAMES, "pc", xlen);

    let flen = features.flen.bytes();
    if flen != 0 {
        b.feature(FPU_FEATURE);
        let first = b.reg(FPR_NAMES[0], flen, RegGroup::Float);
        for &name in &FPR_NAMES[1..] {
            b.reg(name, flen, RegGroup::Float);
        }
        b.reg("fflags", 4, RegGroup::ControlStatus);
        b.reg("frm", 4, RegGroup::ControlStatus);
        let status = b.reg("fcsr", 4, RegGroup::ControlStatus);
        b.fp_bank(FpBank {
            first,
            count: FPR_NAMES.len(),
            size: flen,
            status,
        });
    }

    match features.clen() {
        Some(clen) => {
            b.feature(CHERI_FEATURE);
            let caps = add_bank(&mut b, &CAP_NAMES, "pcc", clen);
            let ddc = b.reg("ddc", clen, RegGroup::General);
            b.gpr_layout(GprLayout::Capability { caps, ddc, integer });
            b.expedite(&["csp", "pcc"]);
        }
        None => {
            b.gpr_layout(GprLayout::Standard(integer));
            b.expedite(&["sp", "pc"]);
        }
    }

    let tdesc = b.build();
    debug!(
        "built {} description: {} registers, {} bytes",
        tdesc.arch(),
        tdesc.num_registers(),
        tdesc.regcache_size()
    );
    tdesc
}

#[cfg(test)]
mod tests {
    use super::super::{Flen, Xlen};
    use super::*;

    fn features(xlen: Xlen, flen: Flen, capabilities: bool) -> Features {
        Features {
            xlen,
            flen,
            capabilities,
        }
    }

    #[test]
    fn rv64d() {
        let tdesc = build(&features(Xlen::Rv64, Flen::F64, false));
        assert_eq!(tdesc.arch(), "riscv:rv64");
        assert_eq!(tdesc.num_registers(), 33 + 35);
        assert_eq!(tdesc.find_regno("zero"), Some(0));
        assert_eq!(tdesc.find_regno("fp"), Some(8));
        assert_eq!(tdesc.find_regno("pc"), Some(32));
        assert_eq!(tdesc.find_regno("ft0"), Some(33));
        assert_eq!(tdesc.find_regno("fcsr"), Some(67));
        assert_eq!(tdesc.register_size(32), 8);
        assert_eq!(tdesc.register_size(40), 8);

        let fcsr = tdesc.register(67);
        assert_eq!(
            (fcsr.size, fcsr.group, fcsr.feature),
            (4, RegGroup::ControlStatus, FPU_FEATURE)
        );

        assert!(tdesc.has_feature(CPU_FEATURE));
        assert!(!tdesc.has_feature(CHERI_FEATURE));
        assert_eq!(tdesc.expedite_regs(), &["sp", "pc"]);
    }

    #[test]
    fn rv32_integer_only() {
        let tdesc = build(&features(Xlen::Rv32, Flen::None, false));
        assert_eq!(tdesc.arch(), "riscv:rv32");
        assert_eq!(tdesc.num_registers(), 33);
        assert_eq!(tdesc.regcache_size(), 33 * 4);
        assert!(!tdesc.has_feature(FPU_FEATURE));
        assert!(tdesc.fp_bank().is_none());
    }

    #[test]
    fn offset_rule() {
        for &(xlen, capabilities) in &[
            (Xlen::Rv32, false),
            (Xlen::Rv64, false),
            (Xlen::Rv32, true),
            (Xlen::Rv64, true),
        ] {
            let tdesc = build(&features(xlen, Flen::None, capabilities));
            let gpr = tdesc.gpr_layout().unwrap();
            let bank = gpr.primary();
            for regno in bank.zero + 1..bank.pc {
                assert_eq!(gpr.offset_of(regno), Some((regno - bank.zero) * gpr.stride()));
            }
            assert_eq!(gpr.offset_of(bank.pc), Some(0));
            assert_eq!(gpr.offset_of(bank.zero), None);
        }
    }

    #[test]
    fn capabilities() {
        let tdesc = build(&features(Xlen::Rv64, Flen::F64, true));
        assert!(tdesc.has_capabilities());
        assert_eq!(tdesc.expedite_regs(), &["csp", "pcc"]);

        let cnull = tdesc.find_regno("cnull").unwrap();
        let pcc = tdesc.find_regno("pcc").unwrap();
        let ddc = tdesc.find_regno("ddc").unwrap();
        assert_eq!(pcc - cnull, 32);
        assert_eq!(ddc, pcc + 1);
        assert_eq!(tdesc.register_size(pcc), 16);
        assert_eq!(tdesc.register(ddc).feature, CHERI_FEATURE);

        let gpr = tdesc.gpr_layout().unwrap();
        assert_eq!(gpr.regset_size(), 33 * 16);
        assert_eq!(gpr.offset_of(ddc), Some(32 * 16));
        // plain registers keep their own width
        assert_eq!(tdesc.register_size(tdesc.find_regno("pc").unwrap()), 8);
    }

    #[test]
    fn deterministic() {
        let f = features(Xlen::Rv32, Flen::F32, true);
        assert_eq!(build(&f), build(&f));
    }
}
