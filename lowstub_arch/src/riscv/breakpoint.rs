//! Software breakpoints.
//!
//! RISC-V has two breakpoint instructions: the standard 4-byte `ebreak`, and
//! the 2-byte `c.ebreak` from the compressed extension. Instructions are
//! always little-endian, and are parcelled in 16-bit half-words. Patterns are
//! defined as half-words in instruction-stream order, and memory is decoded
//! explicitly as little-endian, so nothing here depends on host byte order.

use lowstub::common::Addr;
use lowstub::target::{HostError, TargetMemory};
use lowstub::Error;

/// `ebreak`, as half-words in instruction-stream order.
pub const EBREAK: [u16; 2] = [0x0073, 0x0010];
/// `c.ebreak`.
pub const C_EBREAK: u16 = 0x9002;

const fn halfwords_to_le(lo: u16, hi: u16) -> [u8; 4] {
    let lo = lo.to_le_bytes();
    let hi = hi.to_le_bytes();
    [lo[0], lo[1], hi[0], hi[1]]
}

static EBREAK_BYTES: [u8; 4] = halfwords_to_le(EBREAK[0], EBREAK[1]);
static C_EBREAK_BYTES: [u8; 2] = C_EBREAK.to_le_bytes();

/// Length in bytes of the instruction whose first half-word is `insn`.
///
/// Follows the variable-length encoding scheme of the base ISA. Reserved
/// encodings (192-bit and longer) report 2.
pub fn insn_length(insn: u16) -> usize {
    if insn & 0x3 != 0x3 {
        2
    } else if insn & 0x1f != 0x1f {
        4
    } else if insn & 0x3f == 0x1f {
        6
    } else if insn & 0x7f == 0x3f {
        8
    } else if insn & 0x7f == 0x7f && insn & 0x7000 != 0x7000 {
        10 + ((insn >> 11) & 0xe) as usize
    } else {
        2
    }
}

fn read_halfword(mem: &mut dyn TargetMemory, addr: Addr) -> Result<u16, HostError> {
    let mut buf = [0; 2];
    mem.read_memory(addr, &mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

/// Pick the breakpoint kind for `pc`: 4 (`ebreak`) over a standard 4-byte
/// instruction, 2 (`c.ebreak`) over anything else.
pub fn breakpoint_kind_from_pc(mem: &mut dyn TargetMemory, pc: Addr) -> Result<usize, Error> {
    let insn = read_halfword(mem, pc).map_err(|source| Error::MemoryRead { addr: pc, source })?;
    let kind = if insn_length(insn) == EBREAK_BYTES.len() {
        EBREAK_BYTES.len()
    } else {
        C_EBREAK_BYTES.len()
    };
    trace!("breakpoint kind at {:#x} ({:#06x}): {}", pc, insn, kind);
    Ok(kind)
}

/// The breakpoint instruction for `kind`. The length of the returned pattern
/// is the breakpoint size.
pub fn sw_breakpoint_from_kind(kind: usize) -> &'static [u8] {
    match kind {
        4 => &EBREAK_BYTES,
        2 => &C_EBREAK_BYTES,
        _ => {
            warn!("unexpected breakpoint kind {}, using c.ebreak", kind);
            &C_EBREAK_BYTES
        }
    }
}

/// Whether `pc` holds either breakpoint instruction.
///
/// Memory that can't be read holds no breakpoint.
pub fn breakpoint_at(mem: &mut dyn TargetMemory, pc: Addr) -> bool {
    match read_halfword(mem, pc) {
        Ok(C_EBREAK) => true,
        Ok(insn) if insn == EBREAK[0] => {
            matches!(read_halfword(mem, pc.wrapping_add(2)), Ok(insn) if insn == EBREAK[1])
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::super::fake::FakeInferior;
    use super::super::Flen;
    use super::*;

    fn inferior() -> FakeInferior {
        FakeInferior::rv64(Flen::None, false)
    }

    #[test]
    fn patterns() {
        assert_eq!(sw_breakpoint_from_kind(4), &[0x73, 0x00, 0x10, 0x00]);
        assert_eq!(sw_breakpoint_from_kind(2), &[0x02, 0x90]);
        assert_eq!(sw_breakpoint_from_kind(3), &[0x02, 0x90]);
    }

    #[test]
    fn lengths() {
        // c.nop, addi, 48-bit, 64-bit, 80-bit, reserved
        assert_eq!(insn_length(0x0001), 2);
        assert_eq!(insn_length(0x0013), 4);
        assert_eq!(insn_length(0x001f), 6);
        assert_eq!(insn_length(0x003f), 8);
        assert_eq!(insn_length(0x007f), 10);
        assert_eq!(insn_length(0x007f | (0x6 << 12)), 22);
        assert_eq!(insn_length(0x707f), 2);
        assert_eq!(insn_length(EBREAK[0]), 4);
        assert_eq!(insn_length(C_EBREAK), 2);
    }

    #[test]
    fn kind_from_pc() {
        let mut inferior = inferior();
        let base = inferior.mem_base;
        // addi a0, a0, 1
        inferior.mem[..4].copy_from_slice(&[0x13, 0x05, 0x15, 0x00]);
        // c.addi a0, 1
        inferior.mem[4..6].copy_from_slice(&[0x05, 0x05]);

        assert_eq!(breakpoint_kind_from_pc(&mut inferior, base), Ok(4));
        assert_eq!(breakpoint_kind_from_pc(&mut inferior, base + 4), Ok(2));
        assert_eq!(
            breakpoint_kind_from_pc(&mut inferior, 0x10),
            Err(Error::MemoryRead {
                addr: 0x10,
                source: HostError::Fault
            })
        );
    }

    #[test]
    fn detection() {
        let mut inferior = inferior();
        let base = inferior.mem_base;
        inferior.mem[..4].copy_from_slice(&EBREAK_BYTES);
        inferior.mem[4..6].copy_from_slice(&C_EBREAK_BYTES);
        // first half of ebreak, followed by something else
        inferior.mem[8..12].copy_from_slice(&[0x73, 0x00, 0x00, 0x00]);

        assert!(breakpoint_at(&mut inferior, base));
        assert!(breakpoint_at(&mut inferior, base + 4));
        assert!(!breakpoint_at(&mut inferior, base + 8));
        assert!(!breakpoint_at(&mut inferior, base + 2));
        assert!(!breakpoint_at(&mut inferior, 0));

        // second half-word unreadable
        let end = base + inferior.mem.len() as Addr - 2;
        inferior.mem[62..64].copy_from_slice(&[0x73, 0x00]);
        assert!(!breakpoint_at(&mut inferior, end));
    }

    #[test]
    fn host_order_independent() {
        assert_eq!(EBREAK_BYTES, [0x73, 0x00, 0x10, 0x00]);
        assert_eq!(C_EBREAK_BYTES, [0x02, 0x90]);
        assert_eq!(u16::from_le_bytes([EBREAK_BYTES[0], EBREAK_BYTES[1]]), EBREAK[0]);
    }
}
