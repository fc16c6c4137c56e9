//! Target descriptions: the ordered, named register layout of a process.
//!
//! A [`TargetDescription`] is built once per process (see
//! [`LowTarget::arch_setup`](crate::arch::LowTarget::arch_setup)) and then
//! shared read-only by every [`RegCache`](crate::regcache::RegCache) of that
//! process.
//!
//! Besides the register list itself, a description carries the metadata
//! regset marshalling code needs ([`GprLayout`], [`FpBank`]), so that
//! marshalling never has to re-derive offsets from register names.

use alloc::vec::Vec;

/// Coarse classification of a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegGroup {
    /// General purpose (integer / capability) registers and the program
    /// counter.
    General,
    /// Floating point data registers.
    Float,
    /// Control and status registers.
    ControlStatus,
}

/// A single register of a [`TargetDescription`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterDesc {
    /// Register name, as used by the debugger.
    pub name: &'static str,
    /// Size in bytes.
    pub size: usize,
    /// Register group.
    pub group: RegGroup,
    /// Name of the description feature that introduced the register.
    pub feature: &'static str,
    /// Byte offset of the register's value within the register cache.
    pub offset: usize,
}

/// A bank of general purpose registers, as laid out in a general-purpose OS
/// regset.
///
/// The bank spans registers `zero..pc` followed by `pc` itself. The register
/// at `zero` is hard-wired and never transferred: its slot (slot 0) carries
/// the program counter instead. Every other register `r` of the bank lives in
/// slot `r - zero`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GprBank {
    /// Register number of the hard-wired zero (or null) register.
    pub zero: usize,
    /// Register number of the program counter.
    pub pc: usize,
    /// Size of each register of the bank, in bytes.
    pub size: usize,
}

impl GprBank {
    /// Number of regset slots covered by the bank.
    pub fn len(&self) -> usize {
        self.pc - self.zero
    }

    /// Always `false`: a bank contains at least its program counter.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether `regno` belongs to the bank.
    pub fn contains(&self, regno: usize) -> bool {
        (self.zero..=self.pc).contains(&regno)
    }

    /// Regset slot holding `regno`, if `regno` is transferred at all.
    ///
    /// The zero register has no slot of its own.
    pub fn slot(&self, regno: usize) -> Option<usize> {
        if regno == self.pc {
            Some(0)
        } else if regno > self.zero && regno < self.pc {
            Some(regno - self.zero)
        } else {
            None
        }
    }
}

/// Layout of the general-purpose regset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GprLayout {
    /// Plain integer registers, one slot per register.
    Standard(GprBank),
    /// Capability-extended registers.
    ///
    /// Every slot holds a capability. The capability bank takes the place of
    /// the integer bank in the regset, and an extra trailing slot holds the
    /// default data capability. The integer registers remain in the
    /// description as views of the address field (the low `integer.size`
    /// bytes) of the corresponding capability slot.
    Capability {
        /// The capability registers (null .. program counter capability).
        caps: GprBank,
        /// Register number of the default data capability.
        ddc: usize,
        /// The plain integer registers aliasing the capability slots.
        integer: GprBank,
    },
}

impl GprLayout {
    /// Size of one regset slot, in bytes.
    pub fn stride(&self) -> usize {
        self.primary().size
    }

    /// Number of regset slots.
    pub fn slots(&self) -> usize {
        match self {
            GprLayout::Standard(bank) => bank.len(),
            GprLayout::Capability { caps, .. } => caps.len() + 1,
        }
    }

    /// Number of bytes of regset the layout occupies.
    pub fn regset_size(&self) -> usize {
        self.slots() * self.stride()
    }

    /// The bank actually transferred through the regset.
    pub fn primary(&self) -> &GprBank {
        match self {
            GprLayout::Standard(bank) => bank,
            GprLayout::Capability { caps, .. } => caps,
        }
    }

    /// The plain integer register bank (program counter included).
    pub fn integer(&self) -> &GprBank {
        match self {
            GprLayout::Standard(bank) => bank,
            GprLayout::Capability { integer, .. } => integer,
        }
    }

    /// Whether registers are capability-extended.
    pub fn is_capability(&self) -> bool {
        matches!(self, GprLayout::Capability { .. })
    }

    /// Byte offset of `regno` within the general-purpose regset.
    ///
    /// With capabilities, integer registers report the offset of the
    /// capability slot they alias.
    pub fn offset_of(&self, regno: usize) -> Option<usize> {
        let stride = self.stride();
        match self {
            GprLayout::Standard(bank) => bank.slot(regno).map(|slot| slot * stride),
            GprLayout::Capability { caps, ddc, integer } => {
                if regno == *ddc {
                    Some(caps.len() * stride)
                } else {
                    caps.slot(regno)
                        .or_else(|| integer.slot(regno))
                        .map(|slot| slot * stride)
                }
            }
        }
    }
}

/// Layout of the floating point regset: `count` data registers of `size`
/// bytes each, followed by one control/status register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FpBank {
    /// Register number of the first data register.
    pub first: usize,
    /// Number of data registers.
    pub count: usize,
    /// Size of each data register, in bytes.
    pub size: usize,
    /// Register number of the control/status register.
    pub status: usize,
}

impl FpBank {
    /// Byte offset of the control/status register within the regset.
    pub fn status_offset(&self) -> usize {
        self.count * self.size
    }
}

/// The ordered, named register layout of a process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDescription {
    arch: &'static str,
    features: Vec<&'static str>,
    regs: Vec<RegisterDesc>,
    expedite: Vec<&'static str>,
    gpr: Option<GprLayout>,
    fp: Option<FpBank>,
    regcache_size: usize,
}

impl TargetDescription {
    /// Architecture name (e.g: `riscv:rv64`).
    pub fn arch(&self) -> &'static str {
        self.arch
    }

    /// All registers, in register-number order.
    pub fn registers(&self) -> &[RegisterDesc] {
        &self.regs
    }

    /// Number of registers.
    pub fn num_registers(&self) -> usize {
        self.regs.len()
    }

    /// Register `regno`.
    ///
    /// Panics if `regno` is out of range.
    pub fn register(&self, regno: usize) -> &RegisterDesc {
        match self.regs.get(regno) {
            Some(reg) => reg,
            None => panic!(
                "register {} out of range for {} ({} registers)",
                regno,
                self.arch,
                self.regs.len()
            ),
        }
    }

    /// Size of register `regno`, in bytes.
    pub fn register_size(&self, regno: usize) -> usize {
        self.register(regno).size
    }

    /// Look up a register number by name.
    pub fn find_regno(&self, name: &str) -> Option<usize> {
        self.regs.iter().position(|r| r.name == name)
    }

    /// Whether the description includes the named feature.
    pub fn has_feature(&self, name: &str) -> bool {
        self.features.iter().any(|f| *f == name)
    }

    /// Registers that are reported on every stop without being asked for.
    pub fn expedite_regs(&self) -> &[&'static str] {
        &self.expedite
    }

    /// Layout of the general-purpose regset, if the description has one.
    pub fn gpr_layout(&self) -> Option<&GprLayout> {
        self.gpr.as_ref()
    }

    /// Layout of the floating point regset, if the description has one.
    pub fn fp_bank(&self) -> Option<&FpBank> {
        self.fp.as_ref()
    }

    /// Whether general purpose registers are capability-extended.
    pub fn has_capabilities(&self) -> bool {
        self.gpr.map_or(false, |gpr| gpr.is_capability())
    }

    /// Number of bytes needed to hold every register.
    pub fn regcache_size(&self) -> usize {
        self.regcache_size
    }
}

/// Incrementally assembles a [`TargetDescription`].
///
/// Registers are numbered in the order they are added.
#[derive(Debug)]
pub struct TdescBuilder {
    arch: &'static str,
    features: Vec<&'static str>,
    regs: Vec<RegisterDesc>,
    expedite: Vec<&'static str>,
    gpr: Option<GprLayout>,
    fp: Option<FpBank>,
    offset: usize,
}

impl TdescBuilder {
    /// Start a description for architecture `arch`.
    pub fn new(arch: &'static str) -> TdescBuilder {
        TdescBuilder {
            arch,
            features: Vec::new(),
            regs: Vec::new(),
            expedite: Vec::new(),
            gpr: None,
            fp: None,
            offset: 0,
        }
    }

    /// Open a new feature. Registers added afterwards belong to it.
    pub fn feature(&mut self, name: &'static str) -> &mut Self {
        self.features.push(name);
        self
    }

    /// Append a register, returning its register number.
    ///
    /// Panics if no feature has been opened yet.
    pub fn reg(&mut self, name: &'static str, size: usize, group: RegGroup) -> usize {
        let feature = match self.features.last() {
            Some(feature) => *feature,
            None => panic!("register `{}` added outside of any feature", name),
        };

        let regno = self.regs.len();
        self.regs.push(RegisterDesc {
            name,
            size,
            group,
            feature,
            offset: self.offset,
        });
        self.offset += size;
        regno
    }

    /// Set the expedited register names.
    pub fn expedite(&mut self, names: &[&'static str]) -> &mut Self {
        self.expedite = names.to_vec();
        self
    }

    /// Set the general-purpose regset layout.
    pub fn gpr_layout(&mut self, layout: GprLayout) -> &mut Self {
        self.gpr = Some(layout);
        self
    }

    /// Set the floating point regset layout.
    pub fn fp_bank(&mut self, bank: FpBank) -> &mut Self {
        self.fp = Some(bank);
        self
    }

    /// Finish the description.
    ///
    /// Panics if the layout metadata disagrees with the registers that were
    /// added.
    pub fn build(self) -> TargetDescription {
        for name in &self.expedite {
            assert!(
                self.regs.iter().any(|r| r.name == *name),
                "expedited register `{}` is not described",
                name
            );
        }

        if let Some(gpr) = &self.gpr {
            let check_bank = |bank: &GprBank| {
                assert!(
                    bank.zero < bank.pc && bank.pc < self.regs.len(),
                    "malformed register bank {:?}",
                    bank
                );
                for reg in &self.regs[bank.zero..=bank.pc] {
                    assert_eq!(
                        reg.size, bank.size,
                        "register `{}` does not fit its bank",
                        reg.name
                    );
                }
            };
            match gpr {
                GprLayout::Standard(bank) => check_bank(bank),
                GprLayout::Capability { caps, ddc, integer } => {
                    check_bank(caps);
                    check_bank(integer);
                    assert_eq!(caps.len(), integer.len(), "capability and integer banks differ");
                    assert!(integer.size <= caps.size, "integer registers wider than capabilities");
                    assert_eq!(
                        self.regs[*ddc].size, caps.size,
                        "ddc does not fit a capability slot"
                    );
                }
            }
        }

        if let Some(fp) = &self.fp {
            assert!(
                fp.first + fp.count <= self.regs.len() && fp.status < self.regs.len(),
                "malformed floating point bank {:?}",
                fp
            );
            for reg in &self.regs[fp.first..fp.first + fp.count] {
                assert_eq!(reg.size, fp.size, "register `{}` does not fit its bank", reg.name);
            }
        }

        TargetDescription {
            arch: self.arch,
            features: self.features,
            regs: self.regs,
            expedite: self.expedite,
            gpr: self.gpr,
            fp: self.fp,
            regcache_size: self.offset,
        }
    }
}
