use crate::hardware::memory::PROGRAM_SECTION_START;
use std::fmt::{Debug, Formatter};

/// Content of one 16-bit register, interpretable as raw bits or as two's complement number.
#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub struct Register(u16);

impl Register {
    #[must_use]
    pub const fn from_binary(value: u16) -> Self {
        Self(value)
    }
    #[must_use]
    pub const fn from_decimal(value: i16) -> Self {
        Self(value.cast_unsigned())
    }
    #[must_use]
    pub const fn as_binary(self) -> u16 {
        self.0
    }
    #[must_use]
    pub const fn as_decimal(self) -> i16 {
        self.0.cast_signed()
    }
}
impl Debug for Register {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#06X} ({})", self.0, self.as_decimal())
    }
}

#[must_use]
pub const fn from_binary(value: u16) -> Register {
    Register::from_binary(value)
}
#[must_use]
pub const fn from_decimal(value: i16) -> Register {
    Register::from_decimal(value)
}

/// The LC-3 register file: `R0` to `R7`, the program counter and the condition flags.
#[derive(Clone, PartialEq, Eq)]
pub struct Registers {
    general_purpose: [Register; 8],
    pc: Register,
    cond: ConditionFlag,
}
impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}
impl Debug for Registers {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "PC: {:?}, COND: {:?}, R: {:?}",
            self.pc, self.cond, self.general_purpose
        )
    }
}

impl Registers {
    /// All general purpose registers zeroed, `COND` is `Z` and `PC` points to the
    /// default program origin.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            general_purpose: [Register(0); 8],
            pc: Register(PROGRAM_SECTION_START),
            cond: ConditionFlag::Zero,
        }
    }
    /// # Panics
    /// - `r` is not a valid register number `0..=7`
    #[must_use]
    pub fn get(&self, r: u8) -> Register {
        assert!(r <= 7, "Invalid general purpose register get");
        self.general_purpose[usize::from(r)]
    }
    /// # Panics
    /// - `r` is not a valid register number `0..=7`
    pub fn set(&mut self, r: u8, value: Register) {
        assert!(r <= 7, "Invalid general purpose register set");
        self.general_purpose[usize::from(r)] = value;
    }
    #[must_use]
    pub const fn pc(&self) -> Register {
        self.pc
    }
    pub const fn set_pc(&mut self, value: u16) {
        self.pc = Register(value);
    }
    /// Moves `PC` past the instruction it points to, wrapping at the end of memory.
    pub const fn inc_pc(&mut self) {
        self.pc = Register(self.pc.0.wrapping_add(1));
    }
    #[must_use]
    pub const fn get_conditional_register(&self) -> ConditionFlag {
        self.cond
    }
    /// Sets the condition flags from the current content of register `r`.
    pub fn update_conditional_register(&mut self, r: u8) {
        self.update_flags(self.get(r).as_binary());
    }
    /// Sets the condition flags according to the sign of `value`.
    pub fn update_flags(&mut self, value: u16) {
        self.cond = ConditionFlag::from(value);
    }
}

/// Sign of the last value written by a flag setting instruction.
/// Exactly one flag is set at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ConditionFlag {
    Pos = 1 << 0, // Positive
    Zero = 1 << 1,
    Neg = 1 << 2, // Negative
}
impl ConditionFlag {
    /// Bit of this flag in the `nzp` mask of a `BR` instruction.
    #[must_use]
    pub const fn mask(self) -> u16 {
        self as u16
    }
}

impl From<u16> for ConditionFlag {
    fn from(value: u16) -> Self {
        if value == 0 {
            Self::Zero
        } else if value >> 15 == 1 {
            // leftmost bit is 1 for negative numbers
            Self::Neg
        } else {
            Self::Pos
        }
    }
}
