use crate::numbers::sign_extend;
use std::fmt::{Debug, Display, Formatter};

/// Wrapper for LC-3 u16 instruction.
/// format is: `OOOO_DDD_P_PPPP_PPPP`
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Instruction(u16);

impl Instruction {
    /// Gives the value of only the specified bit range.
    ///
    /// # Parameters
    /// - `from`: starting index
    /// - `to`: end index (inclusive), mut be greater or equal to `from`
    ///
    /// # Panics
    /// - asserts that to is greater or equal from and both are valid indexes
    #[must_use]
    pub fn get_bit_range(self, from: u8, to: u8) -> u16 {
        debug_assert!(
            to >= from,
            "wrong direction of from: {from:?} and to: {to:?}"
        );
        debug_assert!(
            (00..u16::BITS).contains(&u32::from(to)),
            "index: {to:?} to u16 is greater than maximum value {:?}",
            u16::BITS - 1
        );
        (self.0 >> from) & ((0b1 << (to - from + 1)) - 1)
    }
    /// Gives the value of only the specified bit range and converts that to u8.
    /// See [`Instruction::get_bit_range()`]
    /// # Panics
    /// - value does not fit into u8 with message from `expect`
    #[must_use]
    pub fn get_bit_range_u8(self, from: u8, to: u8, expect: &str) -> u8 {
        u8::try_from(self.get_bit_range(from, to)).expect(expect)
    }
    #[must_use]
    pub fn get_bit(self, index: u8) -> bool {
        self.get_bit_range(index, index) & 1 != 0
    }
    #[must_use]
    pub fn op_code(self) -> u8 {
        self.get_bit_range_u8(12, 15, "Error parsing op_code")
    }
    #[must_use]
    pub fn dr_number(self) -> u8 {
        self.get_bit_range_u8(9, 11, "Error parsing dr")
    }
    #[must_use]
    pub fn sr1_number(self) -> u8 {
        self.get_bit_range_u8(6, 8, "Error parsing sr1")
    }
    #[must_use]
    pub fn sr2_number(self) -> u8 {
        self.get_bit_range_u8(0, 2, "Error parsing sr2")
    }
    #[must_use]
    pub fn is_immediate(self) -> bool {
        self.get_bit(5)
    }
    #[must_use]
    pub fn get_immediate(self) -> u16 {
        sign_extend(self.get_bit_range(0, 4), 5)
    }
    /// Sign extended offset of the lowest `len` bits, as 16-bit two's complement.
    #[must_use]
    pub fn offset(self, len: u8) -> u16 {
        sign_extend(self.get_bit_range(0, len - 1), len)
    }
    #[must_use]
    pub fn trap_vector(self) -> u8 {
        self.get_bit_range_u8(0, 7, "Error parsing trap vector")
    }
}

impl Debug for Instruction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Op: {:04b}, DR: {:03b}, Operands: {:09b}",
            self.op_code(),
            self.dr_number(),
            self.get_bit_range(0, 8)
        )
    }
}

impl From<u16> for Instruction {
    fn from(bits: u16) -> Self {
        Self(bits)
    }
}

/// The sixteen values of the op code in bits `[15:12]`.
#[repr(u8)]
#[derive(enumn::N, Debug, Copy, Clone, PartialEq, Eq)]
pub enum OpCode {
    Br = 0b0000,
    Add = 0b0001,
    Ld = 0b0010,
    St = 0b0011,
    Jsr = 0b0100,
    And = 0b0101,
    Ldr = 0b0110,
    Str = 0b0111,
    Rti = 0b1000,
    Not = 0b1001,
    Ldi = 0b1010,
    Sti = 0b1011,
    Jmp = 0b1100,
    Res = 0b1101,
    Lea = 0b1110,
    Trap = 0b1111,
}

/// Second operand of `ADD` and `AND`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Operand {
    Register(u8),
    /// Sign extended `imm5`
    Immediate(u16),
}

/// Target of a `JSR`: `JSRR BaseR` or PC relative `JSR PCoffset11`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum JumpTarget {
    Register(u8),
    PcOffset(u16),
}

/// A decoded instruction, carrying only the fields its op code uses.
/// Register fields are register numbers `0..=7`, offsets are sign extended.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Operation {
    Br { nzp: u16, pc_offset: u16 },
    Add { dr: u8, sr1: u8, operand: Operand },
    Ld { dr: u8, pc_offset: u16 },
    St { sr: u8, pc_offset: u16 },
    Jsr { target: JumpTarget },
    And { dr: u8, sr1: u8, operand: Operand },
    Ldr { dr: u8, base_r: u8, offset: u16 },
    Str { sr: u8, base_r: u8, offset: u16 },
    Rti,
    Not { dr: u8, sr: u8 },
    Ldi { dr: u8, pc_offset: u16 },
    Sti { sr: u8, pc_offset: u16 },
    Jmp { base_r: u8 },
    Res,
    Lea { dr: u8, pc_offset: u16 },
    Trap { vector: u8 },
}

impl Operation {
    #[must_use]
    pub const fn op_code(self) -> OpCode {
        match self {
            Self::Br { .. } => OpCode::Br,
            Self::Add { .. } => OpCode::Add,
            Self::Ld { .. } => OpCode::Ld,
            Self::St { .. } => OpCode::St,
            Self::Jsr { .. } => OpCode::Jsr,
            Self::And { .. } => OpCode::And,
            Self::Ldr { .. } => OpCode::Ldr,
            Self::Str { .. } => OpCode::Str,
            Self::Rti => OpCode::Rti,
            Self::Not { .. } => OpCode::Not,
            Self::Ldi { .. } => OpCode::Ldi,
            Self::Sti { .. } => OpCode::Sti,
            Self::Jmp { .. } => OpCode::Jmp,
            Self::Res => OpCode::Res,
            Self::Lea { .. } => OpCode::Lea,
            Self::Trap { .. } => OpCode::Trap,
        }
    }
}

impl From<Instruction> for Operation {
    fn from(i: Instruction) -> Self {
        let Some(op_code) = OpCode::n(i.op_code()) else {
            unreachable!("op code has 4 bits and all 16 values are defined")
        };
        let alu_operand = || {
            if i.is_immediate() {
                Operand::Immediate(i.get_immediate())
            } else {
                // bits [4:3] are reserved zero and ignored
                Operand::Register(i.sr2_number())
            }
        };
        match op_code {
            OpCode::Br => Self::Br {
                nzp: i.get_bit_range(9, 11),
                pc_offset: i.offset(9),
            },
            OpCode::Add => Self::Add {
                dr: i.dr_number(),
                sr1: i.sr1_number(),
                operand: alu_operand(),
            },
            OpCode::Ld => Self::Ld {
                dr: i.dr_number(),
                pc_offset: i.offset(9),
            },
            OpCode::St => Self::St {
                sr: i.dr_number(),
                pc_offset: i.offset(9),
            },
            OpCode::Jsr => Self::Jsr {
                target: if i.get_bit(11) {
                    JumpTarget::PcOffset(i.offset(11))
                } else {
                    JumpTarget::Register(i.sr1_number())
                },
            },
            OpCode::And => Self::And {
                dr: i.dr_number(),
                sr1: i.sr1_number(),
                operand: alu_operand(),
            },
            OpCode::Ldr => Self::Ldr {
                dr: i.dr_number(),
                base_r: i.sr1_number(),
                offset: i.offset(6),
            },
            OpCode::Str => Self::Str {
                sr: i.dr_number(),
                base_r: i.sr1_number(),
                offset: i.offset(6),
            },
            OpCode::Rti => Self::Rti,
            OpCode::Not => Self::Not {
                dr: i.dr_number(),
                sr: i.sr1_number(),
            },
            OpCode::Ldi => Self::Ldi {
                dr: i.dr_number(),
                pc_offset: i.offset(9),
            },
            OpCode::Sti => Self::Sti {
                sr: i.dr_number(),
                pc_offset: i.offset(9),
            },
            OpCode::Jmp => Self::Jmp {
                base_r: i.sr1_number(),
            },
            OpCode::Res => Self::Res,
            OpCode::Lea => Self::Lea {
                dr: i.dr_number(),
                pc_offset: i.offset(9),
            },
            OpCode::Trap => Self::Trap {
                vector: i.trap_vector(),
            },
        }
    }
}

impl From<u16> for Operation {
    fn from(bits: u16) -> Self {
        Self::from(Instruction::from(bits))
    }
}

struct Offset(u16);
impl Display for Offset {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0.cast_signed())
    }
}

fn fmt_alu(
    f: &mut Formatter<'_>,
    name: &str,
    dr: u8,
    sr1: u8,
    operand: Operand,
) -> std::fmt::Result {
    match operand {
        Operand::Register(sr2) => write!(f, "{name} R{dr}, R{sr1}, R{sr2}"),
        Operand::Immediate(imm) => write!(f, "{name} R{dr}, R{sr1}, {}", Offset(imm)),
    }
}

/// Assembly notation, offsets are shown relative as in the source code.
impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::Br { nzp, pc_offset } => {
                let flag = |mask, c| if nzp & mask == 0 { "" } else { c };
                write!(
                    f,
                    "BR{}{}{} {}",
                    flag(0b100, "n"),
                    flag(0b010, "z"),
                    flag(0b001, "p"),
                    Offset(pc_offset)
                )
            }
            Self::Add { dr, sr1, operand } => fmt_alu(f, "ADD", dr, sr1, operand),
            Self::And { dr, sr1, operand } => fmt_alu(f, "AND", dr, sr1, operand),
            Self::Ld { dr, pc_offset } => write!(f, "LD R{dr}, {}", Offset(pc_offset)),
            Self::Ldi { dr, pc_offset } => write!(f, "LDI R{dr}, {}", Offset(pc_offset)),
            Self::Lea { dr, pc_offset } => write!(f, "LEA R{dr}, {}", Offset(pc_offset)),
            Self::St { sr, pc_offset } => write!(f, "ST R{sr}, {}", Offset(pc_offset)),
            Self::Sti { sr, pc_offset } => write!(f, "STI R{sr}, {}", Offset(pc_offset)),
            Self::Ldr { dr, base_r, offset } => {
                write!(f, "LDR R{dr}, R{base_r}, {}", Offset(offset))
            }
            Self::Str { sr, base_r, offset } => {
                write!(f, "STR R{sr}, R{base_r}, {}", Offset(offset))
            }
            Self::Jsr {
                target: JumpTarget::PcOffset(offset),
            } => write!(f, "JSR {}", Offset(offset)),
            Self::Jsr {
                target: JumpTarget::Register(base_r),
            } => write!(f, "JSRR R{base_r}"),
            Self::Jmp { base_r: 7 } => write!(f, "RET"),
            Self::Jmp { base_r } => write!(f, "JMP R{base_r}"),
            Self::Not { dr, sr } => write!(f, "NOT R{dr}, R{sr}"),
            Self::Trap { vector } => write!(f, "TRAP x{vector:02X}"),
            Self::Rti => write!(f, "RTI"),
            Self::Res => write!(f, "RES"),
        }
    }
}

#[expect(clippy::unusual_byte_groupings)]
#[cfg(test)]
mod tests {
    use super::*;
    use googletest::prelude::*;

    #[gtest]
    pub fn test_instr_get_bit_range_valid() {
        let sut = Instruction::from(0b1010_101_001010101);
        expect_that!(sut.op_code(), eq(0b1010));
        expect_that!(sut.dr_number(), eq(0b101));
        expect_that!(sut.offset(9), eq(0b0_0101_0101));

        // Add: DR: 3, SR1: 2, Immediate: false, SR2: 1
        let sut = Instruction::from(0b0001_011_010_0_00_001);
        expect_that!(sut.op_code(), eq(1));
        expect_that!(sut.dr_number(), eq(3));
        expect_that!(sut.sr1_number(), eq(2));
        expect_that!(sut.is_immediate(), eq(false));
        expect_that!(sut.sr2_number(), eq(1));

        // Add: DR: 7, SR1: 0, Immediate: true, imm5: 14
        let sut = Instruction::from(0b0001_111_000_1_01110);
        expect_that!(sut.dr_number(), eq(7));
        expect_that!(sut.sr1_number(), eq(0));
        expect_that!(sut.is_immediate(), eq(true));
        expect_that!(sut.get_immediate(), eq(14));
    }
    #[gtest]
    #[should_panic(expected = "wrong direction of from: 2 and to: 1")]
    pub fn test_instr_get_bit_range_wrong_order() {
        let sut = Instruction::from(0b1010_101_101010101);
        let _ = sut.get_bit_range(2, 1);
    }
    #[gtest]
    #[should_panic(expected = "index: 16 to u16 is greater than maximum value 15")]
    pub fn test_instr_get_bit_range_index_too_large() {
        let sut = Instruction::from(0b1010_101_101010101);
        let _ = sut.get_bit_range(2, 16);
    }
    #[gtest]
    pub fn test_decode_alu() {
        expect_that!(
            Operation::from(0b0001_000_001_1_00011),
            eq(Operation::Add {
                dr: 0,
                sr1: 1,
                operand: Operand::Immediate(3)
            })
        );
        // reserved bits [4:3] set are tolerated
        expect_that!(
            Operation::from(0b0101_000_001_0_11_010),
            eq(Operation::And {
                dr: 0,
                sr1: 1,
                operand: Operand::Register(2)
            })
        );
        expect_that!(
            Operation::from(0b0101_000_000_1_10000),
            eq(Operation::And {
                dr: 0,
                sr1: 0,
                operand: Operand::Immediate(0xFFF0)
            })
        );
        expect_that!(
            Operation::from(0b1001_011_101_111111),
            eq(Operation::Not { dr: 3, sr: 5 })
        );
    }
    #[gtest]
    pub fn test_decode_control_flow() {
        expect_that!(
            Operation::from(0b0000_101_111111110),
            eq(Operation::Br {
                nzp: 0b101,
                pc_offset: 0xFFFE
            })
        );
        expect_that!(
            Operation::from(0b0100_1_10000000000),
            eq(Operation::Jsr {
                target: JumpTarget::PcOffset(0xFC00)
            })
        );
        expect_that!(
            Operation::from(0b0100_0_00_011_000000),
            eq(Operation::Jsr {
                target: JumpTarget::Register(3)
            })
        );
        expect_that!(
            Operation::from(0b1100_000_111_000000),
            eq(Operation::Jmp { base_r: 7 })
        );
        expect_that!(
            Operation::from(0xF025),
            eq(Operation::Trap { vector: 0x25 })
        );
        expect_that!(Operation::from(0x8000), eq(Operation::Rti));
        expect_that!(Operation::from(0xD123), eq(Operation::Res));
    }
    #[gtest]
    pub fn test_decode_memory_access() {
        expect_that!(
            Operation::from(0b0110_010_110_100000),
            eq(Operation::Ldr {
                dr: 2,
                base_r: 6,
                offset: 0xFFE0
            })
        );
        expect_that!(
            Operation::from(0b0111_010_110_000001),
            eq(Operation::Str {
                sr: 2,
                base_r: 6,
                offset: 1
            })
        );
        expect_that!(
            Operation::from(0b1011_111_110100011),
            eq(Operation::Sti {
                sr: 7,
                pc_offset: 0xFFA3
            })
        );
        expect_that!(
            Operation::from(0b1110_011_0_0101_0101),
            eq(Operation::Lea {
                dr: 3,
                pc_offset: 0x55
            })
        );
    }
    #[gtest]
    pub fn test_every_op_code_decodes_to_its_variant() {
        for op in 0u16..16 {
            let operation = Operation::from(op << 12);
            expect_that!(operation.op_code() as u16, eq(op));
        }
    }
    #[gtest]
    pub fn test_display_assembly() {
        expect_that!(
            Operation::from(0b0001_000_001_1_11101).to_string(),
            eq("ADD R0, R1, #-3")
        );
        expect_that!(
            Operation::from(0b0000_101_000000100).to_string(),
            eq("BRnp #4")
        );
        expect_that!(Operation::from(0xC1C0).to_string(), eq("RET"));
        expect_that!(Operation::from(0xF025).to_string(), eq("TRAP x25"));
    }
}
