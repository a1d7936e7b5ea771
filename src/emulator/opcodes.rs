//! Implemented operations for the LC 3.
//!
//! All PC relative addresses are computed from the already incremented PC, i.e. relative to
//! the instruction following the one being executed.
use crate::emulator::instruction::{JumpTarget, Operand};
use crate::hardware::memory::Memory;
use crate::hardware::registers::{Registers, from_binary};
use std::io;

/// ADD: Mathematical addition in 2 variants
/// - DR is set with result of SR 1 + SR 2
/// ```text
///  15__12__11_9__8_6___5___4_3__2_0_
/// | 0001 |  DR | SR1 | 0 | 00 | SR2 |
///  ---------------------------------
/// ```
/// - DR is set with result of SR 1 + sign extended immediate
/// ```text
///  15__12__11_9__8_6___5___4___0_
/// | 0001 |  DR | SR1 | 1 |  IMM5 |
///  ------------------------------
/// ```
pub fn add(dr: u8, sr1: u8, operand: Operand, r: &mut Registers) {
    let value = r
        .get(sr1)
        .as_binary()
        .wrapping_add(operand_value(operand, r));
    r.set(dr, from_binary(value));
    r.update_conditional_register(dr);
}
/// AND: bit-wise AND in 2 variants
/// - DR is set with result of SR 1 AND SR 2
/// ```text
///  15__12__11_9__8_6___5___4_3__2_0_
/// | 0101 |  DR | SR1 | 0 | 00 | SR2 |
///  ---------------------------------
/// ```
/// - DR is set with result of SR 1 AND sign extended immediate
/// ```text
///  15__12__11_9__8_6___5___4___0_
/// | 0101 |  DR | SR1 | 1 |  IMM5 |
///  ------------------------------
/// ```
pub fn and(dr: u8, sr1: u8, operand: Operand, r: &mut Registers) {
    let value = r.get(sr1).as_binary() & operand_value(operand, r);
    r.set(dr, from_binary(value));
    r.update_conditional_register(dr);
}

fn operand_value(operand: Operand, r: &Registers) -> u16 {
    match operand {
        Operand::Register(sr2) => r.get(sr2).as_binary(),
        Operand::Immediate(imm5) => imm5,
    }
}

/// NOT: bit-wise complement of the value in SR
/// ```text
///  15__12__11_9__8_6___5___0_
/// | 1001 |  DR |  SR | 11111 |
///  --------------------------
/// ```
pub fn not(dr: u8, sr: u8, r: &mut Registers) {
    r.set(dr, from_binary(!r.get(sr).as_binary()));
    r.update_conditional_register(dr);
}
/// BR: Conditional Branch
/// This opcode adds the value of the sign extended offset to PC if the current
/// [`ConditionFlag`](crate::hardware::registers::ConditionFlag) matches one of the set
/// `n`, `z` or `p` bits. With no bit set the branch is never taken.
/// ```text
///  15__12__11_9___8_______0_
/// | 0000 |  nzp | PCoffset9 |
///  -------------------------
/// ```
pub fn br(nzp: u16, pc_offset: u16, r: &mut Registers) {
    if nzp & r.get_conditional_register().mask() != 0 {
        r.set_pc(address_by_pc_offset(pc_offset, r));
    }
}
/// JSR: Jump to Sub-Routine.
/// Two variants:
/// - JSR to `PCOffset11`
/// ```text
///  15__12__11_10_________0
/// | 0100 | 1 | PCOffset11 |
///  -----------------------
/// ```
/// - JSRR: JSR to location in `BaseR`
/// ```text
///  15__12__11_9__8___6___5____0_
/// | 0100 | 000 | BaseR | 000000 |
///  -----------------------------
/// ```
/// The former PC is saved in R7.
pub fn jsr(target: JumpTarget, r: &mut Registers) {
    let temp_pc = r.pc();
    r.set_pc(match target {
        JumpTarget::PcOffset(pc_offset) => address_by_pc_offset(pc_offset, r),
        // read before R7 is overwritten, JSRR R7 jumps to the old R7
        JumpTarget::Register(base_r) => r.get(base_r).as_binary(),
    });
    r.set(7, temp_pc);
}
/// JMP or RET operation.
/// - JMP sets the PC to the value of register `BaseR`
/// ```text
///  15__12__11_9___8_6____5____0_
/// | 1100 | 000 | BaseR | 000000 |
///  -----------------------------
/// ```
/// - RET same as JMP, but special case for returning from JSR where former PC is saved in R7.
/// ```text
///  15__12__11_9__8_6___5____0_
/// | 1100 | 000 | 111 | 000000 |
///  ---------------------------
/// ```
pub fn jmp_or_ret(base_r: u8, r: &mut Registers) {
    r.set_pc(r.get(base_r).as_binary());
}

/// LD: Loads content of memory address of PC + sign extended offset into DR.
/// ```text
///  15__12__11_9___8_______0_
/// | 0010 |  DR  | PCoffset9 |
///  -------------------------
/// ```
pub fn ld(dr: u8, pc_offset: u16, r: &mut Registers, memory: &mut Memory) -> io::Result<()> {
    let value = memory.read(address_by_pc_offset(pc_offset, r))?;
    r.set(dr, from_binary(value));
    r.update_conditional_register(dr);
    Ok(())
}

/// LDI: Load indirect.
/// Calculates memory address of PC + sign extended offset and reads another address from there,
/// the content of the memory at that indirectly loaded address is put into DR.
/// ```text
///  15__12__11_9___8_______0_
/// | 1010 |  DR  | PCoffset9 |
///  -------------------------
/// ```
pub fn ldi(dr: u8, pc_offset: u16, r: &mut Registers, memory: &mut Memory) -> io::Result<()> {
    let value_address = memory.read(address_by_pc_offset(pc_offset, r))?;
    r.set(dr, from_binary(memory.read(value_address)?));
    r.update_conditional_register(dr);
    Ok(())
}
/// LDR: Load address from base register and adds sign extended offset to load the memory content
/// from there into DR.
/// ```text
///  15__12__11_9__8___6____5____0_
/// | 0110 |  DR | BaseR | offset6 |
///  ------------------------------
/// ```
pub fn ldr(
    dr: u8,
    base_r: u8,
    offset: u16,
    r: &mut Registers,
    memory: &mut Memory,
) -> io::Result<()> {
    let value = memory.read(address_by_baser_offset(base_r, offset, r))?;
    r.set(dr, from_binary(value));
    r.update_conditional_register(dr);
    Ok(())
}

fn address_by_pc_offset(pc_offset: u16, r: &Registers) -> u16 {
    r.pc().as_binary().wrapping_add(pc_offset)
}
fn address_by_baser_offset(base_r: u8, offset: u16, r: &Registers) -> u16 {
    r.get(base_r).as_binary().wrapping_add(offset)
}

/// LEA: Load Effective Address loads PC + sign extended offset into DR.
/// ```text
///  15__12__11_9___8_______0_
/// | 1110 |  DR  | PCoffset9 |
///  -------------------------
/// ```
pub fn lea(dr: u8, pc_offset: u16, r: &mut Registers) {
    r.set(dr, from_binary(address_by_pc_offset(pc_offset, r)));
    r.update_conditional_register(dr);
}
/// ST: Store. The contents of the SR are written to memory address PC + sign extended offset.
/// ```text
///  15__12__11_9___8_______0_
/// | 0011 |  SR  | PCoffset9 |
///  -------------------------
/// ```
pub fn st(sr: u8, pc_offset: u16, r: &Registers, memory: &mut Memory) -> io::Result<()> {
    memory.write(address_by_pc_offset(pc_offset, r), r.get(sr).as_binary())
}
/// STI: Store Indirect. The contents of the SR are written to the address which is loaded from
/// memory address PC + sign extended offset.
/// ```text
///  15__12__11_9___8_______0_
/// | 1011 |  SR  | PCoffset9 |
///  -------------------------
/// ```
pub fn sti(sr: u8, pc_offset: u16, r: &Registers, memory: &mut Memory) -> io::Result<()> {
    let store_address = memory.read(address_by_pc_offset(pc_offset, r))?;
    memory.write(store_address, r.get(sr).as_binary())
}
/// STR: Store contents of SR to memory address of base register plus sign extended offset.
/// ```text
///  15__12__11_9__8___6____5____0_
/// | 0111 |  SR | BaseR | offset6 |
///  ------------------------------
/// ```
pub fn str(sr: u8, base_r: u8, offset: u16, r: &Registers, memory: &mut Memory) -> io::Result<()> {
    memory.write(
        address_by_baser_offset(base_r, offset, r),
        r.get(sr).as_binary(),
    )
}

#[expect(clippy::unusual_byte_groupings)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::emulator::instruction::Operation;
    use crate::emulator::test_helpers::FakeConsole;
    use crate::hardware::registers::{ConditionFlag, from_decimal};
    use googletest::prelude::*;

    fn create_memory(data: &[u16]) -> Memory {
        let mut mem = Memory::new(Box::new(FakeConsole::new(b"")));
        mem.load(0x3000, data).expect("Error loading program");
        mem
    }

    #[gtest]
    pub fn test_opcode_add() {
        let mut regs = Registers::new();
        regs.set(0, from_binary(22));
        regs.set(1, from_binary(128));
        // Add: DR: 2, SR1: 0: 22, Immediate: false, SR2: 1: 128 => R2: 150
        add(2, 0, Operand::Register(1), &mut regs);
        // Add: DR: 3, SR1: 2: 150, Immediate: true, imm5: 14 => R3: 164
        add(3, 2, Operand::Immediate(14), &mut regs);
        expect_that!(regs.get(0), eq(from_binary(22)));
        expect_that!(regs.get(1), eq(from_binary(128)));
        expect_that!(regs.get(2), eq(from_binary(150)));
        expect_that!(regs.get(3), eq(from_binary(164)));
        expect_that!(regs.get_conditional_register(), eq(ConditionFlag::Pos));
    }
    #[gtest]
    pub fn test_opcode_add_immediate_decoded() {
        let mut regs = Registers::new();
        regs.set(1, from_binary(5));
        // ADD R0, R1, #3
        let Operation::Add { dr, sr1, operand } = Operation::from(0b0001_000_001_1_00011) else {
            panic!("not decoded as ADD");
        };
        add(dr, sr1, operand, &mut regs);
        expect_that!(regs.get(0), eq(from_binary(8)));
        expect_that!(regs.get_conditional_register(), eq(ConditionFlag::Pos));
    }
    #[gtest]
    pub fn test_opcode_add_negative() {
        let mut regs = Registers::new();
        regs.set(0, from_binary(22));
        regs.set(1, from_decimal(-128));
        // Add: DR: 2, SR1: 0: 22, Immediate: false, SR2: 1: -128 => R2: -106
        add(2, 0, Operand::Register(1), &mut regs);
        // Add: DR: 3, SR1: 2: -106, Immediate: true, imm5: -2 => R3: -108
        add(3, 2, Operand::Immediate(from_decimal(-2).as_binary()), &mut regs);
        expect_that!(regs.get(1), eq(from_binary(0b1111_1111_1000_0000)));
        expect_that!(regs.get(2).as_decimal(), eq(-106));
        expect_that!(regs.get(3).as_decimal(), eq(-108));
        expect_that!(regs.get_conditional_register(), eq(ConditionFlag::Neg));
    }
    #[gtest]
    pub fn test_opcode_add_overflow() {
        let mut regs = Registers::new();
        regs.set(0, from_binary(0x7FFF)); // largest positive number in 2's complement
        regs.set(1, from_binary(1));
        add(2, 0, Operand::Register(1), &mut regs);
        expect_that!(regs.get(2), eq(from_binary(0x8000)));
        expect_that!(regs.get_conditional_register(), eq(ConditionFlag::Neg));
        // wraps around to 0
        regs.set(3, from_binary(0xFFFF));
        add(4, 3, Operand::Register(1), &mut regs);
        expect_that!(regs.get(4), eq(from_binary(0)));
        expect_that!(regs.get_conditional_register(), eq(ConditionFlag::Zero));
    }
    #[gtest]
    pub fn test_opcode_and() {
        let mut regs = Registers::new();
        regs.set(1, from_binary(0b1100));
        regs.set(2, from_binary(0b1010));
        and(0, 1, Operand::Register(2), &mut regs);
        expect_that!(regs.get(0), eq(from_binary(0b1000)));
        expect_that!(regs.get_conditional_register(), eq(ConditionFlag::Pos));
    }
    #[gtest]
    pub fn test_opcode_and_immediate() {
        let mut regs = Registers::new();
        regs.set(0, from_binary(0b1101_1001_0111_0101));
        // Immediate sign extended: 0b1111_1111_1111_0101
        and(2, 0, Operand::Immediate(0b1111_1111_1111_0101), &mut regs);
        expect_that!(regs.get(2), eq(from_binary(0b1101_1001_0111_0101)));
        expect_that!(regs.get_conditional_register(), eq(ConditionFlag::Neg));
        and(2, 0, Operand::Immediate(0), &mut regs);
        expect_that!(regs.get(2), eq(from_binary(0)));
        expect_that!(regs.get_conditional_register(), eq(ConditionFlag::Zero));
    }
    #[gtest]
    pub fn test_opcode_not() {
        let mut regs = Registers::new();
        regs.set(0, from_binary(0x7FFF));
        super::not(1, 0, &mut regs);
        expect_that!(regs.get(0), eq(from_binary(0x7FFF)));
        expect_that!(regs.get(1), eq(from_binary(0x8000)));
        expect_that!(regs.get_conditional_register(), eq(ConditionFlag::Neg));
    }
    #[gtest]
    pub fn test_opcode_br_taken() {
        let mut regs = Registers::new();
        regs.set_pc(0x3010);
        regs.update_flags(0xFFFF);
        br(0b100, 0xFFF0, &mut regs);
        expect_that!(regs.pc().as_binary(), eq(0x3000));
    }
    #[gtest]
    pub fn test_opcode_br_not_taken() {
        let mut regs = Registers::new();
        regs.set_pc(0x3010);
        // COND is Z, mask selects only N and P
        br(0b101, 0x0020, &mut regs);
        expect_that!(regs.pc().as_binary(), eq(0x3010));
        // no bit set never branches
        br(0b000, 0x0020, &mut regs);
        expect_that!(regs.pc().as_binary(), eq(0x3010));
        br(0b111, 0x0020, &mut regs);
        expect_that!(regs.pc().as_binary(), eq(0x3030));
    }
    #[gtest]
    pub fn test_opcode_lea() {
        let mut regs = Registers::new();
        regs.set_pc(0x3045);
        lea(3, 0b0_0101_0101, &mut regs);
        expect_that!(regs.get(3), eq(from_binary(0x3045 + 0b0_0101_0101)));
        expect_that!(regs.get_conditional_register(), eq(ConditionFlag::Pos));
    }
    #[gtest]
    pub fn test_opcode_ld() {
        let mut regs = Registers::new();
        regs.set_pc(0x3045);
        let mut memory = create_memory(&[4711u16, 815]);
        ld(4, from_decimal(-0x44).as_binary(), &mut regs, &mut memory).unwrap();
        expect_that!(regs.get(4), eq(from_decimal(815)));
        expect_that!(regs.get_conditional_register(), eq(ConditionFlag::Pos));

        ld(4, from_decimal(-0x45).as_binary(), &mut regs, &mut memory).unwrap();
        expect_that!(regs.get(4), eq(from_decimal(4711)));
    }
    #[gtest]
    pub fn test_opcode_ld_zero_sets_zero_flag() {
        let mut regs = Registers::new();
        regs.set_pc(0x3001);
        regs.update_flags(1);
        let mut memory = create_memory(&[0, 0]);
        ld(0, 0, &mut regs, &mut memory).unwrap();
        expect_that!(regs.get_conditional_register(), eq(ConditionFlag::Zero));
    }
    #[gtest]
    pub fn test_opcode_ldr() {
        let mut regs = Registers::new();
        let mut raw = vec![0; 6];
        let mem_val = 0b1111_1111_1111_0110; // -10
        raw[5] = mem_val;
        let mut memory = create_memory(&raw);
        regs.set(6, from_binary(0x3025));
        // LDR - DR: 2, - BaseR: 6, OFFSET6: -32 = -0x20
        ldr(2, 6, 0xFFE0, &mut regs, &mut memory).unwrap();
        expect_that!(regs.get(2), eq(from_binary(mem_val)));
        expect_that!(regs.get_conditional_register(), eq(ConditionFlag::Neg));
    }
    #[gtest]
    pub fn test_opcode_ldi() {
        let mut regs = Registers::new();
        let mut memory = create_memory(&[]);
        memory.write(0x3010, 0x4000).unwrap();
        memory.write(0x4000, 0x1234).unwrap();
        regs.set_pc(0x3001);
        ldi(1, 0x000F, &mut regs, &mut memory).unwrap();
        expect_that!(regs.get(1), eq(from_binary(0x1234)));
        expect_that!(regs.get_conditional_register(), eq(ConditionFlag::Pos));
    }
    #[gtest]
    pub fn test_opcode_st() {
        let mut regs = Registers::new();
        let mut memory = create_memory(&[]);
        regs.set(5, from_decimal(4760));
        regs.set_pc(0x3065);
        // ST - SR: 5, - PC_OFFSET9: -95 = -0x5F
        st(5, from_decimal(-0x5F).as_binary(), &regs, &mut memory).unwrap();
        expect_that!(memory.peek(0x3006), eq(4760));
    }
    #[gtest]
    pub fn test_opcode_sti() {
        let mut regs = Registers::new();
        let mut memory = create_memory(&[]);
        memory.write(0x300A, 0x3006).unwrap();
        regs.set(7, from_decimal(1234));
        regs.set_pc(0x3067);
        // STI - SR: 7, - PC_OFFSET9: -0x5D
        sti(7, from_decimal(-0x5D).as_binary(), &regs, &mut memory).unwrap();
        expect_that!(memory.peek(0x3006), eq(1234));
    }
    #[gtest]
    pub fn test_opcode_str() {
        let mut regs = Registers::new();
        let mut memory = create_memory(&[]);
        regs.set(2, from_decimal(2345));
        regs.set(6, from_binary(0x3005));
        // STR - SR: 2, - BaseR: 6, offset6: 0x1
        str(2, 6, 1, &regs, &mut memory).unwrap();
        expect_that!(memory.peek(0x3006), eq(2345));
    }
    #[gtest]
    pub fn test_opcode_store_does_not_touch_flags() {
        let mut regs = Registers::new();
        let mut memory = create_memory(&[]);
        regs.set(1, from_decimal(-1));
        regs.set(6, from_binary(0x3100));
        str(1, 6, 0, &regs, &mut memory).unwrap();
        expect_that!(regs.get_conditional_register(), eq(ConditionFlag::Zero));
    }
    #[gtest]
    pub fn test_opcode_jsr() {
        let mut regs = Registers::new();
        regs.set_pc(0x3099);
        // JSR - PC_OFFSET11: 0x1A1
        jsr(JumpTarget::PcOffset(0x1A1), &mut regs);
        expect_that!(regs.pc(), eq(from_binary(0x323A)));
        expect_that!(regs.get(7), eq(from_binary(0x3099)));

        let mut regs = Registers::new();
        regs.set_pc(0x3100);
        regs.set(6, from_binary(0x3456));
        // JSRR - BaseR: 6
        jsr(JumpTarget::Register(6), &mut regs);
        expect_that!(regs.pc(), eq(from_binary(0x3456)));
        expect_that!(regs.get(7), eq(from_binary(0x3100)));
    }
    #[gtest]
    pub fn test_opcode_jsrr_r7() {
        let mut regs = Registers::new();
        regs.set_pc(0x3100);
        regs.set(7, from_binary(0x4000));
        jsr(JumpTarget::Register(7), &mut regs);
        expect_that!(regs.pc(), eq(from_binary(0x4000)));
        expect_that!(regs.get(7), eq(from_binary(0x3100)));
    }
    #[gtest]
    pub fn test_opcode_ret() {
        let mut regs = Registers::new();
        regs.set_pc(0x3020);
        regs.set(7, from_binary(0x3022));
        jmp_or_ret(7, &mut regs);
        expect_that!(regs.pc(), eq(from_binary(0x3022)));
    }
}
