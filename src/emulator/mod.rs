pub mod instruction;
pub mod opcodes;
#[cfg(test)]
pub(crate) mod test_helpers;
pub mod trap_routines;

use crate::errors::{ExecutionError, LoadProgramError};
use crate::hardware::memory::PROGRAM_SECTION_START;
use crate::hardware::{Console, Memory, Registers};
use instruction::{Instruction, OpCode, Operation};
use log::{debug, info, trace, warn};
use std::fs;
use std::io;
use std::ops::ControlFlow;
use std::path::Path;
use trap_routines::TrapVector;

/// Whether the machine accepts further instructions.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RunState {
    Running,
    Halted,
}

/// The public facing emulator used to run LC-3 programs.
///
/// Owns the complete machine state, memory and registers, so independent instances
/// can run side by side.
pub struct Emulator {
    memory: Memory,
    registers: Registers,
    state: RunState,
    entry_point: Option<u16>,
}

impl Emulator {
    /// A machine with zeroed memory and registers, `PC` at `0x3000`,
    /// doing all I/O through `console`.
    #[must_use]
    pub fn new(console: Box<dyn Console>) -> Self {
        Self {
            memory: Memory::new(console),
            registers: Registers::new(),
            state: RunState::Running,
            entry_point: None,
        }
    }

    /// Copies `words` into memory starting at `origin`.
    ///
    /// The first image loaded defines where execution starts.
    ///
    /// # Errors
    /// - Program too long to fit between `origin` and the end of memory
    pub fn load(&mut self, origin: u16, words: &[u16]) -> Result<(), LoadProgramError> {
        self.memory.load(origin, words)?;
        info!(
            "Loaded {} words at {origin:#06X}..{:#06X}",
            words.len(),
            usize::from(origin) + words.len()
        );
        if self.entry_point.is_none() {
            self.entry_point = Some(origin);
            self.registers.set_pc(origin);
        }
        Ok(())
    }

    /// Loads a program whose first word is its origin (`.ORIG` header).
    ///
    /// # Errors
    /// - Program is missing valid .ORIG header (because it is shorter than one `u16` instruction)
    /// - Program too long
    pub fn load_program(&mut self, program: &[u16]) -> Result<(), LoadProgramError> {
        let Some((origin, rest)) = program.split_first() else {
            return Err(LoadProgramError::ProgramMissingOrigHeader);
        };
        self.load(*origin, rest)
    }

    /// Loads an object file image: big-endian `u16` words, the first being the origin.
    ///
    /// # Errors
    /// - Program is not a whole number of words
    /// - See [`Emulator::load_program`]
    pub fn load_image_bytes(&mut self, image: &[u8]) -> Result<(), LoadProgramError> {
        if image.len() % 2 != 0 {
            return Err(LoadProgramError::ProgramTruncated {
                byte_count: image.len(),
            });
        }
        let words: Vec<u16> = image
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        self.load_program(&words)
    }

    /// Reads and loads the object file at `path`.
    ///
    /// # Errors
    /// - File cannot be read
    /// - See [`Emulator::load_image_bytes`]
    pub fn load_image_file(&mut self, path: impl AsRef<Path>) -> Result<(), LoadProgramError> {
        let path = path.as_ref();
        let image = fs::read(path).map_err(|e| LoadProgramError::ProgramNotReadable {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        debug!("Read {} bytes from {}", image.len(), path.display());
        self.load_image_bytes(&image)
    }

    /// Runs until `HALT`.
    ///
    /// # Errors
    /// - Reserved op code or unknown trap vector executed
    /// - Console input or output failed
    /// - Interrupted with CTRL-C
    pub fn execute(&mut self) -> Result<(), ExecutionError> {
        loop {
            if self.memory.is_interrupted() {
                self.state = RunState::Halted;
                return Err(ExecutionError::Interrupted);
            }
            if let ControlFlow::Break(res) = self.step() {
                return res;
            }
        }
    }

    /// Fetches, decodes and executes the instruction at `PC`.
    ///
    /// `Break` once the machine is halted, with the fault that stopped it if any.
    pub fn step(&mut self) -> ControlFlow<Result<(), ExecutionError>> {
        if self.state == RunState::Halted {
            return ControlFlow::Break(Ok(()));
        }
        let address = self.registers.pc().as_binary();
        let bits = match self.memory.read(address) {
            Ok(bits) => bits,
            Err(e) => return self.stop(Err(e.into())),
        };
        self.registers.inc_pc();
        let operation = Operation::from(Instruction::from(bits));
        trace!("{address:#06X}: {operation}");
        match self.execute_operation(operation, address) {
            ControlFlow::Continue(()) => ControlFlow::Continue(()),
            ControlFlow::Break(res) => self.stop(res),
        }
    }

    fn execute_operation(
        &mut self,
        operation: Operation,
        address: u16,
    ) -> ControlFlow<Result<(), ExecutionError>> {
        let r = &mut self.registers;
        let mem = &mut self.memory;
        let memory_access: io::Result<()> = match operation {
            Operation::Add { dr, sr1, operand } => {
                opcodes::add(dr, sr1, operand, r);
                Ok(())
            }
            Operation::And { dr, sr1, operand } => {
                opcodes::and(dr, sr1, operand, r);
                Ok(())
            }
            Operation::Not { dr, sr } => {
                opcodes::not(dr, sr, r);
                Ok(())
            }
            Operation::Br { nzp, pc_offset } => {
                opcodes::br(nzp, pc_offset, r);
                Ok(())
            }
            Operation::Jmp { base_r } => {
                opcodes::jmp_or_ret(base_r, r);
                Ok(())
            }
            Operation::Jsr { target } => {
                opcodes::jsr(target, r);
                Ok(())
            }
            Operation::Lea { dr, pc_offset } => {
                opcodes::lea(dr, pc_offset, r);
                Ok(())
            }
            Operation::Ld { dr, pc_offset } => opcodes::ld(dr, pc_offset, r, mem),
            Operation::Ldi { dr, pc_offset } => opcodes::ldi(dr, pc_offset, r, mem),
            Operation::Ldr { dr, base_r, offset } => opcodes::ldr(dr, base_r, offset, r, mem),
            Operation::St { sr, pc_offset } => opcodes::st(sr, pc_offset, r, mem),
            Operation::Sti { sr, pc_offset } => opcodes::sti(sr, pc_offset, r, mem),
            Operation::Str { sr, base_r, offset } => opcodes::str(sr, base_r, offset, r, mem),
            Operation::Trap { vector } => {
                r.set(7, r.pc());
                let Some(trap) = TrapVector::n(vector) else {
                    warn!("Unknown trap vector {vector:#04X} at {address:#06X}");
                    return ControlFlow::Break(Err(ExecutionError::UnknownTrapVector {
                        vector,
                        address,
                    }));
                };
                debug!("Trap {trap:?} at {address:#06X}");
                return trap_routines::dispatch(trap, r, mem);
            }
            Operation::Rti | Operation::Res => {
                let op_code: OpCode = operation.op_code();
                warn!("Reserved op code {op_code:?} at {address:#06X}");
                return ControlFlow::Break(Err(ExecutionError::ReservedOpCode {
                    op_code: op_code as u8,
                    address,
                }));
            }
        };
        match memory_access {
            Ok(()) => ControlFlow::Continue(()),
            Err(e) => ControlFlow::Break(Err(e.into())),
        }
    }

    fn stop(
        &mut self,
        res: Result<(), ExecutionError>,
    ) -> ControlFlow<Result<(), ExecutionError>> {
        self.state = RunState::Halted;
        match &res {
            Ok(()) => info!("Halted, {:?}", self.registers),
            Err(e) => warn!("Stopped with error: {e}, {:?}", self.registers),
        }
        ControlFlow::Break(res)
    }

    /// Zeroes all registers and moves `PC` back to where the first loaded image starts,
    /// memory stays untouched. The machine accepts instructions again.
    pub fn reset_registers(&mut self) {
        self.registers = Registers::new();
        self.registers
            .set_pc(self.entry_point.unwrap_or(PROGRAM_SECTION_START));
        self.state = RunState::Running;
    }

    #[must_use]
    pub const fn registers(&self) -> &Registers {
        &self.registers
    }
    pub const fn registers_mut(&mut self) -> &mut Registers {
        &mut self.registers
    }
    #[must_use]
    pub const fn memory(&self) -> &Memory {
        &self.memory
    }
    pub const fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }
    #[must_use]
    pub const fn state(&self) -> RunState {
        self.state
    }
    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.state == RunState::Halted
    }
}
