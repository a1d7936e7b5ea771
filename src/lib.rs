//! # LC-3 Virtual Machine.
//!
//! `lc3-vm` executes programs for the LC-3, a 16-bit educational computer with
//! eight general purpose registers, a program counter and `N`/`Z`/`P` condition flags.
//! Usage starts with creating an [`emulator::Emulator`] around a [`hardware::Console`]
//! and loading one or more program images into it.
//!
//!  # Example
//! ```
//! use lc3_vm::emulator::Emulator;
//! use lc3_vm::hardware::registers::ConditionFlag;
//! use lc3_vm::terminal::TerminalConsole;
//!
//! let mut emu = Emulator::new(Box::new(TerminalConsole::detached()));
//! // .ORIG x3000; AND R0,R0,#0; ADD R0,R0,#5; HALT
//! emu.load_program(&[0x3000, 0x5020, 0x1025, 0xF025]).unwrap();
//! emu.execute().unwrap();
//! assert_eq!(emu.registers().get(0).as_binary(), 5);
//! assert_eq!(emu.registers().get_conditional_register(), ConditionFlag::Pos);
//! ```
//! # Errors
//! - Program is missing valid .ORIG header (because it is shorter than one `u16` instruction)
//! - Program does not fit into memory starting at its origin
//! - Reserved op codes and unknown trap vectors stop execution with an error

pub mod emulator;
pub mod errors;
pub mod hardware;
pub mod numbers;
pub mod terminal;
