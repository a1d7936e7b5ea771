use std::error::Error;
use std::io;

/// Failures while placing a program image into memory.
#[derive(displaydoc::Display, Debug, Clone, PartialEq, Eq)]
pub enum LoadProgramError {
    /// Could not read program image {path}: {message}
    ProgramNotReadable { path: String, message: String },
    /// Program is missing valid .ORIG header
    ProgramMissingOrigHeader,
    /// Program is truncated, got {byte_count} bytes which is not a whole number of u16 words
    ProgramTruncated { byte_count: usize },
    /// Program too long, got {actual_instructions} u16 instructions from origin {origin:#06X} while limit is {maximum_instructions}
    ProgramTooLong {
        origin: u16,
        actual_instructions: usize,
        maximum_instructions: usize,
    },
}
impl Error for LoadProgramError {}

/// Failures that stop the machine before it reaches a `HALT` trap.
#[derive(displaydoc::Display, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    /// Error during reading Stdin or writing program output to Stdout: {0}
    IOInputOutputError(String),
    /// Reserved op code {op_code:#06b} executed at address {address:#06X}
    ReservedOpCode { op_code: u8, address: u16 },
    /// Unknown trap vector {vector:#04X} called at address {address:#06X}
    UnknownTrapVector { vector: u8, address: u16 },
    /// Execution interrupted by user
    Interrupted,
}
impl Error for ExecutionError {}

impl From<io::Error> for ExecutionError {
    fn from(e: io::Error) -> Self {
        Self::IOInputOutputError(e.to_string())
    }
}
