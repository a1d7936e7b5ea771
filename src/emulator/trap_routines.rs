//! Operating system services reached through `TRAP`.
//!
//! The routines run natively instead of as LC-3 code behind a trap vector table in memory,
//! so images work without a loaded operating system.
use crate::errors::ExecutionError;
use crate::hardware::memory::{MEMORY_SIZE, Memory};
use crate::hardware::registers::{Registers, from_binary};
use std::io;
use std::ops::ControlFlow;

/// Trap vectors with a service routine.
#[repr(u8)]
#[derive(enumn::N, Debug, Copy, Clone, PartialEq, Eq)]
pub enum TrapVector {
    GetC = 0x20,
    Out = 0x21,
    PutS = 0x22,
    In = 0x23,
    PutSp = 0x24,
    Halt = 0x25,
}

pub const IN_PROMPT: &str = "Input: ";
pub const HALT_MESSAGE: &str = "\nProgram halted\n";

/// Runs the service routine for `vector`. `Break(Ok)` means the machine halted.
pub fn dispatch(
    vector: TrapVector,
    regs: &mut Registers,
    mem: &mut Memory,
) -> ControlFlow<Result<(), ExecutionError>> {
    match vector {
        TrapVector::GetC => get_c(regs, mem),
        TrapVector::Out => out(regs, mem),
        TrapVector::PutS => put_s(regs, mem),
        TrapVector::In => in_trap(regs, mem),
        TrapVector::PutSp => put_sp(regs, mem),
        TrapVector::Halt => halt(mem),
    }
}

/// Blocks for one character and stores it in R0, 0 if the input is exhausted.
/// A character already announced by the keyboard status register is taken first.
fn read_character_from_console(
    regs: &mut Registers,
    mem: &mut Memory,
    echo: bool,
) -> ControlFlow<Result<(), ExecutionError>> {
    // Workaround for still unstable try blocks
    match (|| {
        let c = match mem.take_pending_key() {
            Some(c) => c,
            None => mem.console().read_input()?.unwrap_or(0),
        };
        if echo && c != 0 {
            write_bytes_out(&[c], mem)?;
        }
        regs.set(0, from_binary(u16::from(c)));
        Ok::<(), io::Error>(())
    })() {
        Ok(()) => ControlFlow::Continue(()),
        Err(e) => wrap_io_error_in_cf(&e),
    }
}

/// GETC: Read a single character from the keyboard. The character is not echoed onto the console.
///
/// Its ASCII code is copied into R0. The high eight bits of R0 are cleared.
pub fn get_c(regs: &mut Registers, mem: &mut Memory) -> ControlFlow<Result<(), ExecutionError>> {
    read_character_from_console(regs, mem, false)
}

/// IN: Print a prompt on the screen and read a single character echoed back from the keyboard.
///
/// Otherwise, like 0x20 GETC.
pub fn in_trap(regs: &mut Registers, mem: &mut Memory) -> ControlFlow<Result<(), ExecutionError>> {
    write_str_out(IN_PROMPT, mem)?;
    read_character_from_console(regs, mem, true)
}

/// OUT: Write a character in R0[7:0] to the console display.
pub fn out(regs: &Registers, mem: &mut Memory) -> ControlFlow<Result<(), ExecutionError>> {
    let [_, c] = regs.get(0).as_binary().to_be_bytes();
    write_bytes_out(&[c], mem).map_or_else(|e| wrap_io_error_in_cf(&e), ControlFlow::Continue)
}

fn put_one_char_per_u16(input: u16, append_to: &mut Vec<u8>) -> bool {
    let [_, c] = input.to_be_bytes();
    append_to.push(c);
    true
}

fn put_two_chars_per_u16(input: u16, append_to: &mut Vec<u8>) -> bool {
    let [high, low] = input.to_be_bytes();
    if low == 0 {
        return false;
    }
    append_to.push(low);
    if high == 0 {
        return false;
    }
    append_to.push(high);
    true
}

/// Collects characters from the address in R0 until a zero word, `handle_char` returns
/// `false` if a word ended the string early. Stops after one pass over the whole memory.
fn put(
    regs: &Registers,
    mem: &mut Memory,
    handle_char: fn(u16, &mut Vec<u8>) -> bool,
) -> ControlFlow<Result<(), ExecutionError>> {
    // Workaround for still unstable try blocks
    match (|| {
        let mut address = regs.get(0).as_binary();
        let mut s = Vec::with_capacity(120);
        for _ in 0..MEMORY_SIZE {
            let word = mem.read(address)?;
            if word == 0 || !handle_char(word, &mut s) {
                break;
            }
            address = address.wrapping_add(1);
        }
        write_bytes_out(&s, mem)
    })() {
        Ok(()) => ControlFlow::Continue(()),
        Err(e) => wrap_io_error_in_cf(&e),
    }
}

/// PUTS: print null-delimited char* from register 0's address
pub fn put_s(regs: &Registers, mem: &mut Memory) -> ControlFlow<Result<(), ExecutionError>> {
    put(regs, mem, put_one_char_per_u16)
}

/// PUTSP: Packed version of PUTS
///
/// The ASCII code contained in bits [7:0] of a memory location is written to the console first.
/// The second character of the last memory location can be 0x00.
/// Writing terminates with a 0x000 char.
pub fn put_sp(regs: &Registers, mem: &mut Memory) -> ControlFlow<Result<(), ExecutionError>> {
    put(regs, mem, put_two_chars_per_u16)
}

/// HALT: End program and stdout a message
pub fn halt(mem: &mut Memory) -> ControlFlow<Result<(), ExecutionError>> {
    write_str_out(HALT_MESSAGE, mem)?;
    ControlFlow::Break(Ok(()))
}

fn write_str_out(message: &str, mem: &mut Memory) -> ControlFlow<Result<(), ExecutionError>> {
    match write_bytes_out(message.as_bytes(), mem) {
        Ok(()) => ControlFlow::Continue(()),
        Err(e) => wrap_io_error_in_cf(&e),
    }
}

fn write_bytes_out(bytes: &[u8], mem: &mut Memory) -> io::Result<()> {
    let console = mem.console();
    for b in bytes {
        console.emit(*b)?;
    }
    console.flush()
}

fn wrap_io_error_in_cf(error: &io::Error) -> ControlFlow<Result<(), ExecutionError>, ()> {
    ControlFlow::Break(Err(ExecutionError::IOInputOutputError(error.to_string())))
}
