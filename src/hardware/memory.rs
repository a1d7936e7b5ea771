use crate::errors::LoadProgramError;
use crate::hardware::console::Console;
use std::fmt::{Debug, Formatter};
use std::io;

pub const PROGRAM_SECTION_START: u16 = 0x3000;
pub const MEMORY_SIZE: usize = 1 << u16::BITS;

/// Memory regions mapped to IO functionality.
#[repr(u16)]
#[derive(enumn::N, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryMappedIOLocations {
    /// Keyboard Status Register
    Kbsr = 0xFE00,
    /// Keyboard Data Register
    Kbdr = 0xFE02,
    /// Display Status Register
    Dsr = 0xFE04,
    /// Display Data Register
    Ddr = 0xFE06,
}

/// The complete 16-bit address space of the LC-3, plain storage apart from the
/// [`MemoryMappedIOLocations`] which are backed by a [`Console`].
pub struct Memory {
    /// Index equals memory address
    data: Vec<u16>,
    console: Box<dyn Console>,
}

impl Debug for Memory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let used = self.data.iter().filter(|w| **w != 0).count();
        write!(f, "Memory {{ non-zero words: {used} }}")
    }
}

impl Memory {
    pub const STATUS_REGISTER_SET: u16 = 1 << 15;
    pub const STATUS_REGISTER_UNSET: u16 = 0;

    /// Zeroed memory with the display marked as ready.
    #[must_use]
    pub fn new(console: Box<dyn Console>) -> Self {
        let mut data = vec![0x0u16; MEMORY_SIZE];
        data[usize::from(MemoryMappedIOLocations::Dsr as u16)] = Self::STATUS_REGISTER_SET;
        Self { data, console }
    }

    /// Reads the word at `address`.
    ///
    /// Reading the keyboard status register polls the console unless a previously polled
    /// character has not been read from the keyboard data register yet. Reading the keyboard
    /// data register marks that character as consumed.
    ///
    /// # Errors
    /// - polling the console failed
    pub fn read(&mut self, address: u16) -> io::Result<u16> {
        match MemoryMappedIOLocations::n(address) {
            Some(MemoryMappedIOLocations::Kbsr) => {
                if self.cell(MemoryMappedIOLocations::Kbsr) == Self::STATUS_REGISTER_UNSET
                    && let Some(c) = self.console.poll_input()?
                {
                    self.set_cell(MemoryMappedIOLocations::Kbsr, Self::STATUS_REGISTER_SET);
                    self.set_cell(MemoryMappedIOLocations::Kbdr, u16::from(c));
                }
                Ok(self.cell(MemoryMappedIOLocations::Kbsr))
            }
            Some(MemoryMappedIOLocations::Kbdr) => {
                self.set_cell(MemoryMappedIOLocations::Kbsr, Self::STATUS_REGISTER_UNSET);
                Ok(self.cell(MemoryMappedIOLocations::Kbdr))
            }
            Some(MemoryMappedIOLocations::Dsr | MemoryMappedIOLocations::Ddr) | None => {
                Ok(self.peek(address))
            }
        }
    }

    /// Writes `value` to `address`; a write to the display data register also emits its
    /// low byte on the console.
    ///
    /// # Errors
    /// - writing to the console failed
    pub fn write(&mut self, address: u16, value: u16) -> io::Result<()> {
        self.data[usize::from(address)] = value;
        if MemoryMappedIOLocations::n(address) == Some(MemoryMappedIOLocations::Ddr) {
            let [_, low] = value.to_be_bytes();
            self.console.emit(low)?;
            self.console.flush()?;
        }
        Ok(())
    }

    /// Stored value at `address` without any device side effects.
    #[must_use]
    pub fn peek(&self, address: u16) -> u16 {
        self.data[usize::from(address)]
    }

    /// Copies `data` into memory starting at `origin`.
    ///
    /// # Errors
    /// - Program too long, it would not end before the end of the address space
    pub fn load(&mut self, origin: u16, data: &[u16]) -> Result<(), LoadProgramError> {
        let start = usize::from(origin);
        let maximum_instructions = MEMORY_SIZE - start;
        if data.len() > maximum_instructions {
            return Err(LoadProgramError::ProgramTooLong {
                origin,
                actual_instructions: data.len(),
                maximum_instructions,
            });
        }
        self.data[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }

    /// Character latched by a keyboard status read but not yet read from the keyboard data
    /// register. Taking it clears the keyboard status.
    pub fn take_pending_key(&mut self) -> Option<u8> {
        if self.cell(MemoryMappedIOLocations::Kbsr) == Self::STATUS_REGISTER_UNSET {
            return None;
        }
        self.set_cell(MemoryMappedIOLocations::Kbsr, Self::STATUS_REGISTER_UNSET);
        let [_, c] = self.cell(MemoryMappedIOLocations::Kbdr).to_be_bytes();
        Some(c)
    }

    pub fn console(&mut self) -> &mut dyn Console {
        self.console.as_mut()
    }
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        self.console.is_interrupted()
    }

    fn cell(&self, location: MemoryMappedIOLocations) -> u16 {
        self.data[usize::from(location as u16)]
    }
    fn set_cell(&mut self, location: MemoryMappedIOLocations, value: u16) {
        self.data[usize::from(location as u16)] = value;
    }
}
