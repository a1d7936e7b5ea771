use std::io;

/// Character device the LC-3 talks to: a keyboard for input and a display for output.
///
/// Implemented for the host terminal by [`crate::terminal::TerminalConsole`].
pub trait Console {
    /// Checks if a character is available and returns it, does not block.
    fn poll_input(&mut self) -> io::Result<Option<u8>>;
    /// Waits for the next character, `None` once input is exhausted.
    fn read_input(&mut self) -> io::Result<Option<u8>>;
    /// Writes one character to the display.
    fn emit(&mut self, byte: u8) -> io::Result<()>;
    fn flush(&mut self) -> io::Result<()>;
    /// True if CTRL-C was triggered
    fn is_interrupted(&self) -> bool;
}
