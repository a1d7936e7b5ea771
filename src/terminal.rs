//! The host terminal as LC-3 keyboard and display.
use crate::hardware::Console;
use crossterm::event::{Event, KeyCode, KeyEventKind, KeyModifiers, poll, read};
use crossterm::terminal;
use std::io::{self, IsTerminal, Read, Stdin, Stdout, Write};
use std::time::Duration;

pub struct RawLock {}

impl Drop for RawLock {
    fn drop(&mut self) {
        // terminal stays in raw mode but no means to repair
        if let Err(e) = terminal::disable_raw_mode() {
            eprintln!("Error resetting terminal {e}");
        }
    }
}

/// Set terminal to raw in best-effort mode, only log on failure, since it does not work for
/// cargo doc tests.
#[must_use]
pub fn set_terminal_raw() -> Option<RawLock> {
    match terminal::enable_raw_mode() {
        Ok(()) => Some(RawLock {}),
        Err(e) => {
            log::warn!("Could not set terminal to raw mode: {e}");
            None
        }
    }
}

/// Writes one log line ending in `\r\n`, so lines stay aligned while the terminal is raw.
///
/// # Errors
/// - writing to `out` failed
pub fn write_log_line(out: &mut impl Write, record: &log::Record<'_>) -> io::Result<()> {
    write!(
        out,
        "[{} {}] {}\r\n",
        record.level(),
        record.target(),
        record.args()
    )
}

enum Input {
    /// Key presses through crossterm events, stdin is in raw mode.
    Keyboard { _raw: Option<RawLock> },
    /// Bytes piped into stdin.
    Piped(Stdin),
    /// No input at all.
    Closed,
}

/// [`Console`] on stdin and stdout of the process.
pub struct TerminalConsole {
    input: Input,
    stdout: Stdout,
    is_interrupted: bool,
}

impl TerminalConsole {
    /// Uses key presses if stdin is a terminal, otherwise the bytes piped into stdin.
    #[must_use]
    pub fn new() -> Self {
        let stdin = io::stdin();
        let input = if stdin.is_terminal() {
            Input::Keyboard {
                _raw: set_terminal_raw(),
            }
        } else {
            Input::Piped(stdin)
        };
        Self::with_input(input)
    }
    /// Writes to stdout but never provides input, leaves the terminal mode alone.
    #[must_use]
    pub fn detached() -> Self {
        Self::with_input(Input::Closed)
    }
    fn with_input(input: Input) -> Self {
        Self {
            input,
            stdout: io::stdout(),
            is_interrupted: false,
        }
    }
    const fn is_raw(&self) -> bool {
        matches!(self.input, Input::Keyboard { _raw: Some(_) })
    }

    /// Translates a terminal event into an input character, CTRL-C marks the console as
    /// interrupted.
    fn key_to_char(&mut self, event: &Event) -> Option<u8> {
        let Event::Key(key) = event else {
            return None;
        };
        if key.kind == KeyEventKind::Release {
            return None;
        }
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.is_interrupted = true;
                None
            }
            KeyCode::Char(c) => u8::try_from(c).ok().filter(u8::is_ascii),
            KeyCode::Enter => Some(b'\n'),
            KeyCode::Backspace => Some(0x08),
            KeyCode::Tab => Some(b'\t'),
            KeyCode::Esc => Some(0x1B),
            _ => None,
        }
    }

    fn read_piped_byte(stdin: &mut Stdin) -> io::Result<Option<u8>> {
        let mut b = [0; 1];
        match stdin.read(&mut b)? {
            0 => Ok(None),
            _ => Ok(Some(b[0])),
        }
    }
}

impl Default for TerminalConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl Console for TerminalConsole {
    fn poll_input(&mut self) -> io::Result<Option<u8>> {
        match self.input {
            Input::Keyboard { .. } => {
                while !self.is_interrupted && poll(Duration::from_secs(0))? {
                    let event = read()?;
                    if let Some(c) = self.key_to_char(&event) {
                        return Ok(Some(c));
                    }
                }
                Ok(None)
            }
            // a pipe is never waiting for a user, reading blocks at most until EOF
            Input::Piped(ref mut stdin) => Self::read_piped_byte(stdin),
            Input::Closed => Ok(None),
        }
    }
    fn read_input(&mut self) -> io::Result<Option<u8>> {
        match self.input {
            Input::Keyboard { .. } => {
                while !self.is_interrupted {
                    let event = read()?;
                    if let Some(c) = self.key_to_char(&event) {
                        return Ok(Some(c));
                    }
                }
                Ok(None)
            }
            Input::Piped(ref mut stdin) => Self::read_piped_byte(stdin),
            Input::Closed => Ok(None),
        }
    }
    fn emit(&mut self, byte: u8) -> io::Result<()> {
        if byte == b'\n' && self.is_raw() {
            self.stdout.write_all(b"\r\n")
        } else {
            self.stdout.write_all(&[byte])
        }
    }
    fn flush(&mut self) -> io::Result<()> {
        self.stdout.flush()
    }
    fn is_interrupted(&self) -> bool {
        self.is_interrupted
    }
}
