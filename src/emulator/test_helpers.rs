use crate::emulator::Emulator;
use crate::hardware::Console;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;

/// Shared view on everything a [`FakeConsole`] displayed.
#[derive(Clone, Default)]
pub struct StringWriter {
    vec: Rc<RefCell<Vec<u8>>>,
}
impl StringWriter {
    pub fn get_string(&self) -> String {
        String::from_utf8(self.vec.borrow().clone()).unwrap()
    }
}

/// Console with scripted keyboard input and captured display output.
pub struct FakeConsole {
    input: VecDeque<u8>,
    output: StringWriter,
    read_error: Option<&'static str>,
    interrupted: bool,
}
impl FakeConsole {
    pub fn new(input: &[u8]) -> Self {
        Self {
            input: input.iter().copied().collect(),
            output: StringWriter::default(),
            read_error: None,
            interrupted: false,
        }
    }
    pub fn with_read_error(message: &'static str) -> Self {
        Self {
            read_error: Some(message),
            ..Self::new(b"")
        }
    }
    pub fn interrupted() -> Self {
        Self {
            interrupted: true,
            ..Self::new(b"")
        }
    }
    pub fn output(&self) -> StringWriter {
        self.output.clone()
    }
}
impl Console for FakeConsole {
    fn poll_input(&mut self) -> io::Result<Option<u8>> {
        self.read_input()
    }
    fn read_input(&mut self) -> io::Result<Option<u8>> {
        match self.read_error {
            Some(message) => Err(io::Error::other(message)),
            None => Ok(self.input.pop_front()),
        }
    }
    fn emit(&mut self, byte: u8) -> io::Result<()> {
        self.output.vec.borrow_mut().push(byte);
        Ok(())
    }
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
    fn is_interrupted(&self) -> bool {
        self.interrupted
    }
}

/// Emulator with `program_no_header` loaded at `0x3000`, keyboard input `stdin`
/// and a handle to its display output.
pub fn fake_emulator(program_no_header: &[u16], stdin: &[u8]) -> (Emulator, StringWriter) {
    let console = FakeConsole::new(stdin);
    let output = console.output();
    let mut emu = Emulator::new(Box::new(console));
    let mut program = Vec::with_capacity(program_no_header.len() + 1);
    program.push(0x3000u16);
    program.extend_from_slice(program_no_header);
    emu.load_program(&program).unwrap();
    (emu, output)
}
