use lc3_vm::emulator::Emulator;
use lc3_vm::errors::ExecutionError;
use lc3_vm::terminal::{self, TerminalConsole};
use std::env;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::Builder::from_default_env()
        .format(|buf, record| terminal::write_log_line(buf, record))
        .init();

    let images: Vec<String> = env::args().skip(1).collect();
    if images.is_empty() {
        eprintln!("lc3-vm [image]...");
        return ExitCode::from(2);
    }

    let mut emu = Emulator::new(Box::new(TerminalConsole::new()));
    for image in &images {
        if let Err(e) = emu.load_image_file(image) {
            drop(emu);
            eprintln!("Failed to load image: {image}: {e}");
            return ExitCode::from(1);
        }
    }
    let res = emu.execute();
    // restores the terminal before anything else is printed
    drop(emu);
    match res {
        Ok(()) => ExitCode::SUCCESS,
        Err(ExecutionError::Interrupted) => {
            eprintln!("{}", ExecutionError::Interrupted);
            ExitCode::from(130)
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
