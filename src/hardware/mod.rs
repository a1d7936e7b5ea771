pub mod console;
pub mod memory;
pub mod registers;

pub use console::Console;
pub use memory::Memory;
pub use registers::Registers;
