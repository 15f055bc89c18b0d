mod font;
mod framebuffer;
mod interp;
mod keypad;
mod machine;
mod memory;
mod opcode;
mod registers;
mod runner;
mod timers;
mod types;

pub use framebuffer::*;
pub use keypad::*;
pub use machine::*;
pub use memory::*;
pub use opcode::*;
pub use registers::*;
pub use runner::*;
pub use timers::*;
pub use types::*;
