pub use chip8::Chip8;
pub use config::{Config, Quirks};
pub use drive::{DriveLoop, Pacer};
pub use error::Chip8Error;
pub use frame::FrameBuffer;
pub use keypad::Keypad;
pub use peripherals::{Screen, Silence, Tone};
pub use state::State;

mod chip8;
pub mod config;
pub mod constants;
mod drive;
mod error;
mod frame;
mod instruction;
mod keypad;
mod opcode;
mod operations;
mod peripherals;
pub mod state;
