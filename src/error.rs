use thiserror::Error;

/// Conditions that halt the engine.
///
/// Every variant is fatal: once a tick returns one, the engine refuses to
/// execute anything else and keeps returning it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Chip8Error {
    #[error("unknown opcode {opcode:#06X}")]
    UnknownOpcode { opcode: u16 },

    #[error("return with an empty call stack")]
    StackUnderflow,

    #[error("call stack exceeded its limit of {limit} return addresses")]
    StackOverflow { limit: usize },

    #[error("memory access out of bounds at address {address:#06X}")]
    AddressOutOfBounds { address: usize },

    #[error("ROM is {size} bytes but at most {max_size} bytes fit in memory")]
    RomTooLarge { size: usize, max_size: usize },

    #[error("unable to read ROM: {0}")]
    RomRead(String),
}
