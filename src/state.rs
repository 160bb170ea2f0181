use crate::constants::{MEMORY_SIZE, PROGRAM_START, REGISTER_COUNT, SPRITE_SHEET};
use crate::error::Chip8Error;
use crate::frame::FrameBuffer;

/// The machine state the instruction set operates on
///
/// ## CPU
/// Registers
/// - (v) 16 primary 8-bit registers (V0..VF)
///     - the first 15 (V0..VE) are general purpose registers
///     - the 16th (VF) is the carry flag
/// - (i) a 16-bit memory address register, never masked to 12 bits
///
/// Counter
/// - (pc) a 16-bit program counter
///
/// Timers
/// - 2 8-bit timers (delay & sound), decremented once per tick
///
/// ## Memory
/// - a call stack of return addresses, optionally bounded by `Config::stack_limit`
/// - 4096 bytes of addressable memory
///     - 0x000..0x050 holds the font sprite sheet
///     - programs are loaded at 0x200
/// - a frame buffer holding the contents of the next frame to be drawn
///
/// ## Input
/// - emulation halts while `register_needing_key` is Some register
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    pub v: [u8; REGISTER_COUNT],
    pub i: u16,
    pub pc: u16,
    pub stack: Vec<u16>,
    pub delay_timer: u8,
    pub sound_timer: u8,
    pub memory: [u8; MEMORY_SIZE],
    pub frame_buffer: FrameBuffer,
    pub register_needing_key: Option<u8>,
}

impl State {
    pub fn new() -> Self {
        State::with_frame_buffer(FrameBuffer::default())
    }

    pub fn with_frame_buffer(frame_buffer: FrameBuffer) -> Self {
        let mut memory = [0; MEMORY_SIZE];
        memory[0..SPRITE_SHEET.len()].copy_from_slice(&SPRITE_SHEET);

        State {
            v: [0; REGISTER_COUNT],
            i: 0,
            pc: PROGRAM_START,
            stack: Vec::new(),
            delay_timer: 0,
            sound_timer: 0,
            memory,
            frame_buffer,
            register_needing_key: None,
        }
    }

    /// Memory from `start` for `len` bytes, or the first address that doesn't exist
    pub fn memory_range(&self, start: usize, len: usize) -> Result<&[u8], Chip8Error> {
        check_range(start, len)?;
        Ok(&self.memory[start..start + len])
    }

    pub fn memory_range_mut(&mut self, start: usize, len: usize) -> Result<&mut [u8], Chip8Error> {
        check_range(start, len)?;
        Ok(&mut self.memory[start..start + len])
    }

    /// Decrements both timers, stopping at 0
    pub fn advance_timers(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
        self.sound_timer = self.sound_timer.saturating_sub(1);
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

fn check_range(start: usize, len: usize) -> Result<(), Chip8Error> {
    if start + len > MEMORY_SIZE {
        let address = start.max(MEMORY_SIZE);
        return Err(Chip8Error::AddressOutOfBounds { address });
    }
    Ok(())
}
