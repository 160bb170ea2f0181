/// Bytes of addressable memory
pub const MEMORY_SIZE: usize = 4096;

/// Where programs are copied to and where the program counter starts
pub const PROGRAM_START: u16 = 0x200;

/// The largest program image that fits between `PROGRAM_START` and the end of memory
pub const MAX_ROM_SIZE: usize = MEMORY_SIZE - PROGRAM_START as usize;

pub const REGISTER_COUNT: usize = 16;
pub const KEY_COUNT: usize = 16;

/// Index of VF, the carry/borrow/collision flag register
pub const FLAG: usize = 0xF;

pub const DISPLAY_WIDTH: usize = 64;
pub const DISPLAY_HEIGHT: usize = 32;

/// Sprites are always 8 pixels wide
pub const SPRITE_WIDTH: usize = 8;

/// Classic depth of the call stack; only enforced through `Config::classic`
pub const CLASSIC_STACK_LIMIT: usize = 16;

pub const INSTRUCTIONS_PER_TICK: usize = 10;
pub const TICKS_PER_SECOND: u32 = 60;
pub const TONE_FREQUENCY: u32 = 480;

/// Bytes per font glyph; Fx29 multiplies the digit by this
pub const GLYPH_SIZE: u16 = 5;

/// # Sprite Sheet
/// Built-in hexadecimal font stored at the start of memory.
/// Each glyph is 5 rows of 4 pixels, the low nibble of every byte is unused.
/// ```text
/// "0"     "1"     "2"     "3"
/// ****      *     ****    ****
/// *  *     **        *       *
/// *  *      *     ****    ****
/// *  *      *     *          *
/// ****     ***    ****    ****
/// ```
pub const SPRITE_SHEET: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];
