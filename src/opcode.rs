/// # Opcodes
///
/// Opcodes are two bytes read big-endian from memory. Their behavior is cased on some combination of:
/// - `(n, _, _, _)` the instruction family; applies to all opcodes
/// - `(_, _, _, n)` the operation within the 0x5, 0x8 and 0x9 families
/// - `(_, _, n, n)` the operation within the 0x0, 0xE and 0xF families
///
/// The remaining nibbles are operands.
/// - `(_, n, n, n)` an address, `nnn`
/// - `(_, _, n, n)` a byte of immediate data, `kk`
/// - `(_, n, _, _)` the register Vx, or the range V0..=Vx
/// - `(_, _, n, _)` the register Vy
/// - `(_, _, _, n)` a sprite height, `n`
pub trait Opcode {
    /// All four nibbles, most significant first
    fn nibbles(&self) -> (u8, u8, u8, u8);

    /// `[_x__]`
    fn x(&self) -> u8;

    /// `[__y_]`
    fn y(&self) -> u8;

    /// `[___n]`
    fn n(&self) -> u8;

    /// `[__kk]`
    fn kk(&self) -> u8;

    /// `[_nnn]`
    fn nnn(&self) -> u16;
}

impl Opcode for u16 {
    fn nibbles(&self) -> (u8, u8, u8, u8) {
        ((self >> 12) as u8, self.x(), self.y(), self.n())
    }

    fn x(&self) -> u8 {
        ((self >> 8) & 0xF) as u8
    }

    fn y(&self) -> u8 {
        ((self >> 4) & 0xF) as u8
    }

    fn n(&self) -> u8 {
        (self & 0xF) as u8
    }

    fn kk(&self) -> u8 {
        (self & 0xFF) as u8
    }

    fn nnn(&self) -> u16 {
        self & 0xFFF
    }
}

/// Joins the two bytes of an instruction
pub fn from_bytes(high: u8, low: u8) -> u16 {
    u16::from(high) << 8 | u16::from(low)
}
