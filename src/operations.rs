use log::debug;
use rand::rngs::StdRng;
use rand::Rng;

use crate::config::Config;
use crate::constants::{FLAG, GLYPH_SIZE, SPRITE_WIDTH};
use crate::error::Chip8Error;
use crate::keypad::Keypad;
use crate::opcode::Opcode;
use crate::state::State;

/// Everything an operation may consult besides the machine state
pub struct Context<'a> {
    pub keypad: &'a Keypad,
    pub rng: &'a mut StdRng,
    pub config: &'a Config,
}

/// Operations run after the program counter has already moved past them,
/// so skips add another 2 and jumps overwrite it.
pub type Operation = fn(op: &dyn Opcode, state: &mut State, ctx: &mut Context) -> Result<(), Chip8Error>;

fn skip_if(state: &mut State, condition: bool) {
    if condition {
        state.pc = state.pc.wrapping_add(0x2);
    }
}

/// 0nnn: jump to a machine code routine; there is no machine code, so it does nothing
pub fn sys(_op: &dyn Opcode, _state: &mut State, _ctx: &mut Context) -> Result<(), Chip8Error> {
    Ok(())
}

/// Unassigned codes in the 0x8, 0xE and 0xF families are skipped over
pub fn nop(_op: &dyn Opcode, _state: &mut State, _ctx: &mut Context) -> Result<(), Chip8Error> {
    Ok(())
}

/// clear
pub fn clr(_op: &dyn Opcode, state: &mut State, _ctx: &mut Context) -> Result<(), Chip8Error> {
    state.frame_buffer.clear();
    Ok(())
}

/// PC = STACK.pop()
pub fn rts(_op: &dyn Opcode, state: &mut State, _ctx: &mut Context) -> Result<(), Chip8Error> {
    state.pc = state.stack.pop().ok_or(Chip8Error::StackUnderflow)?;
    Ok(())
}

/// PC = addr
pub fn jump(op: &dyn Opcode, state: &mut State, _ctx: &mut Context) -> Result<(), Chip8Error> {
    state.pc = op.nnn();
    Ok(())
}

/// STACK.push(PC); PC = addr
pub fn call(op: &dyn Opcode, state: &mut State, ctx: &mut Context) -> Result<(), Chip8Error> {
    if let Some(limit) = ctx.config.stack_limit {
        if state.stack.len() >= limit {
            return Err(Chip8Error::StackOverflow { limit });
        }
    }
    state.stack.push(state.pc);
    state.pc = op.nnn();
    Ok(())
}

/// if Vx == kk then pc += 2
pub fn ske(op: &dyn Opcode, state: &mut State, _ctx: &mut Context) -> Result<(), Chip8Error> {
    let condition = state.v[op.x() as usize] == op.kk();
    skip_if(state, condition);
    Ok(())
}

/// if Vx != kk then pc += 2
pub fn skne(op: &dyn Opcode, state: &mut State, _ctx: &mut Context) -> Result<(), Chip8Error> {
    let condition = state.v[op.x() as usize] != op.kk();
    skip_if(state, condition);
    Ok(())
}

/// if Vx == Vy then pc += 2
pub fn skre(op: &dyn Opcode, state: &mut State, _ctx: &mut Context) -> Result<(), Chip8Error> {
    let condition = state.v[op.x() as usize] == state.v[op.y() as usize];
    skip_if(state, condition);
    Ok(())
}

/// Vx = kk
pub fn load(op: &dyn Opcode, state: &mut State, _ctx: &mut Context) -> Result<(), Chip8Error> {
    state.v[op.x() as usize] = op.kk();
    Ok(())
}

/// Vx += kk
/// Overflow is dropped and VF is left alone
pub fn add(op: &dyn Opcode, state: &mut State, _ctx: &mut Context) -> Result<(), Chip8Error> {
    let x = op.x() as usize;
    state.v[x] = state.v[x].wrapping_add(op.kk());
    Ok(())
}

/// Vx = Vy
pub fn mv(op: &dyn Opcode, state: &mut State, _ctx: &mut Context) -> Result<(), Chip8Error> {
    state.v[op.x() as usize] = state.v[op.y() as usize];
    Ok(())
}

/// Vx |= Vy
pub fn or(op: &dyn Opcode, state: &mut State, _ctx: &mut Context) -> Result<(), Chip8Error> {
    state.v[op.x() as usize] |= state.v[op.y() as usize];
    Ok(())
}

/// Vx &= Vy
pub fn and(op: &dyn Opcode, state: &mut State, _ctx: &mut Context) -> Result<(), Chip8Error> {
    state.v[op.x() as usize] &= state.v[op.y() as usize];
    Ok(())
}

/// Vx ^= Vy
pub fn xor(op: &dyn Opcode, state: &mut State, _ctx: &mut Context) -> Result<(), Chip8Error> {
    state.v[op.x() as usize] ^= state.v[op.y() as usize];
    Ok(())
}

/// Vx += Vy; VF = 0
///
/// The carry is checked after the sum has already been truncated,
/// which never succeeds. `Quirks::add_sets_carry` restores the real carry.
pub fn addr(op: &dyn Opcode, state: &mut State, ctx: &mut Context) -> Result<(), Chip8Error> {
    let (x, y) = (op.x() as usize, op.y() as usize);
    let (sum, carry) = state.v[x].overflowing_add(state.v[y]);
    state.v[x] = sum;
    state.v[FLAG] = if ctx.config.quirks.add_sets_carry && carry {
        0x1
    } else {
        0x0
    };
    Ok(())
}

/// VF = Vx > Vy; Vx -= Vy
pub fn sub(op: &dyn Opcode, state: &mut State, _ctx: &mut Context) -> Result<(), Chip8Error> {
    let (x, y) = (op.x() as usize, op.y() as usize);
    state.v[FLAG] = (state.v[x] > state.v[y]) as u8;
    state.v[x] = state.v[x].wrapping_sub(state.v[y]);
    Ok(())
}

/// VF = lsb(Vx); Vx >>= 1
pub fn shr(op: &dyn Opcode, state: &mut State, _ctx: &mut Context) -> Result<(), Chip8Error> {
    let x = op.x() as usize;
    state.v[FLAG] = state.v[x] & 0x1;
    state.v[x] >>= 1;
    Ok(())
}

/// VF = Vy > Vx; Vx = Vy - Vx
pub fn subn(op: &dyn Opcode, state: &mut State, _ctx: &mut Context) -> Result<(), Chip8Error> {
    let (x, y) = (op.x() as usize, op.y() as usize);
    state.v[FLAG] = (state.v[y] > state.v[x]) as u8;
    state.v[x] = state.v[y].wrapping_sub(state.v[x]);
    Ok(())
}

/// VF = Vx & 0x80; Vx <<= 1
/// VF holds the raw high bit (0x00 or 0x80), not 0 or 1
pub fn shl(op: &dyn Opcode, state: &mut State, _ctx: &mut Context) -> Result<(), Chip8Error> {
    let x = op.x() as usize;
    state.v[FLAG] = state.v[x] & 0x80;
    state.v[x] <<= 1;
    Ok(())
}

/// if Vx != Vy then pc += 2
pub fn skrne(op: &dyn Opcode, state: &mut State, _ctx: &mut Context) -> Result<(), Chip8Error> {
    let condition = state.v[op.x() as usize] != state.v[op.y() as usize];
    skip_if(state, condition);
    Ok(())
}

/// I = addr
pub fn loadi(op: &dyn Opcode, state: &mut State, _ctx: &mut Context) -> Result<(), Chip8Error> {
    state.i = op.nnn();
    Ok(())
}

/// PC = V0 + addr
pub fn jumpi(op: &dyn Opcode, state: &mut State, _ctx: &mut Context) -> Result<(), Chip8Error> {
    state.pc = op.nnn() + u16::from(state.v[0x0]);
    Ok(())
}

/// Vx = rand_byte & kk
/// The byte is drawn from 0..=254 unless `Quirks::full_random_range` is set
pub fn rand(op: &dyn Opcode, state: &mut State, ctx: &mut Context) -> Result<(), Chip8Error> {
    let rand_byte: u8 = if ctx.config.quirks.full_random_range {
        ctx.rng.gen()
    } else {
        ctx.rng.gen_range(0..0xFF)
    };
    state.v[op.x() as usize] = rand_byte & op.kk();
    Ok(())
}

/// draw_sprite(x=Vx y=Vy size=n)
/// XORs a sprite from memory I..I+n at position x, y on the FrameBuffer.
/// Sets VF if any pixels were erased
pub fn draw(op: &dyn Opcode, state: &mut State, _ctx: &mut Context) -> Result<(), Chip8Error> {
    let x = state.v[op.x() as usize] as usize;
    let y = state.v[op.y() as usize] as usize;
    let rows = op.n() as usize;

    let mut sprite = [0u8; 0xF];
    sprite[..rows].copy_from_slice(state.memory_range(state.i as usize, rows)?);

    state.v[FLAG] = 0x0;
    for (row, byte) in sprite[..rows].iter().enumerate() {
        for col in 0..SPRITE_WIDTH {
            let mask = 0x80u8 >> col;
            if byte & mask != 0 && state.frame_buffer.toggle_pixel(x + col, y + row) {
                state.v[FLAG] = 0x1;
            }
        }
    }
    Ok(())
}

/// if Vx.pressed then pc += 2
pub fn skpr(op: &dyn Opcode, state: &mut State, ctx: &mut Context) -> Result<(), Chip8Error> {
    let condition = ctx.keypad.is_pressed(state.v[op.x() as usize]);
    skip_if(state, condition);
    Ok(())
}

/// if !Vx.pressed then pc += 2
pub fn skup(op: &dyn Opcode, state: &mut State, ctx: &mut Context) -> Result<(), Chip8Error> {
    let condition = !ctx.keypad.is_pressed(state.v[op.x() as usize]);
    skip_if(state, condition);
    Ok(())
}

/// Vx = DT
pub fn moved(op: &dyn Opcode, state: &mut State, _ctx: &mut Context) -> Result<(), Chip8Error> {
    state.v[op.x() as usize] = state.delay_timer;
    Ok(())
}

/// await keypress for Vx
pub fn keyd(op: &dyn Opcode, state: &mut State, _ctx: &mut Context) -> Result<(), Chip8Error> {
    debug!("pausing until a key is pressed for V{:X}", op.x());
    state.register_needing_key = Some(op.x());
    Ok(())
}

/// DT = Vx
pub fn loads(op: &dyn Opcode, state: &mut State, _ctx: &mut Context) -> Result<(), Chip8Error> {
    state.delay_timer = state.v[op.x() as usize];
    Ok(())
}

/// ST = Vx
pub fn ld(op: &dyn Opcode, state: &mut State, _ctx: &mut Context) -> Result<(), Chip8Error> {
    state.sound_timer = state.v[op.x() as usize];
    Ok(())
}

/// I += Vx
/// I is allowed past 0xFFF, it's memory accesses through I that get checked
pub fn addi(op: &dyn Opcode, state: &mut State, _ctx: &mut Context) -> Result<(), Chip8Error> {
    state.i = state.i.wrapping_add(u16::from(state.v[op.x() as usize]));
    Ok(())
}

/// I = Vx * 5
/// Set I to the memory address of the sprite for Vx
/// See constants::SPRITE_SHEET for more details
pub fn ldspr(op: &dyn Opcode, state: &mut State, _ctx: &mut Context) -> Result<(), Chip8Error> {
    state.i = u16::from(state.v[op.x() as usize]) * GLYPH_SIZE;
    Ok(())
}

/// mem[I..I+3] = bcd(Vx)
pub fn bcd(op: &dyn Opcode, state: &mut State, _ctx: &mut Context) -> Result<(), Chip8Error> {
    let value = state.v[op.x() as usize];
    let digits = [value / 100, value % 100 / 10, value % 10];
    let i = state.i as usize;
    state.memory_range_mut(i, digits.len())?.copy_from_slice(&digits);
    Ok(())
}

/// mem[I..=I+x] = V0..=Vx
/// I is not advanced
pub fn stor(op: &dyn Opcode, state: &mut State, _ctx: &mut Context) -> Result<(), Chip8Error> {
    let count = op.x() as usize + 1;
    let (i, registers) = (state.i as usize, state.v);
    state.memory_range_mut(i, count)?.copy_from_slice(&registers[..count]);
    Ok(())
}

/// V0..=Vx = mem[I..=I+x]
/// I is not advanced
pub fn read(op: &dyn Opcode, state: &mut State, _ctx: &mut Context) -> Result<(), Chip8Error> {
    let count = op.x() as usize + 1;
    let mut registers = state.v;
    registers[..count].copy_from_slice(state.memory_range(state.i as usize, count)?);
    state.v = registers;
    Ok(())
}
