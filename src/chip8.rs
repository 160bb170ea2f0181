use std::io::Read;

use log::{debug, error, trace};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::Config;
use crate::constants::{MAX_ROM_SIZE, PROGRAM_START};
use crate::error::Chip8Error;
use crate::frame::FrameBuffer;
use crate::instruction::from_op;
use crate::keypad::Keypad;
use crate::opcode;
use crate::operations::Context;
use crate::peripherals::{Screen, Tone};
use crate::state::State;

/// # Chip-8
/// Chip-8 is a virtual machine and corresponding interpreted language.
///
/// Tracks:
///  - current `state`
///  - `keypad` with public interfaces for pressing and releasing keys
///  - the first fatal error, after which nothing else executes
///
/// Supplies interfaces for:
/// - loading roms
/// - pressing and releasing keys, including delivering the key a program waits on
/// - advancing by one tick: a batch of instructions, a timer step, a beep and a frame
pub struct Chip8<S: Screen, T: Tone> {
    state: State,
    keypad: Keypad,
    config: Config,
    rng: StdRng,
    fault: Option<Chip8Error>,
    screen: S,
    tone: T,
}

impl<S: Screen, T: Tone> Chip8<S, T> {
    pub fn new(screen: S, tone: T) -> Self {
        Chip8::with_config(screen, tone, Config::default())
    }

    pub fn with_config(screen: S, tone: T, config: Config) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Chip8 {
            state: State::new(),
            keypad: Keypad::new(),
            config,
            rng,
            fault: None,
            screen,
            tone,
        }
    }

    /// Copies a program image into memory at 0x200.
    /// Registers, timers and the stack are left as they are.
    ///
    /// # Arguments
    /// * `rom` the program image, at most 3584 bytes
    pub fn load_rom(&mut self, rom: &[u8]) -> Result<(), Chip8Error> {
        if rom.len() > MAX_ROM_SIZE {
            return Err(Chip8Error::RomTooLarge {
                size: rom.len(),
                max_size: MAX_ROM_SIZE,
            });
        }
        let start = PROGRAM_START as usize;
        self.state.memory[start..start + rom.len()].copy_from_slice(rom);
        debug!("loaded {} byte ROM at {:#05X}", rom.len(), start);
        Ok(())
    }

    /// Load a rom from a source file
    ///
    /// # Arguments
    /// * `reader` a file reader that contains a ROM
    pub fn load_rom_from(&mut self, reader: &mut dyn Read) -> Result<(), Chip8Error> {
        let mut rom = Vec::new();
        reader
            .read_to_end(&mut rom)
            .map_err(|e| Chip8Error::RomRead(e.to_string()))?;
        self.load_rom(&rom)
    }

    /// Advances the machine by one tick.
    /// - runs `instructions_per_tick` instructions unless awaiting a keypress
    /// - decrements the timers if any instructions were run
    /// - starts or stops the tone and draws the frame, even while paused
    ///
    /// A fatal error stops the batch where it happened and is returned by this
    /// and every later tick.
    pub fn tick(&mut self) -> Result<(), Chip8Error> {
        if let Some(fault) = &self.fault {
            return Err(fault.clone());
        }

        if !self.is_awaiting_key() {
            if let Err(e) = self.run_batch() {
                error!("halting at pc {:#06X}: {}", self.state.pc, e);
                self.fault = Some(e.clone());
                return Err(e);
            }
            self.state.advance_timers();
        }

        if self.state.sound_timer > 0 {
            self.tone.start(self.config.tone_frequency);
        } else {
            self.tone.stop();
        }
        self.screen.draw(&self.state.frame_buffer);
        Ok(())
    }

    /// Executes a full batch in program order. A key wait started here pauses the next tick.
    fn run_batch(&mut self) -> Result<(), Chip8Error> {
        for _ in 0..self.config.instructions_per_tick {
            self.step()?;
        }
        Ok(())
    }

    /// Fetches, decodes and executes a single instruction
    fn step(&mut self) -> Result<(), Chip8Error> {
        let op = self.get_op()?;
        trace!(
            "{:04X} v{:02X?} i{:04X} pc{:04X}",
            op,
            self.state.v,
            self.state.i,
            self.state.pc
        );
        self.state.pc = self.state.pc.wrapping_add(0x2);

        let operation = from_op(op)?;
        let mut ctx = Context {
            keypad: &self.keypad,
            rng: &mut self.rng,
            config: &self.config,
        };
        operation(&op, &mut self.state, &mut ctx)
    }

    /// Gets the opcode currently pointed at by the pc.
    /// Memory is stored as bytes, but opcodes are 16 bits so we combine two subsequent bytes.
    fn get_op(&self) -> Result<u16, Chip8Error> {
        let bytes = self.state.memory_range(self.state.pc as usize, 2)?;
        Ok(opcode::from_bytes(bytes[0], bytes[1]))
    }

    /// Set the pressed status of key, delivering it if the program is waiting on one
    ///
    /// # Arguments
    /// * `key` the keypad symbol 0x0..=0xF that was pressed
    pub fn key_press(&mut self, key: u8) {
        self.keypad.press(key);
        self.deliver_key(key);
    }

    /// Unset the pressed status of key
    ///
    /// # Arguments
    /// * `key` the keypad symbol 0x0..=0xF that was released
    pub fn key_release(&mut self, key: u8) {
        self.keypad.release(key);
    }

    /// Whether an Fx0A instruction is holding up execution
    pub fn is_awaiting_key(&self) -> bool {
        self.state.register_needing_key.is_some()
    }

    /// Writes `key` into the register awaiting one and resumes execution.
    /// Does nothing if no register is waiting.
    pub fn deliver_key(&mut self, key: u8) {
        if let Some(register) = self.state.register_needing_key.take() {
            debug!("resuming with key {:X} in V{:X}", key, register);
            self.state.v[register as usize] = key;
        }
    }

    /// # Arguments
    /// * `percent` volume from 0 to 100, anything larger is treated as 100
    pub fn set_volume(&mut self, percent: u8) {
        self.tone.set_volume(f32::from(percent.min(100)) / 100.0);
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn frame(&self) -> &FrameBuffer {
        &self.state.frame_buffer
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The error that halted the machine, if any
    pub fn fault(&self) -> Option<&Chip8Error> {
        self.fault.as_ref()
    }

    pub fn screen(&self) -> &S {
        &self.screen
    }

    pub fn tone(&self) -> &T {
        &self.tone
    }

    pub fn tone_mut(&mut self) -> &mut T {
        &mut self.tone
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::Quirks;

    /// Counts the frames it was asked to draw
    #[derive(Default)]
    pub struct RecordingScreen {
        pub draws: usize,
        pub last_lit: usize,
    }

    impl Screen for RecordingScreen {
        fn draw(&mut self, frame: &FrameBuffer) {
            self.draws += 1;
            self.last_lit = frame.cells().iter().filter(|&&cell| cell).count();
        }
    }

    /// Remembers every call it received
    #[derive(Default)]
    pub struct RecordingTone {
        pub starts: Vec<u32>,
        pub stops: usize,
        pub volume: Option<f32>,
    }

    impl Tone for RecordingTone {
        fn start(&mut self, frequency: u32) {
            self.starts.push(frequency);
        }

        fn stop(&mut self) {
            self.stops += 1;
        }

        fn set_volume(&mut self, gain: f32) {
            self.volume = Some(gain);
        }
    }

    pub type TestChip8 = Chip8<RecordingScreen, RecordingTone>;

    pub fn chip8_with(rom: &[u8], config: Config) -> TestChip8 {
        let mut chip8 = Chip8::with_config(RecordingScreen::default(), RecordingTone::default(), config);
        chip8.load_rom(rom).unwrap();
        chip8
    }

    fn chip8(rom: &[u8]) -> TestChip8 {
        chip8_with(
            rom,
            Config {
                seed: Some(0x8),
                ..Config::default()
            },
        )
    }

    #[test]
    fn test_runs_without_peripherals() {
        use crate::peripherals::Silence;

        let mut chip8 = Chip8::new(Silence, Silence);
        chip8.load_rom(&[0x60, 0x2A, 0x12, 0x02]).unwrap();
        chip8.tick().unwrap();
        assert_eq!(chip8.state().v[0x0], 0x2A);
    }

    #[test]
    fn test_chip8_gets_op() {
        let chip8 = chip8(&[0xAA, 0xBB]);
        assert_eq!(chip8.get_op(), Ok(0xAABB));
    }

    #[test]
    fn test_get_op_past_memory() {
        let mut chip8 = chip8(&[]);
        chip8.state.pc = 0xFFF;
        assert_eq!(
            chip8.get_op(),
            Err(Chip8Error::AddressOutOfBounds { address: 0x1000 })
        );
    }

    #[test]
    fn test_load_rom_leaves_registers_alone() {
        let mut chip8 = chip8(&[]);
        chip8.state.v[0x3] = 0x33;
        chip8.state.pc = 0x300;
        chip8.load_rom(&[0x12, 0x34]).unwrap();
        assert_eq!(chip8.state.memory[0x200..0x202], [0x12, 0x34]);
        assert_eq!(chip8.state.v[0x3], 0x33);
        assert_eq!(chip8.state.pc, 0x300);
    }

    #[test]
    fn test_load_rom_rejects_oversized_rom() {
        let mut chip8 = chip8(&[]);
        assert!(chip8.load_rom(&[0; MAX_ROM_SIZE]).is_ok());
        assert_eq!(
            chip8.load_rom(&[0; MAX_ROM_SIZE + 1]),
            Err(Chip8Error::RomTooLarge {
                size: MAX_ROM_SIZE + 1,
                max_size: MAX_ROM_SIZE
            })
        );
    }

    #[test]
    fn test_load_rom_from_reader() {
        let mut chip8 = chip8(&[]);
        let mut rom: &[u8] = &[0x00, 0xE0];
        chip8.load_rom_from(&mut rom).unwrap();
        assert_eq!(chip8.state.memory[0x200..0x202], [0x00, 0xE0]);
    }

    #[test]
    fn test_tick_runs_a_batch() {
        // ten times V0 += 1, then one more that shouldn't run yet
        let rom: Vec<u8> = std::iter::repeat([0x70, 0x01]).take(11).flatten().collect();
        let mut chip8 = chip8(&rom);
        chip8.tick().unwrap();
        assert_eq!(chip8.state.v[0x0], 10);
        assert_eq!(chip8.state.pc, 0x200 + 20);
    }

    #[test]
    fn test_instructions_per_tick_is_configurable() {
        let rom: Vec<u8> = std::iter::repeat([0x70, 0x01]).take(4).flatten().collect();
        let mut chip8 = chip8_with(
            &rom,
            Config {
                instructions_per_tick: 3,
                ..Config::default()
            },
        );
        chip8.tick().unwrap();
        assert_eq!(chip8.state.v[0x0], 3);
    }

    #[test]
    fn test_tick_decrements_timers_once() {
        // 1200: jump to self
        let mut chip8 = chip8(&[0x12, 0x00]);
        chip8.state.delay_timer = 2;
        chip8.state.sound_timer = 1;
        chip8.tick().unwrap();
        assert_eq!(chip8.state.delay_timer, 1);
        assert_eq!(chip8.state.sound_timer, 0);
        chip8.tick().unwrap();
        chip8.tick().unwrap();
        assert_eq!(chip8.state.delay_timer, 0);
    }

    #[test]
    fn test_tick_drives_tone_from_sound_timer() {
        // 6005 F018: ST = 5, then loop
        let mut chip8 = chip8(&[0x60, 0x05, 0xF0, 0x18, 0x12, 0x04]);
        chip8.tick().unwrap();
        assert_eq!(chip8.state.sound_timer, 4);
        assert_eq!(chip8.tone.starts, vec![480]);
        assert_eq!(chip8.tone.stops, 0);
        for _ in 0..4 {
            chip8.tick().unwrap();
        }
        assert_eq!(chip8.state.sound_timer, 0);
        assert_eq!(chip8.tone.starts.len(), 4);
        assert_eq!(chip8.tone.stops, 1);
    }

    #[test]
    fn test_tick_draws_every_frame() {
        // A000 D005: draw the "0" glyph at 0, 0; then loop
        let mut chip8 = chip8(&[0xA0, 0x00, 0xD0, 0x05, 0x12, 0x04]);
        chip8.tick().unwrap();
        chip8.tick().unwrap();
        assert_eq!(chip8.screen.draws, 2);
        assert_eq!(chip8.screen.last_lit, 14);
    }

    #[test]
    fn test_skip_taken_advances_pc_twice() {
        // 6042 3042: skip taken
        let mut chip8 = chip8_with(
            &[0x60, 0x42, 0x30, 0x42],
            Config {
                instructions_per_tick: 2,
                ..Config::default()
            },
        );
        chip8.tick().unwrap();
        assert_eq!(chip8.state.pc, 0x206);

        // 6042 3043: skip not taken
        let mut chip8 = chip8_with(
            &[0x60, 0x42, 0x30, 0x43],
            Config {
                instructions_per_tick: 2,
                ..Config::default()
            },
        );
        chip8.tick().unwrap();
        assert_eq!(chip8.state.pc, 0x204);
    }

    #[test]
    fn test_paused_tick_changes_nothing_but_still_outputs() {
        let mut chip8 = chip8(&[0x70, 0x01]);
        chip8.state.register_needing_key = Some(0x1);
        chip8.state.delay_timer = 5;
        chip8.state.sound_timer = 5;
        let before = chip8.state.clone();
        chip8.tick().unwrap();
        assert_eq!(chip8.state, before);
        assert_eq!(chip8.screen.draws, 1);
        assert_eq!(chip8.tone.starts.len() + chip8.tone.stops, 1);
    }

    #[test]
    fn test_key_wait_pauses_from_the_next_tick() {
        // F30A: wait for a key into V3, then V0 += 1 nine times, then V0 += 1 forever
        let mut rom = vec![0xF3, 0x0A];
        rom.extend(std::iter::repeat([0x70, 0x01]).take(10).flatten());
        rom.extend(&[0x12, 0x14]);
        let mut chip8 = chip8(&rom);
        chip8.state.delay_timer = 3;
        chip8.tick().unwrap();
        assert!(chip8.is_awaiting_key());
        assert_eq!(chip8.state.pc, 0x214);
        assert_eq!(chip8.state.v[0x0], 9);
        assert_eq!(chip8.state.delay_timer, 2);

        chip8.tick().unwrap();
        assert_eq!(chip8.state.pc, 0x214);
        assert_eq!(chip8.state.v[0x0], 9);
        assert_eq!(chip8.state.delay_timer, 2);

        chip8.key_press(0xB);
        assert!(!chip8.is_awaiting_key());
        assert_eq!(chip8.state.v[0x3], 0xB);
        chip8.tick().unwrap();
        assert_eq!(chip8.state.v[0x0], 14);
    }

    #[test]
    fn test_captures_key_presses() {
        let mut chip8 = chip8(&[]);
        chip8.state.register_needing_key = Some(0x1);
        chip8.key_press(0xE);
        assert_eq!(chip8.state.register_needing_key, None);
        assert_eq!(chip8.state.v[0x1], 0xE);
        assert!(chip8.keypad.is_pressed(0xE));
        chip8.key_release(0xE);
        assert!(!chip8.keypad.is_pressed(0xE));
    }

    #[test]
    fn test_deliver_key_without_waiting_is_ignored() {
        let mut chip8 = chip8(&[]);
        let before = chip8.state.clone();
        chip8.deliver_key(0x4);
        assert_eq!(chip8.state, before);
    }

    #[test]
    fn test_key_press_is_seen_by_skp() {
        // 6007 E09E 6101 6202: skip V1 = 1 when key 7 is down
        let rom = [0x60, 0x07, 0xE0, 0x9E, 0x61, 0x01, 0x62, 0x02];
        let config = Config {
            instructions_per_tick: 4,
            ..Config::default()
        };
        let mut chip8 = chip8_with(&rom, config.clone());
        chip8.key_press(0x7);
        chip8.tick().unwrap();
        assert_eq!(chip8.state.v[0x1], 0);
        assert_eq!(chip8.state.v[0x2], 2);

        let mut chip8 = chip8_with(&rom, config);
        chip8.tick().unwrap();
        assert_eq!(chip8.state.v[0x1], 1);
    }

    #[test]
    fn test_unassigned_codes_run_on() {
        // 6001 8008 7001 E0A0 F0FF 7001
        let mut chip8 = chip8(&[0x60, 0x01, 0x80, 0x08, 0x70, 0x01, 0xE0, 0xA0, 0xF0, 0xFF, 0x70, 0x01]);
        assert_eq!(chip8.tick(), Ok(()));
        assert_eq!(chip8.state.v[0x0], 3);
        assert_eq!(chip8.fault(), None);
    }

    #[test]
    fn test_fault_halts() {
        // 6001 00EE 7001
        let mut chip8 = chip8(&[0x60, 0x01, 0x00, 0xEE, 0x70, 0x01]);
        assert_eq!(chip8.tick(), Err(Chip8Error::StackUnderflow));
        assert_eq!(chip8.state.v[0x0], 1);
        assert_eq!(chip8.fault(), Some(&Chip8Error::StackUnderflow));

        let before = chip8.state.clone();
        assert!(chip8.tick().is_err());
        assert_eq!(chip8.state, before);
        assert_eq!(chip8.screen.draws, 0);
    }

    #[test]
    fn test_return_on_empty_stack_halts() {
        let mut chip8 = chip8(&[0x00, 0xEE]);
        assert_eq!(chip8.tick(), Err(Chip8Error::StackUnderflow));
        assert_eq!(chip8.tick(), Err(Chip8Error::StackUnderflow));
    }

    /// A chain of `depth` subroutines, each calling the next before returning.
    /// Address 0x200 calls 0x210, which starts the chain; the innermost just returns.
    fn nested_calls(depth: usize) -> Vec<u8> {
        let mut rom = vec![0u8; 0x10 + depth * 4 + 2];
        rom[0..2].copy_from_slice(&[0x22, 0x10]);
        // after the outermost return, loop at 0x202
        rom[2..4].copy_from_slice(&[0x12, 0x02]);
        for level in 0..depth {
            let at = 0x10 + level * 4;
            let next = 0x200 + at + 4;
            if level + 1 < depth {
                rom[at] = 0x20 | (next >> 8) as u8;
                rom[at + 1] = next as u8;
            } else {
                rom[at..at + 2].copy_from_slice(&[0x00, 0x00]);
            }
            rom[at + 2..at + 4].copy_from_slice(&[0x00, 0xEE]);
        }
        rom
    }

    #[test]
    fn test_nested_calls_return_to_start() {
        let depth = 16;
        let rom = nested_calls(depth);
        let mut chip8 = chip8_with(
            &rom,
            Config {
                instructions_per_tick: 1,
                ..Config::classic()
            },
        );
        let mut deepest = 0;
        for _ in 0..(depth * 2 + 1) {
            chip8.tick().unwrap();
            deepest = deepest.max(chip8.state.stack.len());
        }
        assert_eq!(deepest, depth);
        assert!(chip8.state.stack.is_empty());
        assert_eq!(chip8.state.pc, 0x202);
    }

    #[test]
    fn test_nesting_past_the_stack_limit_halts() {
        let mut chip8 = chip8_with(&nested_calls(17), Config::classic());
        let mut result = Ok(());
        for _ in 0..4 {
            result = chip8.tick();
            if result.is_err() {
                break;
            }
        }
        assert_eq!(result, Err(Chip8Error::StackOverflow { limit: 16 }));
    }

    #[test]
    fn test_unbounded_stack_by_default() {
        let mut chip8 = chip8(&nested_calls(40));
        for _ in 0..5 {
            chip8.tick().unwrap();
        }
        assert!(chip8.state.stack.len() > 16);
    }

    #[test]
    fn test_corrected_quirks_reach_operations() {
        // 60FF 6101 8014
        let mut chip8 = chip8_with(
            &[0x60, 0xFF, 0x61, 0x01, 0x80, 0x14, 0x12, 0x06],
            Config {
                quirks: Quirks::corrected(),
                ..Config::default()
            },
        );
        chip8.tick().unwrap();
        assert_eq!(chip8.state.v[0x0], 0x00);
        assert_eq!(chip8.state.v[0xF], 0x1);
    }

    #[test]
    fn test_seeded_rng_is_repeatable() {
        // C0FF C1FF
        let rom = [0xC0, 0xFF, 0xC1, 0xFF, 0x12, 0x04];
        let config = Config {
            seed: Some(1234),
            ..Config::default()
        };
        let mut first = chip8_with(&rom, config.clone());
        let mut second = chip8_with(&rom, config);
        first.tick().unwrap();
        second.tick().unwrap();
        assert_eq!(first.state.v, second.state.v);
    }

    #[test]
    fn test_set_volume_scales_percent() {
        let mut chip8 = chip8(&[]);
        chip8.set_volume(25);
        assert_eq!(chip8.tone.volume, Some(0.25));
        chip8.set_volume(200);
        assert_eq!(chip8.tone.volume, Some(1.0));
    }
}
