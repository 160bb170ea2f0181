use std::error::Error;
use std::fs::File;
use std::io::BufReader;
use std::time::Instant;

use log::{debug, info};
use sdl2::event::Event;
use sdl2::keyboard::Keycode;

use pulse8::constants::{DISPLAY_HEIGHT, DISPLAY_WIDTH};
use pulse8::{Chip8, DriveLoop};
use pulse8_display::Display;

use crate::audio::Beeper;
use crate::keymap::keymap;
use crate::Args;

pub fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    // Get SDL2 context
    let sdl: sdl2::Sdl = sdl2::init()?;
    let display = Display::new(&sdl, DISPLAY_WIDTH, DISPLAY_HEIGHT, args.scale)?;
    let beeper = Beeper::new(&sdl)?;
    let mut events = sdl.event_pump()?;

    let mut chip8 = Chip8::with_config(display, beeper, args.config());

    // Load ROM
    let file = File::open(&args.rom)?;
    let mut reader = BufReader::new(file);
    chip8.load_rom_from(&mut reader)?;
    info!("loaded ROM {}", args.rom.display());

    let mut drive = DriveLoop::new(chip8);
    drive.set_volume(args.volume);
    debug!(
        "{} instructions every {:?}",
        drive.chip8().config().instructions_per_tick,
        drive.pacer().interval()
    );

    'event: loop {
        // Handle input
        for event in events.poll_iter() {
            match event {
                Event::Quit { .. }
                | Event::KeyDown {
                    keycode: Some(Keycode::Escape),
                    ..
                } => break 'event,
                Event::KeyDown {
                    keycode: Some(key), ..
                } => drive.key_down(keymap(key)),
                Event::KeyUp {
                    keycode: Some(key), ..
                } => drive.key_up(keymap(key)),
                _ => continue,
            };
        }

        // Update state
        if let Err(e) = drive.poll(Instant::now()) {
            drive.dispose();
            return Err(e.into());
        }

        // Handle timing
        std::thread::sleep(drive.idle_time(Instant::now()));
    }

    drive.dispose();
    info!("exiting");
    Ok(())
}
