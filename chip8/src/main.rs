use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use log::error;

use pulse8::constants::{INSTRUCTIONS_PER_TICK, TONE_FREQUENCY};
use pulse8::{Config, Quirks};

mod audio;
mod keymap;
mod run;

/// Runs a Chip-8 program in an SDL2 window
#[derive(Parser, Debug)]
#[command(version)]
pub struct Args {
    /// Program image to load at 0x200
    rom: PathBuf,

    /// Instructions executed per 60 Hz tick
    #[arg(long, default_value_t = INSTRUCTIONS_PER_TICK)]
    speed: usize,

    /// Tone volume in percent
    #[arg(long, default_value_t = 50, value_parser = clap::value_parser!(u8).range(0..=100))]
    volume: u8,

    /// Screen pixels per display cell
    #[arg(long, default_value_t = 10)]
    scale: usize,

    /// Maximum call depth; unbounded when omitted
    #[arg(long, value_name = "DEPTH")]
    stack_limit: Option<usize>,

    /// Report carries from 8xy4 and draw Cxkk from the full byte range
    #[arg(long, default_value_t = false)]
    corrected: bool,

    /// Seed for Cxkk, for repeatable runs
    #[arg(long)]
    seed: Option<u64>,
}

impl Args {
    pub fn config(&self) -> Config {
        Config {
            instructions_per_tick: self.speed,
            tone_frequency: TONE_FREQUENCY,
            stack_limit: self.stack_limit,
            quirks: if self.corrected {
                Quirks::corrected()
            } else {
                Quirks::literal()
            },
            seed: self.seed,
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();
    run::run(&args).map_err(|e| {
        error!("{}", e);
        e
    })
}
