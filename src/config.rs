use crate::constants::{CLASSIC_STACK_LIMIT, INSTRUCTIONS_PER_TICK, TONE_FREQUENCY};

/// # Quirks
/// Two behaviours that look accidental but are observable by programs.
/// They stay on unless explicitly corrected.
///
/// - `add_sets_carry`: 8xy4 compares the already truncated sum against 0xFF,
///   so VF always ends up 0. When set, VF gets the real carry out of bit 7.
/// - `full_random_range`: Cxkk draws from 0..=254. When set, it draws from 0..=255.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Quirks {
    pub add_sets_carry: bool,
    pub full_random_range: bool,
}

impl Quirks {
    /// VF stays 0 after 8xy4 and Cxkk never yields 0xFF
    pub fn literal() -> Self {
        Quirks::default()
    }

    pub fn corrected() -> Self {
        Quirks {
            add_sets_carry: true,
            full_random_range: true,
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Instructions executed per tick
    pub instructions_per_tick: usize,
    /// Frequency handed to the tone generator while the sound timer runs
    pub tone_frequency: u32,
    /// Maximum call depth; `None` lets the stack grow without bound
    pub stack_limit: Option<usize>,
    pub quirks: Quirks,
    /// Seed for Cxkk; `None` seeds from the operating system
    pub seed: Option<u64>,
}

impl Config {
    /// The conventional 16 level stack instead of an unbounded one
    pub fn classic() -> Self {
        Config {
            stack_limit: Some(CLASSIC_STACK_LIMIT),
            ..Config::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            instructions_per_tick: INSTRUCTIONS_PER_TICK,
            tone_frequency: TONE_FREQUENCY,
            stack_limit: None,
            quirks: Quirks::literal(),
            seed: None,
        }
    }
}
