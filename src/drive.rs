use std::time::{Duration, Instant};

use log::debug;

use crate::chip8::Chip8;
use crate::constants::TICKS_PER_SECOND;
use crate::error::Chip8Error;
use crate::peripherals::{Screen, Tone};

/// Decides when enough wall-clock time has passed for another tick
#[derive(Debug, Clone)]
pub struct Pacer {
    interval: Duration,
    last_tick: Option<Instant>,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Pacer {
            interval,
            last_tick: None,
        }
    }

    /// Paces at `TICKS_PER_SECOND`
    pub fn per_frame() -> Self {
        Pacer::new(Duration::from_secs(1) / TICKS_PER_SECOND)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// True, and remembers `now`, if an interval has elapsed since the last time this was true.
    /// The first call is always due.
    pub fn due(&mut self, now: Instant) -> bool {
        match self.last_tick {
            Some(last) if now.saturating_duration_since(last) < self.interval => false,
            _ => {
                self.last_tick = Some(now);
                true
            }
        }
    }

    /// How long until the next tick is due
    pub fn remaining(&self, now: Instant) -> Duration {
        match self.last_tick {
            Some(last) => self.interval.saturating_sub(now.saturating_duration_since(last)),
            None => Duration::from_secs(0),
        }
    }
}

/// # Drive Loop
/// Polled by the host as often as it likes; ticks the machine at most once per interval.
///
/// Once disposed it ignores polls and key events and the tone is silenced.
pub struct DriveLoop<S: Screen, T: Tone> {
    chip8: Chip8<S, T>,
    pacer: Pacer,
    disposed: bool,
}

impl<S: Screen, T: Tone> DriveLoop<S, T> {
    pub fn new(chip8: Chip8<S, T>) -> Self {
        DriveLoop::with_pacer(chip8, Pacer::per_frame())
    }

    pub fn with_pacer(chip8: Chip8<S, T>, pacer: Pacer) -> Self {
        DriveLoop {
            chip8,
            pacer,
            disposed: false,
        }
    }

    /// Ticks the machine if a tick is due at `now`.
    /// Returns whether it ticked.
    pub fn poll(&mut self, now: Instant) -> Result<bool, Chip8Error> {
        if self.disposed || !self.pacer.due(now) {
            return Ok(false);
        }
        self.chip8.tick()?;
        Ok(true)
    }

    /// Time the host may sleep before polling again
    pub fn idle_time(&self, now: Instant) -> Duration {
        self.pacer.remaining(now)
    }

    /// # Arguments
    /// * `key` a keypad symbol; `None` for keys without a mapping
    pub fn key_down(&mut self, key: Option<u8>) {
        match key {
            Some(key) if !self.disposed => self.chip8.key_press(key),
            _ => (),
        }
    }

    pub fn key_up(&mut self, key: Option<u8>) {
        match key {
            Some(key) if !self.disposed => self.chip8.key_release(key),
            _ => (),
        }
    }

    pub fn set_volume(&mut self, percent: u8) {
        self.chip8.set_volume(percent);
    }

    /// Stops ticking and silences the tone. Calling it again does nothing.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        debug!("disposing drive loop");
        self.disposed = true;
        self.chip8.tone_mut().stop();
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn pacer(&self) -> &Pacer {
        &self.pacer
    }

    pub fn chip8(&self) -> &Chip8<S, T> {
        &self.chip8
    }
}
