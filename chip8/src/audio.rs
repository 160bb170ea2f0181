use log::debug;
use sdl2::audio::{AudioCallback, AudioDevice, AudioSpecDesired};

use pulse8::Tone;

const SAMPLE_RATE: i32 = 44_100;

/// Amplitude at full volume
const MAX_AMPLITUDE: f32 = 0.25;

/// A square wave generated on the SDL audio thread
pub struct SquareWave {
    phase_inc: f32,
    phase: f32,
    amplitude: f32,
}

impl AudioCallback for SquareWave {
    type Channel = f32;

    fn callback(&mut self, out: &mut [f32]) {
        for sample in out.iter_mut() {
            *sample = if self.phase < 0.5 {
                self.amplitude
            } else {
                -self.amplitude
            };
            self.phase = (self.phase + self.phase_inc) % 1.0;
        }
    }
}

/// Plays the buzzer through the default SDL playback device
pub struct Beeper {
    device: AudioDevice<SquareWave>,
    sample_rate: i32,
    playing: bool,
}

impl Beeper {
    pub fn new(sdl: &sdl2::Sdl) -> Result<Self, String> {
        let audio = sdl.audio()?;
        let desired = AudioSpecDesired {
            freq: Some(SAMPLE_RATE),
            channels: Some(1),
            samples: None,
        };
        let device = audio.open_playback(None, &desired, |_spec| SquareWave {
            phase_inc: 0.0,
            phase: 0.0,
            amplitude: MAX_AMPLITUDE,
        })?;
        let sample_rate = device.spec().freq;
        debug!("opened audio device at {} Hz", sample_rate);

        Ok(Beeper {
            device,
            sample_rate,
            playing: false,
        })
    }
}

impl Tone for Beeper {
    fn start(&mut self, frequency: u32) {
        if self.playing {
            return;
        }
        self.device.lock().phase_inc = frequency as f32 / self.sample_rate as f32;
        self.device.resume();
        self.playing = true;
    }

    fn stop(&mut self) {
        if !self.playing {
            return;
        }
        self.device.pause();
        self.playing = false;
    }

    fn set_volume(&mut self, gain: f32) {
        self.device.lock().amplitude = gain.max(0.0).min(1.0) * MAX_AMPLITUDE;
    }
}
