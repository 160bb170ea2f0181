use crate::frame::FrameBuffer;

/// Something that can show a frame; invoked once per tick
pub trait Screen {
    fn draw(&mut self, frame: &FrameBuffer);
}

/// Produces the buzzer tone.
///
/// `start` while already sounding and `stop` while already silent must both be no-ops.
pub trait Tone {
    fn start(&mut self, frequency: u32);
    fn stop(&mut self);
    /// Linear gain in 0.0..=1.0
    fn set_volume(&mut self, gain: f32);
}

/// A screen and tone generator that discard everything
#[derive(Debug, Default, Copy, Clone)]
pub struct Silence;

impl Screen for Silence {
    fn draw(&mut self, _frame: &FrameBuffer) {}
}

impl Tone for Silence {
    fn start(&mut self, _frequency: u32) {}
    fn stop(&mut self) {}
    fn set_volume(&mut self, _gain: f32) {}
}
