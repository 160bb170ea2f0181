use crate::constants::KEY_COUNT;

/// # Keypad
/// Pressed status of the 16 hexadecimal keys.
/// ```text
/// |1|2|3|C|
/// |4|5|6|D|
/// |7|8|9|E|
/// |A|0|B|F|
/// ```
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Keypad {
    pressed: [bool; KEY_COUNT],
}

impl Keypad {
    pub fn new() -> Self {
        Keypad::default()
    }

    /// Keys outside 0x0..=0xF are ignored
    pub fn press(&mut self, key: u8) {
        if let Some(pressed) = self.pressed.get_mut(key as usize) {
            *pressed = true;
        }
    }

    pub fn release(&mut self, key: u8) {
        if let Some(pressed) = self.pressed.get_mut(key as usize) {
            *pressed = false;
        }
    }

    pub fn is_pressed(&self, key: u8) -> bool {
        self.pressed.get(key as usize).copied().unwrap_or(false)
    }
}
