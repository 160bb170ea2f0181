use log::error;
use sdl2::pixels::PixelFormatEnum;

use pulse8::{FrameBuffer, Screen};

/// # Display
/// Renders a Chip-8 FrameBuffer to an SDL2 window, one square of `scale` x `scale`
/// screen pixels per cell.
///
/// The window is sized for the frame geometry given at construction.
pub struct Display {
    canvas: sdl2::render::WindowCanvas,
    width: usize,
    height: usize,
}

impl Display {
    /// Creates a new display object bound to an sdl2 context.
    ///
    /// # Arguments
    /// * `sdl` an sdl2 context with which to draw
    /// * `width` the horizontal size of the frame measured in cells
    /// * `height` the vertical size of the frame measured in cells
    /// * `scale` the size multiplier for each cell
    pub fn new(sdl: &sdl2::Sdl, width: usize, height: usize, scale: usize) -> Result<Self, String> {
        let video_subsystem = sdl.video()?;
        let window = video_subsystem
            .window("Pulse-8", (width * scale) as u32, (height * scale) as u32)
            .position_centered()
            .opengl()
            .build()
            .map_err(|e| e.to_string())?;
        let canvas = window.into_canvas().build().map_err(|e| e.to_string())?;

        Ok(Display {
            canvas,
            width,
            height,
        })
    }

    /// Formats a Chip-8 FrameBuffer for rendering as an SDL2 texture.
    ///
    /// An SDL2 texture is a 1D array of ints that represent concatenated rows of RGB pixels.
    ///
    /// This creates a black and white rendering by:
    /// - Triplicating each cell to represent the RGB values of each pixel
    /// - Mapping set cells to full intensity and unset cells to 0
    ///
    /// # Arguments
    /// * `frame` a Chip-8 FrameBuffer
    fn frame_to_sdl_texture(frame: &FrameBuffer) -> Vec<u8> {
        frame
            .cells()
            .iter()
            .map(|&cell| if cell { 255 } else { 0 })
            .flat_map(|a| std::iter::repeat(a).take(3))
            .collect()
    }

    /// Formats the Chip-8 FrameBuffer as an SDL2 RGB24 texture and renders it.
    ///
    /// # Arguments
    /// * `frame` a Chip-8 FrameBuffer
    pub fn render(&mut self, frame: &FrameBuffer) -> Result<(), String> {
        let texture_creator = self.canvas.texture_creator();

        let mut texture = texture_creator
            .create_texture_streaming(
                PixelFormatEnum::RGB24,
                self.width as u32,
                self.height as u32,
            )
            .map_err(|e| e.to_string())?;

        let pixels = Display::frame_to_sdl_texture(frame);
        let row_bytes = self.width * 3;
        texture.with_lock(None, |buffer: &mut [u8], pitch: usize| {
            for (row, line) in pixels.chunks(row_bytes).enumerate() {
                buffer[row * pitch..row * pitch + row_bytes].copy_from_slice(line);
            }
        })?;

        self.canvas.copy(&texture, None, None)?;
        self.canvas.present();
        Ok(())
    }
}

impl Screen for Display {
    fn draw(&mut self, frame: &FrameBuffer) {
        if let Err(e) = self.render(frame) {
            error!("unable to render frame: {}", e);
        }
    }
}
