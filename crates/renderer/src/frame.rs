//! CPU framebuffer the raycaster draws into.

use std::path::Path;

use anyhow::{Context, Result};
use bytemuck::{Pod, Zeroable};

/// One RGBA8 pixel, laid out for direct upload or PNG encoding.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn opaque(rgb: [u8; 3]) -> Self {
        Self {
            r: rgb[0],
            g: rgb[1],
            b: rgb[2],
            a: 255,
        }
    }

    pub fn rgb(&self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

/// A rendered image.
#[derive(Debug, Clone)]
pub struct Frame {
    width: u32,
    height: u32,
    pixels: Vec<Rgba>,
}

impl Frame {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgba::default(); (width as usize) * (height as usize)],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn clear(&mut self, color: Rgba) {
        self.pixels.fill(color);
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x < self.width && y < self.height {
            Some(self.pixels[(y * self.width + x) as usize])
        } else {
            None
        }
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, color: Rgba) {
        if x < self.width && y < self.height {
            self.pixels[(y * self.width + x) as usize] = color;
        }
    }

    /// Fill column `x` over rows `[top, bottom)`, clipped to the frame.
    pub fn vertical_line(&mut self, x: u32, top: i32, bottom: i32, color: Rgba) {
        if x >= self.width {
            return;
        }
        let top = top.max(0) as u32;
        let bottom = bottom.clamp(0, self.height as i32) as u32;
        let w = self.width as usize;
        for y in top..bottom {
            self.pixels[y as usize * w + x as usize] = color;
        }
    }

    /// Filled square centered on `(cx, cy)`, used for target markers.
    pub fn fill_square(&mut self, cx: f32, cy: f32, half: f32, color: Rgba) {
        let x0 = (cx - half).floor().max(0.0) as u32;
        let y0 = (cy - half).floor().max(0.0) as u32;
        let x1 = (cx + half).ceil().clamp(0.0, self.width as f32) as u32;
        let y1 = (cy + half).ceil().clamp(0.0, self.height as f32) as u32;
        for y in y0..y1 {
            for x in x0..x1 {
                self.set_pixel(x, y, color);
            }
        }
    }

    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    /// Raw RGBA8 bytes, row-major.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Encode the frame as a PNG.
    pub fn save_png(&self, path: &Path) -> Result<()> {
        image::save_buffer(
            path,
            self.as_bytes(),
            self.width,
            self.height,
            image::ExtendedColorType::Rgba8,
        )
        .with_context(|| format!("write frame to {}", path.display()))?;
        log::debug!("Saved {}x{} frame to {}", self.width, self.height, path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertical_line_is_clipped() {
        let mut frame = Frame::new(4, 4);
        let red = Rgba::opaque([255, 0, 0]);
        frame.vertical_line(1, -5, 2, red);
        frame.vertical_line(9, 0, 4, red);
        assert_eq!(frame.pixel(1, 0), Some(red));
        assert_eq!(frame.pixel(1, 1), Some(red));
        assert_eq!(frame.pixel(1, 2), Some(Rgba::default()));
        assert_eq!(frame.pixel(9, 0), None);
    }

    #[test]
    fn bytes_are_rgba_row_major() {
        let mut frame = Frame::new(2, 1);
        frame.set_pixel(1, 0, Rgba::opaque([1, 2, 3]));
        assert_eq!(frame.as_bytes(), &[0, 0, 0, 0, 1, 2, 3, 255]);
    }
}
