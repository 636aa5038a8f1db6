/// Software rasterizer and PNG encoder for plates

use crate::rendering::paint::PaintCommand;
use crate::rendering::Capture;
use crate::style::Rgba;
use crate::{Error, Result};

/// RGBA8 pixel buffer
struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Canvas {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
        }
    }

    fn blend(&mut self, x: u32, y: u32, c: Rgba) {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let px = &mut self.pixels[i..i + 4];
        if c.3 == 255 {
            px.copy_from_slice(&[c.0, c.1, c.2, 255]);
            return;
        }
        let a = c.3 as u32;
        for (dst, src) in px.iter_mut().take(3).zip([c.0, c.1, c.2]) {
            *dst = ((src as u32 * a + *dst as u32 * (255 - a)) / 255) as u8;
        }
        px[3] = (a + px[3] as u32 * (255 - a) / 255) as u8;
    }

    fn fill_rect(&mut self, x: i32, y: i32, width: u32, height: u32, c: Rgba) {
        let x0 = x.max(0) as u32;
        let y0 = y.max(0) as u32;
        let x1 = (x as i64 + width as i64).clamp(0, self.width as i64) as u32;
        let y1 = (y as i64 + height as i64).clamp(0, self.height as i64) as u32;
        for py in y0..y1 {
            for px in x0..x1 {
                self.blend(px, py, c);
            }
        }
    }

    fn fill_gradient(&mut self, stops: &[Rgba]) {
        let (first, rest) = match stops.split_first() {
            Some(split) => split,
            None => return,
        };
        if rest.is_empty() || self.height < 2 {
            self.fill_rect(0, 0, self.width, self.height, *first);
            return;
        }
        let segments = stops.len() - 1;
        for py in 0..self.height {
            // 0deg: position 0 at the bottom row, 1 at the top row
            let t = (self.height - 1 - py) as f32 / (self.height - 1) as f32;
            let scaled = t * segments as f32;
            let seg = (scaled.floor() as usize).min(segments - 1);
            let color = stops[seg].lerp(stops[seg + 1], scaled - seg as f32);
            self.fill_rect(0, py as i32, self.width, 1, color);
        }
    }

    fn draw_text(&mut self, x: i32, y: i32, text: &str, cell_w: u32, cell_h: u32, c: Rgba) {
        // glyph ink leaves a margin inside each cell
        let inset_x = cell_w / 6;
        let inset_y = cell_h / 4;
        let ink_w = cell_w.saturating_sub(inset_x * 2).max(1);
        let ink_h = cell_h.saturating_sub(inset_y * 2).max(1);
        for (i, ch) in text.chars().enumerate() {
            if ch.is_whitespace() {
                continue;
            }
            let gx = x + (i as u32 * cell_w + inset_x) as i32;
            self.fill_rect(gx, y + inset_y as i32, ink_w, ink_h, c);
        }
    }
}

/// Execute a display list on a `width` x `height` surface.
pub fn rasterize(commands: &[PaintCommand], width: u32, height: u32) -> Capture {
    let mut canvas = Canvas::new(width, height);
    for cmd in commands {
        match cmd {
            PaintCommand::VerticalGradient { stops } => canvas.fill_gradient(stops),
            PaintCommand::SolidRect {
                x,
                y,
                width,
                height,
                rgba,
            } => canvas.fill_rect(*x, *y, *width, *height, *rgba),
            PaintCommand::Text {
                x,
                y,
                text,
                cell,
                rgba,
            } => canvas.draw_text(*x, *y, text, cell.width, cell.height, *rgba),
        }
    }
    Capture {
        width,
        height,
        rgba: canvas.pixels,
    }
}

/// Encode a capture as PNG at the strongest compression setting.
pub fn encode_png(capture: &Capture) -> Result<Vec<u8>> {
    let expected = capture.width as usize * capture.height as usize * 4;
    if capture.rgba.len() != expected {
        return Err(Error::EncodeError(format!(
            "pixel buffer holds {} bytes, expected {} for {}x{}",
            capture.rgba.len(),
            expected,
            capture.width,
            capture.height
        )));
    }

    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, capture.width, capture.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_compression(png::Compression::Best);
        let mut writer = encoder
            .write_header()
            .map_err(|e| Error::EncodeError(e.to_string()))?;
        writer
            .write_image_data(&capture.rgba)
            .map_err(|e| Error::EncodeError(e.to_string()))?;
        writer.finish().map_err(|e| Error::EncodeError(e.to_string()))?;
    }
    Ok(out)
}
