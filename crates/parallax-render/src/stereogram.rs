// Copyright 2025 the Parallax contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Autostereogram compositing over the rendered depth buffer.
//!
//! Runs after the scene painters each frame: reads the depth buffer
//! back, seeds a random pattern strip on the left, propagates it
//! rightward with depth-dependent horizontal displacement, and draws
//! the result as a screen quad over the frame.

use crate::frame::FrameContext;
use crate::program::ShaderProgram;
use crate::shaders;
use crate::state_guard::StateGuard;
use parallax_core::gfx::{
    GraphicsDevice, MatrixMode, ProgramDescriptor, RenderError, TextureDescriptor, TextureId,
    UniformValue, Viewport,
};
use parallax_core::math::Mat4;

/// Divisor from viewport width to pattern-strip width, and from depth
/// byte to pixel displacement.
pub const PATTERN_DIV: u32 = 12;

/// One 8-bit RGB pixel of the stereogram image.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb {
    const BLACK: Self = Self { r: 0, g: 0, b: 0 };
}

/// The pattern-noise generator: a small seedable LCG, cheap enough to
/// re-randomize the whole strip every frame.
#[derive(Debug, Clone)]
pub struct PatternRng {
    seed: u32,
}

impl PatternRng {
    /// Creates a generator from an explicit seed.
    pub fn new(seed: u32) -> Self {
        Self { seed }
    }

    /// Creates a generator seeded from the wall clock.
    pub fn from_clock() -> Self {
        let seed = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.subsec_nanos() ^ d.as_secs() as u32)
            .unwrap_or(1);
        Self::new(seed)
    }

    /// Next channel value.
    pub fn next_byte(&mut self) -> u8 {
        self.seed = self.seed.wrapping_mul(214013).wrapping_add(2531011);
        ((self.seed >> 16) & 0x7fff) as u8
    }
}

/// Depth-to-stereogram compositor, painted last each frame.
///
/// Buffers track the viewport lazily: the first paint (and any paint
/// after a resize) reallocates the depth buffer, color buffer, pattern
/// strip, and the streaming texture.
#[derive(Debug)]
pub struct Stereogram {
    width: usize,
    height: usize,
    pattern_width: usize,
    depth_buffer: Vec<f32>,
    color_buffer: Vec<Rgb>,
    pattern: Vec<Rgb>,
    texture: Option<TextureId>,
    program: ShaderProgram,
    rng: PatternRng,
    released: bool,
}

impl Stereogram {
    /// Builds the screen-quad program; buffers stay empty until the
    /// first paint observes the viewport.
    pub fn new(device: &dyn GraphicsDevice) -> Self {
        Self::with_rng(device, PatternRng::from_clock())
    }

    /// Like [`new`](Self::new) with a caller-provided pattern generator.
    pub fn with_rng(device: &dyn GraphicsDevice, rng: PatternRng) -> Self {
        let program = ShaderProgram::new(
            device,
            &ProgramDescriptor {
                label: Some("stereogram composite"),
                vertex_src: shaders::SCREEN_VERT,
                fragment_src: shaders::SCREEN_FRAG,
                geometry_src: None,
                attributes: &[],
            },
        );
        Self {
            width: 0,
            height: 0,
            pattern_width: 0,
            depth_buffer: Vec::new(),
            color_buffer: Vec::new(),
            pattern: Vec::new(),
            texture: None,
            program,
            rng,
            released: false,
        }
    }

    /// Current buffer width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Current buffer height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Width of the repeating pattern strip in pixels.
    pub fn pattern_width(&self) -> usize {
        self.pattern_width
    }

    /// Composites one frame: flushes pending draws, reads depth back,
    /// rebuilds the stereogram image, and paints it over the viewport.
    pub fn render(&mut self, ctx: &mut FrameContext<'_>) -> Result<(), RenderError> {
        let device = ctx.device;

        // Scene draws must have landed before the depth readback.
        device.flush();

        self.adjust_buffers(device)?;
        if self.width == 0 || self.height == 0 {
            return Ok(());
        }

        self.fill_depth_buffer(device)?;
        if self.pattern_width > 0 {
            self.propagate_rows();
        }
        if ctx.input.debug_depth {
            self.write_depth_grayscale();
        }

        let _state = StateGuard::capture(device);
        self.upload(device)?;
        self.draw(device);
        Ok(())
    }

    /// Resizes all buffers to the viewport when it changed (or on first
    /// use), and re-randomizes the pattern strip either way.
    fn adjust_buffers(&mut self, device: &dyn GraphicsDevice) -> Result<(), RenderError> {
        let viewport = device.viewport();
        let width = viewport.width as usize;
        let height = viewport.height as usize;

        if self.texture.is_none() || width != self.width || height != self.height {
            self.width = width;
            self.height = height;
            self.pattern_width = width / PATTERN_DIV as usize;
            self.depth_buffer = vec![0.0; width * height];
            self.color_buffer = vec![Rgb::BLACK; width * height];
            self.pattern = vec![Rgb::BLACK; self.pattern_width * height];

            self.randomize_pattern();
            self.recreate_texture(device)?;
        } else {
            self.randomize_pattern();
        }
        Ok(())
    }

    /// Fills the pattern strip with fresh noise and copies it into the
    /// leftmost columns of the color buffer.
    fn randomize_pattern(&mut self) {
        for pixel in &mut self.pattern {
            *pixel = Rgb {
                r: self.rng.next_byte(),
                g: self.rng.next_byte(),
                b: self.rng.next_byte(),
            };
        }

        for y in 0..self.height {
            let color_row = y * self.width;
            let pattern_row = y * self.pattern_width;
            self.color_buffer[color_row..color_row + self.pattern_width]
                .copy_from_slice(&self.pattern[pattern_row..pattern_row + self.pattern_width]);
        }
    }

    fn recreate_texture(&mut self, device: &dyn GraphicsDevice) -> Result<(), RenderError> {
        let _state = StateGuard::capture(device);
        device.set_unpack_alignment(1);

        if let Some(old) = self.texture.take() {
            if let Err(err) = device.destroy_texture(old) {
                log::warn!("Failed to release stereogram texture: {err}");
            }
        }

        // The streaming updates are RGB; the initial image just needs
        // matching dimensions.
        let mut rgba = Vec::with_capacity(self.width * self.height * 4);
        for pixel in &self.color_buffer {
            rgba.extend_from_slice(&[pixel.r, pixel.g, pixel.b, 255]);
        }
        let texture = device.create_texture_2d(
            &TextureDescriptor {
                label: Some("stereogram image"),
                width: self.width as u32,
                height: self.height as u32,
            },
            &rgba,
        )?;
        self.texture = Some(texture);
        Ok(())
    }

    fn fill_depth_buffer(&mut self, device: &dyn GraphicsDevice) -> Result<(), RenderError> {
        let viewport = Viewport::with_size(self.width as u32, self.height as u32);
        device.read_depth_pixels(viewport, &mut self.depth_buffer)?;
        Ok(())
    }

    /// Maps a `[0, 1]` depth sample to its displacement byte: nearer
    /// geometry (smaller depth) displaces more.
    fn depth_byte(depth: f32) -> u32 {
        ((1.0 - f64::from(depth)) * 255.0) as u32
    }

    /// Propagates the seeded strip rightward. Each pixel copies from a
    /// column `pattern_width - shift` to its left, where `shift` is the
    /// displacement byte divided by [`PATTERN_DIV`], wrapped by whole
    /// strip widths so the source always lands in the already-resolved
    /// strip `[x - pattern_width, x)`.
    fn propagate_rows(&mut self) {
        for y in 0..self.height {
            let row = y * self.width;
            for x in self.pattern_width..self.width {
                let shift =
                    Self::depth_byte(self.depth_buffer[row + x]) as usize / PATTERN_DIV as usize;
                let source = x - self.pattern_width + shift % self.pattern_width;
                self.color_buffer[row + x] = self.color_buffer[row + source];
            }
        }
    }

    /// Replaces the image with the raw depth buffer as grayscale.
    fn write_depth_grayscale(&mut self) {
        for (pixel, &depth) in self.color_buffer.iter_mut().zip(&self.depth_buffer) {
            let value = Self::depth_byte(depth) as u8;
            *pixel = Rgb {
                r: value,
                g: value,
                b: value,
            };
        }
    }

    fn upload(&self, device: &dyn GraphicsDevice) -> Result<(), RenderError> {
        let Some(texture) = self.texture else {
            return Err(RenderError::NotInitialized);
        };
        device.bind_texture_2d(Some(texture));
        device.update_texture_2d(
            texture,
            self.width as u32,
            self.height as u32,
            bytemuck::cast_slice(&self.color_buffer),
        )?;
        Ok(())
    }

    fn draw(&self, device: &dyn GraphicsDevice) {
        device.set_matrix_mode(MatrixMode::Projection);
        device.load_matrix(Mat4::IDENTITY);
        device.set_matrix_mode(MatrixMode::Modelview);
        device.load_matrix(Mat4::orthographic_rh(
            0.0,
            self.width as f32,
            0.0,
            self.height as f32,
            -1.0,
            1.0,
        ));

        self.program.bind(device);
        self.program
            .set_uniform(device, "tex_sampler", UniformValue::Int(0));

        device.set_blend_enabled(true);
        device.set_active_texture_unit(0);
        device.bind_texture_2d(self.texture);
        device.draw_screen_quad(self.width as u32, self.height as u32);
    }

    /// Releases the streaming texture and the program. Idempotent.
    pub fn destroy(&mut self, device: &dyn GraphicsDevice) {
        if self.released {
            return;
        }
        self.released = true;

        if let Some(texture) = self.texture.take() {
            if let Err(err) = device.destroy_texture(texture) {
                log::warn!("Failed to release stereogram texture: {err}");
            }
        }
        self.program.destroy(device);
    }
}

impl Drop for Stereogram {
    fn drop(&mut self) {
        if !self.released {
            log::warn!("Stereogram dropped without destroy(); its GPU resources leak");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parallax_infra::{DrawKind, HeadlessDevice, TextureKind};

    fn render_once(device: &HeadlessDevice, stereogram: &mut Stereogram) {
        let mut ctx = FrameContext::new(device);
        stereogram.render(&mut ctx).unwrap();
    }

    #[test]
    fn rng_is_deterministic_per_seed() {
        let mut a = PatternRng::new(7);
        let mut b = PatternRng::new(7);
        let first: Vec<u8> = (0..16).map(|_| a.next_byte()).collect();
        let second: Vec<u8> = (0..16).map(|_| b.next_byte()).collect();
        assert_eq!(first, second);
        assert!(first.iter().any(|&v| v != first[0]), "not constant noise");
    }

    #[test]
    fn displacement_byte_is_bounded() {
        for depth in [0.0_f32, 0.25, 0.5, 0.75, 1.0] {
            let byte = Stereogram::depth_byte(depth);
            assert!(byte <= 255);
            assert!(byte / PATTERN_DIV <= 21);
        }
        assert_eq!(Stereogram::depth_byte(1.0), 0);
        assert_eq!(Stereogram::depth_byte(0.0), 255);
        // Truncation, not rounding.
        assert_eq!(Stereogram::depth_byte(0.5), 127);
    }

    #[test]
    fn buffers_track_the_viewport() {
        let device = HeadlessDevice::new();
        let mut stereogram = Stereogram::with_rng(&device, PatternRng::new(1));

        device.set_viewport(Viewport::with_size(120, 8));
        render_once(&device, &mut stereogram);
        assert_eq!(stereogram.width(), 120);
        assert_eq!(stereogram.height(), 8);
        assert_eq!(stereogram.pattern_width(), 10);
        let first_texture = stereogram.texture.unwrap();
        assert_eq!(
            device.texture_kind(first_texture),
            Some(TextureKind::Rgba2d {
                width: 120,
                height: 8
            })
        );

        device.set_viewport(Viewport::with_size(96, 4));
        render_once(&device, &mut stereogram);
        assert_eq!(stereogram.width(), 96);
        assert_eq!(stereogram.pattern_width(), 8);
        assert_eq!(device.texture_kind(first_texture), None, "old texture gone");
        assert_eq!(device.live_resources().textures, 1);

        stereogram.destroy(&device);
    }

    #[test]
    fn paints_one_screen_quad_over_the_viewport() {
        let device = HeadlessDevice::new();
        let mut stereogram = Stereogram::with_rng(&device, PatternRng::new(1));
        device.set_viewport(Viewport::with_size(60, 4));

        render_once(&device, &mut stereogram);

        let draws = device.draw_calls();
        assert_eq!(draws.len(), 1);
        assert_eq!(
            draws[0].kind,
            DrawKind::ScreenQuad {
                width: 60,
                height: 4
            }
        );
        assert!(draws[0].framebuffer.is_none());
        stereogram.destroy(&device);
    }

    #[test]
    fn constant_depth_repeats_with_a_constant_period() {
        let device = HeadlessDevice::new();
        device.set_viewport(Viewport::with_size(300, 2));
        // depth 0.5 -> byte 127 -> shift 10; strip width 25 -> period 15.
        device.set_depth_pixels(&vec![0.5_f32; 300 * 2]);

        let mut stereogram = Stereogram::with_rng(&device, PatternRng::new(42));
        render_once(&device, &mut stereogram);

        let period = stereogram.pattern_width() - 10;
        assert_eq!(stereogram.pattern_width(), 25);
        for y in 0..2 {
            let row = y * 300;
            for x in stereogram.pattern_width()..300 {
                assert_eq!(
                    stereogram.color_buffer[row + x],
                    stereogram.color_buffer[row + x - period],
                    "column {x} row {y}"
                );
            }
        }
        stereogram.destroy(&device);
    }

    #[test]
    fn every_displacement_byte_reads_a_resolved_column() {
        let device = HeadlessDevice::new();
        device.set_viewport(Viewport::with_size(128, 2));
        // One pixel per displacement byte 0..=255; the largest shifts
        // (up to 21) exceed the 10-column strip and must wrap into it.
        let depths: Vec<f32> = (0..128 * 2)
            .map(|i| 1.0 - (i as f32 % 256.0 + 0.5) / 255.0)
            .collect();
        device.set_depth_pixels(&depths);

        let mut stereogram = Stereogram::with_rng(&device, PatternRng::new(11));
        render_once(&device, &mut stereogram);

        let pw = stereogram.pattern_width();
        assert_eq!(pw, 10);
        for y in 0..2 {
            let row = y * 128;
            for x in pw..128 {
                let shift =
                    Stereogram::depth_byte(depths[row + x]) as usize / PATTERN_DIV as usize;
                let source = x - pw + shift % pw;
                assert!(source < x, "column {x} reads ahead of itself");
                assert_eq!(
                    stereogram.color_buffer[row + x],
                    stereogram.color_buffer[row + source],
                    "column {x} row {y}"
                );
            }
        }
        stereogram.destroy(&device);
    }

    #[test]
    fn far_depth_copies_the_strip_verbatim() {
        let device = HeadlessDevice::new();
        device.set_viewport(Viewport::with_size(48, 2));
        // Default readback is all 1.0: shift 0, source is x - pattern_width.

        let mut stereogram = Stereogram::with_rng(&device, PatternRng::new(3));
        render_once(&device, &mut stereogram);

        let pw = stereogram.pattern_width();
        assert_eq!(pw, 4);
        for x in pw..48 {
            assert_eq!(
                stereogram.color_buffer[x],
                stereogram.color_buffer[x - pw]
            );
        }
        stereogram.destroy(&device);
    }

    #[test]
    fn debug_mode_paints_depth_as_grayscale() {
        let device = HeadlessDevice::new();
        device.set_viewport(Viewport::with_size(36, 2));
        device.set_depth_pixels(&vec![0.25_f32; 36 * 2]);

        let mut stereogram = Stereogram::with_rng(&device, PatternRng::new(5));
        let mut ctx = FrameContext::new(&device);
        ctx.input.debug_depth = true;
        stereogram.render(&mut ctx).unwrap();

        let expected = Rgb {
            r: 191,
            g: 191,
            b: 191,
        };
        assert!(stereogram.color_buffer.iter().all(|&c| c == expected));
        stereogram.destroy(&device);
    }

    #[test]
    fn tiny_viewport_with_no_strip_still_paints() {
        let device = HeadlessDevice::new();
        device.set_viewport(Viewport::with_size(8, 4));

        let mut stereogram = Stereogram::with_rng(&device, PatternRng::new(1));
        render_once(&device, &mut stereogram);

        assert_eq!(stereogram.pattern_width(), 0);
        assert_eq!(device.draw_calls().len(), 1);
        stereogram.destroy(&device);
    }

    #[test]
    fn render_restores_ambient_state() {
        let device = HeadlessDevice::new();
        device.set_viewport(Viewport::with_size(60, 4));
        device.set_unpack_alignment(4);

        let mut stereogram = Stereogram::with_rng(&device, PatternRng::new(1));
        render_once(&device, &mut stereogram);

        assert_eq!(device.unpack_alignment(), 4);
        assert_eq!(device.matrix_mode(), MatrixMode::Modelview);
        assert_eq!(device.matrix(MatrixMode::Modelview), Mat4::IDENTITY);
        assert_eq!(device.bound_texture_2d(), None);
        stereogram.destroy(&device);
    }
}
