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

use crate::gfx::error::ResourceError;
use crate::gfx::resource::{
    BufferDescriptor, BufferId, FramebufferId, ProgramDescriptor, ProgramId, TextureDescriptor,
    TextureId, UniformLocation, UniformValue, VertexArrayId, VertexAttribute,
};
use crate::gfx::state::{CullFace, MatrixMode, Viewport};
use crate::math::Mat4;
use std::fmt::Debug;

/// The contract between the rendering core and a concrete graphics context.
///
/// The trait is deliberately not `Send` or `Sync`: the viewer assumes a
/// single active graphics context owned by one thread, and every component
/// takes `&dyn GraphicsDevice` per call rather than holding the device.
///
/// State getters exist for every piece of global state the core mutates
/// temporarily, so a scoped guard can capture and restore it; see the
/// render-state guard in `parallax-render`.
pub trait GraphicsDevice: Debug {
    // --- Programs ---

    /// Compiles and links a program from the descriptor's GLSL sources.
    ///
    /// Attribute names are bound to slots in their listed order before
    /// linking. Compile and link diagnostics are returned as
    /// [`ResourceError::Shader`]; callers decide whether that is fatal
    /// (the viewer logs and continues in a degraded mode).
    fn compile_program(&self, descriptor: &ProgramDescriptor) -> Result<ProgramId, ResourceError>;

    /// Releases a linked program.
    fn destroy_program(&self, id: ProgramId) -> Result<(), ResourceError>;

    /// Activates a program for subsequent draws, or deactivates with `None`.
    fn use_program(&self, id: Option<ProgramId>);

    /// Returns the currently active program, if any.
    fn current_program(&self) -> Option<ProgramId>;

    /// Looks up a named uniform in a linked program.
    ///
    /// Returns `None` when the program does not declare the name; this is
    /// expected, not an error — shading programs intentionally vary which
    /// uniforms they declare.
    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation>;

    /// Uploads a value to a uniform location of the active program.
    fn set_uniform(&self, location: UniformLocation, value: UniformValue);

    // --- Buffers and vertex arrays ---

    /// Creates a buffer with immutable contents.
    fn create_buffer(
        &self,
        descriptor: &BufferDescriptor,
        data: &[u8],
    ) -> Result<BufferId, ResourceError>;

    /// Releases a buffer.
    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError>;

    /// Creates a vertex array binding the given attribute streams to slots
    /// `0..attributes.len()` in order.
    fn create_vertex_array(
        &self,
        attributes: &[VertexAttribute],
    ) -> Result<VertexArrayId, ResourceError>;

    /// Releases a vertex array (not the buffers it references).
    fn destroy_vertex_array(&self, id: VertexArrayId) -> Result<(), ResourceError>;

    /// Binds a vertex array for subsequent indexed draws, or unbinds with
    /// `None`.
    fn bind_vertex_array(&self, id: Option<VertexArrayId>);

    // --- Textures ---

    /// Creates a 2D RGBA8 texture with mipmaps from tightly packed pixels.
    fn create_texture_2d(
        &self,
        descriptor: &TextureDescriptor,
        pixels: &[u8],
    ) -> Result<TextureId, ResourceError>;

    /// Creates a cube-map RGBA8 texture from six face images (+X, −X, +Y,
    /// −Y, +Z, −Z), each `width × height`.
    fn create_texture_cube(
        &self,
        descriptor: &TextureDescriptor,
        faces: [&[u8]; 6],
    ) -> Result<TextureId, ResourceError>;

    /// Creates a depth-only cube-map texture of `size × size` per face,
    /// suitable as the depth attachment of a shadow framebuffer.
    fn create_depth_cube_map(&self, size: u32) -> Result<TextureId, ResourceError>;

    /// Replaces the full contents of a 2D texture (RGB8, tightly packed).
    ///
    /// Used by the stereogram compositor, which re-uploads its color buffer
    /// every frame.
    fn update_texture_2d(
        &self,
        id: TextureId,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<(), ResourceError>;

    /// Releases a texture.
    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError>;

    /// Binds a 2D texture on the active texture unit, or unbinds with `None`.
    fn bind_texture_2d(&self, id: Option<TextureId>);

    /// Returns the 2D texture bound on the active texture unit, if any.
    fn bound_texture_2d(&self) -> Option<TextureId>;

    /// Binds a cube-map texture on the active texture unit.
    fn bind_texture_cube(&self, id: Option<TextureId>);

    /// Selects the active texture unit for subsequent binds.
    fn set_active_texture_unit(&self, unit: u32);

    // --- Framebuffers ---

    /// Creates an offscreen framebuffer with the given depth cube map as
    /// its only attachment (no color buffer).
    fn create_depth_framebuffer(&self, depth_cube: TextureId)
        -> Result<FramebufferId, ResourceError>;

    /// Releases a framebuffer (not its attachment).
    fn destroy_framebuffer(&self, id: FramebufferId) -> Result<(), ResourceError>;

    /// Binds a framebuffer as the draw target, or the default framebuffer
    /// with `None`.
    fn bind_framebuffer(&self, id: Option<FramebufferId>);

    /// Clears the depth attachment of the bound framebuffer.
    fn clear_depth(&self);

    // --- Fixed pipeline state ---

    /// Returns the current pixel unpack alignment.
    fn unpack_alignment(&self) -> i32;

    /// Sets the pixel unpack alignment used for texture uploads.
    fn set_unpack_alignment(&self, alignment: i32);

    /// Returns the active matrix mode.
    fn matrix_mode(&self) -> MatrixMode;

    /// Sets the active matrix mode.
    fn set_matrix_mode(&self, mode: MatrixMode);

    /// Replaces the top of the active matrix stack.
    fn load_matrix(&self, matrix: Mat4);

    /// Returns the top of the given matrix stack.
    fn matrix(&self, mode: MatrixMode) -> Mat4;

    /// Returns the current viewport rectangle.
    fn viewport(&self) -> Viewport;

    /// Sets the viewport rectangle.
    fn set_viewport(&self, viewport: Viewport);

    /// Returns the current face-culling mode.
    fn cull_face(&self) -> CullFace;

    /// Sets the face-culling mode.
    fn set_cull_face(&self, mode: CullFace);

    /// Enables or disables alpha blending.
    fn set_blend_enabled(&self, enabled: bool);

    /// Enables or disables the depth test.
    fn set_depth_test_enabled(&self, enabled: bool);

    // --- Draws and readback ---

    /// Issues an indexed triangle draw from the bound vertex array using
    /// the given index buffer.
    fn draw_indexed(&self, index_buffer: BufferId, index_count: u32);

    /// Draws a screen-aligned textured quad covering `width × height` of
    /// the current viewport, sampling the bound 2D texture.
    fn draw_screen_quad(&self, width: u32, height: u32);

    /// Reads back the depth attachment for `viewport` into `out`, one
    /// linearized `[0, 1]` float per pixel, row-major from the bottom-left.
    ///
    /// `out.len()` must equal `viewport.pixel_count()`.
    fn read_depth_pixels(&self, viewport: Viewport, out: &mut [f32]) -> Result<(), ResourceError>;

    /// Flushes pending commands so a following readback observes them.
    fn flush(&self);
}
