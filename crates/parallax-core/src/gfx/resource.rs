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

//! Resource handles and creation descriptors for the device contract.
//!
//! Handles are opaque IDs minted by a [`super::GraphicsDevice`]; each
//! wrapper type in `parallax-render` exclusively owns its handle and
//! releases it through the device. Handles are never shared or
//! reference-counted.

use crate::math::{Mat4, Vec3};

/// An opaque handle to a device buffer (vertex or index data).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub usize);

/// An opaque handle to a device texture (2D, cube, or depth cube).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub usize);

/// An opaque handle to a linked shader program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub usize);

/// An opaque handle to a vertex-array binding of attribute buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexArrayId(pub usize);

/// An opaque handle to an offscreen framebuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FramebufferId(pub usize);

/// The location of a uniform within a linked program.
///
/// Obtained from [`super::GraphicsDevice::uniform_location`]; a name the
/// program does not declare yields no location, and callers treat that as
/// a silent no-op rather than an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

/// The intended use of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    /// Per-vertex attribute data.
    Vertex,
    /// Triangle index data.
    Index,
}

/// Describes a buffer to be created with immutable contents.
#[derive(Debug, Clone, Copy)]
pub struct BufferDescriptor<'a> {
    /// Optional debug label.
    pub label: Option<&'a str>,
    /// The intended use of the buffer.
    pub kind: BufferKind,
}

/// Describes a texture image to be created.
///
/// Pixel data is tightly packed RGBA8 (2D / cube faces); the device is
/// expected to upload with unpack alignment 1 and generate mipmaps.
#[derive(Debug, Clone, Copy)]
pub struct TextureDescriptor<'a> {
    /// Optional debug label.
    pub label: Option<&'a str>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Describes a program to compile and link from GLSL sources.
///
/// `attributes` lists vertex attribute names in slot order: the name at
/// index `i` is bound to attribute slot `i` before linking.
#[derive(Debug, Clone, Copy)]
pub struct ProgramDescriptor<'a> {
    /// Optional debug label, used in diagnostics.
    pub label: Option<&'a str>,
    /// Vertex stage source.
    pub vertex_src: &'a str,
    /// Fragment stage source.
    pub fragment_src: &'a str,
    /// Optional geometry stage source (used by the layered shadow pass).
    pub geometry_src: Option<&'a str>,
    /// Attribute names in slot order.
    pub attributes: &'a [&'a str],
}

/// One vertex attribute stream backing a vertex array.
///
/// The slot index is the attribute's position in the slice passed to
/// [`super::GraphicsDevice::create_vertex_array`].
#[derive(Debug, Clone, Copy)]
pub struct VertexAttribute {
    /// The buffer holding this attribute's data.
    pub buffer: BufferId,
    /// Number of `f32` components per vertex (2 for UVs, 3 for positions).
    pub components: u32,
}

/// A uniform value to upload to a program location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    /// A single `i32` (also used for sampler unit bindings).
    Int(i32),
    /// A single `f32`.
    Float(f32),
    /// A 3-component vector.
    Vec3(Vec3),
    /// A 4x4 column-major matrix.
    Mat4(Mat4),
}
