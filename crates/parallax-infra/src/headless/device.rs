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

//! A software [`GraphicsDevice`] that tracks state instead of rendering.
//!
//! The headless device mints handles, validates them on every use, keeps
//! the full client-visible pipeline state, parses `uniform` declarations
//! out of GLSL sources so named lookup behaves like a linked program, and
//! records draw calls and uniform writes for inspection. Depth readback is
//! served from a buffer installed through [`HeadlessDevice::set_depth_pixels`].

use parallax_core::gfx::{
    BufferDescriptor, BufferId, BufferKind, CullFace, FramebufferId, GraphicsDevice, MatrixMode,
    ProgramDescriptor, ProgramId, ResourceError, ShaderError, TextureDescriptor, TextureId,
    UniformLocation, UniformValue, VertexArrayId, VertexAttribute, Viewport,
};
use parallax_core::math::Mat4;
use std::cell::RefCell;
use std::collections::HashMap;

/// The kind of texture a handle refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureKind {
    /// A 2D RGBA8 image.
    Rgba2d {
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },
    /// A six-face RGBA8 cube map.
    RgbaCube {
        /// Edge length of each face in pixels.
        size: u32,
    },
    /// A depth-only cube map used as a shadow attachment.
    DepthCube {
        /// Edge length of each face in pixels.
        size: u32,
    },
}

/// What a recorded draw call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawKind {
    /// An indexed triangle draw.
    Indexed {
        /// The index buffer used.
        index_buffer: BufferId,
        /// Number of indices drawn.
        index_count: u32,
    },
    /// A screen-aligned textured quad.
    ScreenQuad {
        /// Quad width in pixels.
        width: u32,
        /// Quad height in pixels.
        height: u32,
    },
}

/// One recorded draw call plus the ambient state it was issued under.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    /// The draw itself.
    pub kind: DrawKind,
    /// The program active at the time, if any.
    pub program: Option<ProgramId>,
    /// The framebuffer bound at the time (`None` = default framebuffer).
    pub framebuffer: Option<FramebufferId>,
    /// The viewport at the time.
    pub viewport: Viewport,
    /// The face-culling mode at the time.
    pub cull_face: CullFace,
}

/// One recorded uniform upload, resolved back to its program and name.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformWrite {
    /// The program owning the location.
    pub program: ProgramId,
    /// The declared uniform name (array elements as `name[i]`).
    pub name: String,
    /// The uploaded value.
    pub value: UniformValue,
}

/// Counts of live (created, not yet destroyed) resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResourceCounts {
    /// Live buffers.
    pub buffers: usize,
    /// Live textures.
    pub textures: usize,
    /// Live programs.
    pub programs: usize,
    /// Live vertex arrays.
    pub vertex_arrays: usize,
    /// Live framebuffers.
    pub framebuffers: usize,
}

#[derive(Debug)]
struct BufferRecord {
    #[allow(dead_code)]
    kind: BufferKind,
    len: usize,
}

#[derive(Debug)]
struct ProgramRecord {
    label: String,
    uniforms: Vec<String>,
}

#[derive(Debug)]
struct State {
    current_program: Option<ProgramId>,
    bound_texture_2d: Option<TextureId>,
    bound_texture_cube: Option<TextureId>,
    bound_vertex_array: Option<VertexArrayId>,
    bound_framebuffer: Option<FramebufferId>,
    active_unit: u32,
    unpack_alignment: i32,
    matrix_mode: MatrixMode,
    modelview: Mat4,
    projection: Mat4,
    viewport: Viewport,
    cull_face: CullFace,
    blend: bool,
    depth_test: bool,
}

impl Default for State {
    fn default() -> Self {
        // Fresh-context values a real driver would report.
        Self {
            current_program: None,
            bound_texture_2d: None,
            bound_texture_cube: None,
            bound_vertex_array: None,
            bound_framebuffer: None,
            active_unit: 0,
            unpack_alignment: 4,
            matrix_mode: MatrixMode::default(),
            modelview: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            viewport: Viewport::with_size(640, 480),
            cull_face: CullFace::default(),
            blend: false,
            depth_test: false,
        }
    }
}

#[derive(Debug)]
struct Inner {
    next_id: usize,
    buffers: HashMap<usize, BufferRecord>,
    textures: HashMap<usize, TextureKind>,
    programs: HashMap<usize, ProgramRecord>,
    vertex_arrays: HashMap<usize, Vec<VertexAttribute>>,
    framebuffers: HashMap<usize, TextureId>,
    locations: HashMap<u32, (ProgramId, String)>,
    next_location: u32,
    state: State,
    depth_pixels: Vec<f32>,
    draw_calls: Vec<DrawCall>,
    uniform_writes: Vec<UniformWrite>,
}

impl Default for Inner {
    fn default() -> Self {
        Self {
            next_id: 1,
            buffers: HashMap::new(),
            textures: HashMap::new(),
            programs: HashMap::new(),
            vertex_arrays: HashMap::new(),
            framebuffers: HashMap::new(),
            locations: HashMap::new(),
            next_location: 0,
            state: State::default(),
            depth_pixels: Vec::new(),
            draw_calls: Vec::new(),
            uniform_writes: Vec::new(),
        }
    }
}

/// A context-free [`GraphicsDevice`] backed by plain bookkeeping.
#[derive(Debug, Default)]
pub struct HeadlessDevice {
    inner: RefCell<Inner>,
}

impl HeadlessDevice {
    /// Creates a device with a fresh-context default state
    /// (unpack alignment 4, identity matrices, 640×480 viewport).
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the depth buffer served by `read_depth_pixels`.
    ///
    /// The slice is interpreted against whatever viewport the reader
    /// passes; install one float per viewport pixel.
    pub fn set_depth_pixels(&self, pixels: &[f32]) {
        self.inner.borrow_mut().depth_pixels = pixels.to_vec();
    }

    /// Returns all recorded draw calls in issue order.
    pub fn draw_calls(&self) -> Vec<DrawCall> {
        self.inner.borrow().draw_calls.clone()
    }

    /// Clears the recorded draw calls.
    pub fn clear_draw_calls(&self) {
        self.inner.borrow_mut().draw_calls.clear();
    }

    /// Returns all recorded uniform writes in issue order.
    pub fn uniform_writes(&self) -> Vec<UniformWrite> {
        self.inner.borrow().uniform_writes.clone()
    }

    /// Clears the recorded uniform writes.
    pub fn clear_uniform_writes(&self) {
        self.inner.borrow_mut().uniform_writes.clear();
    }

    /// Counts of currently live resources, for leak assertions.
    pub fn live_resources(&self) -> ResourceCounts {
        let inner = self.inner.borrow();
        ResourceCounts {
            buffers: inner.buffers.len(),
            textures: inner.textures.len(),
            programs: inner.programs.len(),
            vertex_arrays: inner.vertex_arrays.len(),
            framebuffers: inner.framebuffers.len(),
        }
    }

    /// Returns the kind of a live texture, if the handle is live.
    pub fn texture_kind(&self, id: TextureId) -> Option<TextureKind> {
        self.inner.borrow().textures.get(&id.0).copied()
    }

    fn mint_id(inner: &mut Inner) -> usize {
        let id = inner.next_id;
        inner.next_id += 1;
        id
    }
}

/// Extracts declared uniform names from GLSL source.
///
/// Good enough for the embedded shaders: scans `;`-terminated statements
/// for a leading `uniform` keyword. Array declarations such as
/// `uniform vec3 light_pos[5];` register the base name and each
/// `name[i]` element, matching GL's location queries.
fn parse_uniform_names(sources: &[&str]) -> Vec<String> {
    let mut names = Vec::new();
    for source in sources {
        for statement in source.split(';') {
            let mut tokens = statement.split_whitespace();
            // Skip leading qualifiers until the `uniform` keyword, if any.
            let mut saw_uniform = false;
            for token in tokens.by_ref() {
                if token == "uniform" {
                    saw_uniform = true;
                    break;
                }
            }
            if !saw_uniform {
                continue;
            }
            let Some(_ty) = tokens.next() else { continue };
            let Some(raw_name) = tokens.next() else {
                continue;
            };

            if let Some(bracket) = raw_name.find('[') {
                let base = &raw_name[..bracket];
                let count: usize = raw_name[bracket + 1..]
                    .trim_end_matches(']')
                    .parse()
                    .unwrap_or(0);
                push_unique(&mut names, base.to_string());
                for i in 0..count {
                    push_unique(&mut names, format!("{base}[{i}]"));
                }
            } else {
                push_unique(&mut names, raw_name.to_string());
            }
        }
    }
    names
}

fn push_unique(names: &mut Vec<String>, name: String) {
    if !names.contains(&name) {
        names.push(name);
    }
}

impl GraphicsDevice for HeadlessDevice {
    fn compile_program(&self, descriptor: &ProgramDescriptor) -> Result<ProgramId, ResourceError> {
        let label = descriptor.label.unwrap_or("unnamed").to_string();

        if descriptor.vertex_src.trim().is_empty() || descriptor.fragment_src.trim().is_empty() {
            return Err(ShaderError::CompilationError {
                label,
                details: "empty shader source".to_string(),
            }
            .into());
        }

        let mut sources = vec![descriptor.vertex_src, descriptor.fragment_src];
        if let Some(geometry) = descriptor.geometry_src {
            sources.push(geometry);
        }
        let uniforms = parse_uniform_names(&sources);

        let mut inner = self.inner.borrow_mut();
        let id = Self::mint_id(&mut inner);
        inner.programs.insert(id, ProgramRecord { label, uniforms });
        Ok(ProgramId(id))
    }

    fn destroy_program(&self, id: ProgramId) -> Result<(), ResourceError> {
        let mut inner = self.inner.borrow_mut();
        if inner.programs.remove(&id.0).is_none() {
            return Err(ResourceError::InvalidHandle);
        }
        if inner.state.current_program == Some(id) {
            inner.state.current_program = None;
        }
        Ok(())
    }

    fn use_program(&self, id: Option<ProgramId>) {
        let mut inner = self.inner.borrow_mut();
        if let Some(id) = id {
            if !inner.programs.contains_key(&id.0) {
                log::warn!("use_program on a dead handle {id:?}; ignoring");
                return;
            }
        }
        inner.state.current_program = id;
    }

    fn current_program(&self) -> Option<ProgramId> {
        self.inner.borrow().state.current_program
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        let mut inner = self.inner.borrow_mut();
        let record = inner.programs.get(&program.0)?;
        if !record.uniforms.iter().any(|u| u == name) {
            log::trace!(
                "program '{}' does not declare uniform '{name}'",
                record.label
            );
            return None;
        }
        let location = inner.next_location;
        inner.next_location += 1;
        inner
            .locations
            .insert(location, (program, name.to_string()));
        Some(UniformLocation(location))
    }

    fn set_uniform(&self, location: UniformLocation, value: UniformValue) {
        let mut inner = self.inner.borrow_mut();
        match inner.locations.get(&location.0) {
            Some((program, name)) => {
                let write = UniformWrite {
                    program: *program,
                    name: name.clone(),
                    value,
                };
                inner.uniform_writes.push(write);
            }
            None => log::warn!("set_uniform on unknown location {location:?}; ignoring"),
        }
    }

    fn create_buffer(
        &self,
        descriptor: &BufferDescriptor,
        data: &[u8],
    ) -> Result<BufferId, ResourceError> {
        let mut inner = self.inner.borrow_mut();
        let id = Self::mint_id(&mut inner);
        inner.buffers.insert(
            id,
            BufferRecord {
                kind: descriptor.kind,
                len: data.len(),
            },
        );
        Ok(BufferId(id))
    }

    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError> {
        if self.inner.borrow_mut().buffers.remove(&id.0).is_none() {
            return Err(ResourceError::InvalidHandle);
        }
        Ok(())
    }

    fn create_vertex_array(
        &self,
        attributes: &[VertexAttribute],
    ) -> Result<VertexArrayId, ResourceError> {
        let mut inner = self.inner.borrow_mut();
        for attribute in attributes {
            if !inner.buffers.contains_key(&attribute.buffer.0) {
                return Err(ResourceError::InvalidHandle);
            }
        }
        let id = Self::mint_id(&mut inner);
        inner.vertex_arrays.insert(id, attributes.to_vec());
        Ok(VertexArrayId(id))
    }

    fn destroy_vertex_array(&self, id: VertexArrayId) -> Result<(), ResourceError> {
        let mut inner = self.inner.borrow_mut();
        if inner.vertex_arrays.remove(&id.0).is_none() {
            return Err(ResourceError::InvalidHandle);
        }
        if inner.state.bound_vertex_array == Some(id) {
            inner.state.bound_vertex_array = None;
        }
        Ok(())
    }

    fn bind_vertex_array(&self, id: Option<VertexArrayId>) {
        self.inner.borrow_mut().state.bound_vertex_array = id;
    }

    fn create_texture_2d(
        &self,
        descriptor: &TextureDescriptor,
        pixels: &[u8],
    ) -> Result<TextureId, ResourceError> {
        let expected = descriptor.width as usize * descriptor.height as usize * 4;
        if pixels.len() != expected {
            return Err(ResourceError::OutOfBounds);
        }
        let mut inner = self.inner.borrow_mut();
        let id = Self::mint_id(&mut inner);
        inner.textures.insert(
            id,
            TextureKind::Rgba2d {
                width: descriptor.width,
                height: descriptor.height,
            },
        );
        Ok(TextureId(id))
    }

    fn create_texture_cube(
        &self,
        descriptor: &TextureDescriptor,
        faces: [&[u8]; 6],
    ) -> Result<TextureId, ResourceError> {
        let expected = descriptor.width as usize * descriptor.height as usize * 4;
        if faces.iter().any(|face| face.len() != expected) {
            return Err(ResourceError::OutOfBounds);
        }
        if descriptor.width != descriptor.height {
            return Err(ResourceError::BackendError(
                "cube faces must be square".to_string(),
            ));
        }
        let mut inner = self.inner.borrow_mut();
        let id = Self::mint_id(&mut inner);
        inner.textures.insert(
            id,
            TextureKind::RgbaCube {
                size: descriptor.width,
            },
        );
        Ok(TextureId(id))
    }

    fn create_depth_cube_map(&self, size: u32) -> Result<TextureId, ResourceError> {
        if size == 0 {
            return Err(ResourceError::AllocationFailed(
                "zero-sized depth cube map".to_string(),
            ));
        }
        let mut inner = self.inner.borrow_mut();
        let id = Self::mint_id(&mut inner);
        inner.textures.insert(id, TextureKind::DepthCube { size });
        Ok(TextureId(id))
    }

    fn update_texture_2d(
        &self,
        id: TextureId,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<(), ResourceError> {
        if pixels.len() != width as usize * height as usize * 3 {
            return Err(ResourceError::OutOfBounds);
        }
        let mut inner = self.inner.borrow_mut();
        match inner.textures.get_mut(&id.0) {
            Some(kind @ TextureKind::Rgba2d { .. }) => {
                *kind = TextureKind::Rgba2d { width, height };
                Ok(())
            }
            Some(_) => Err(ResourceError::BackendError(
                "update_texture_2d on a non-2D texture".to_string(),
            )),
            None => Err(ResourceError::InvalidHandle),
        }
    }

    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError> {
        let mut inner = self.inner.borrow_mut();
        if inner.textures.remove(&id.0).is_none() {
            return Err(ResourceError::InvalidHandle);
        }
        if inner.state.bound_texture_2d == Some(id) {
            inner.state.bound_texture_2d = None;
        }
        if inner.state.bound_texture_cube == Some(id) {
            inner.state.bound_texture_cube = None;
        }
        Ok(())
    }

    fn bind_texture_2d(&self, id: Option<TextureId>) {
        self.inner.borrow_mut().state.bound_texture_2d = id;
    }

    fn bound_texture_2d(&self) -> Option<TextureId> {
        self.inner.borrow().state.bound_texture_2d
    }

    fn bind_texture_cube(&self, id: Option<TextureId>) {
        self.inner.borrow_mut().state.bound_texture_cube = id;
    }

    fn set_active_texture_unit(&self, unit: u32) {
        self.inner.borrow_mut().state.active_unit = unit;
    }

    fn create_depth_framebuffer(
        &self,
        depth_cube: TextureId,
    ) -> Result<FramebufferId, ResourceError> {
        let mut inner = self.inner.borrow_mut();
        match inner.textures.get(&depth_cube.0) {
            Some(TextureKind::DepthCube { .. }) => {}
            Some(_) => {
                return Err(ResourceError::BackendError(
                    "depth framebuffer attachment must be a depth cube map".to_string(),
                ))
            }
            None => return Err(ResourceError::InvalidHandle),
        }
        let id = Self::mint_id(&mut inner);
        inner.framebuffers.insert(id, depth_cube);
        Ok(FramebufferId(id))
    }

    fn destroy_framebuffer(&self, id: FramebufferId) -> Result<(), ResourceError> {
        let mut inner = self.inner.borrow_mut();
        if inner.framebuffers.remove(&id.0).is_none() {
            return Err(ResourceError::InvalidHandle);
        }
        if inner.state.bound_framebuffer == Some(id) {
            inner.state.bound_framebuffer = None;
        }
        Ok(())
    }

    fn bind_framebuffer(&self, id: Option<FramebufferId>) {
        self.inner.borrow_mut().state.bound_framebuffer = id;
    }

    fn clear_depth(&self) {}

    fn unpack_alignment(&self) -> i32 {
        self.inner.borrow().state.unpack_alignment
    }

    fn set_unpack_alignment(&self, alignment: i32) {
        self.inner.borrow_mut().state.unpack_alignment = alignment;
    }

    fn matrix_mode(&self) -> MatrixMode {
        self.inner.borrow().state.matrix_mode
    }

    fn set_matrix_mode(&self, mode: MatrixMode) {
        self.inner.borrow_mut().state.matrix_mode = mode;
    }

    fn load_matrix(&self, matrix: Mat4) {
        let mut inner = self.inner.borrow_mut();
        match inner.state.matrix_mode {
            MatrixMode::Modelview => inner.state.modelview = matrix,
            MatrixMode::Projection => inner.state.projection = matrix,
        }
    }

    fn matrix(&self, mode: MatrixMode) -> Mat4 {
        let inner = self.inner.borrow();
        match mode {
            MatrixMode::Modelview => inner.state.modelview,
            MatrixMode::Projection => inner.state.projection,
        }
    }

    fn viewport(&self) -> Viewport {
        self.inner.borrow().state.viewport
    }

    fn set_viewport(&self, viewport: Viewport) {
        self.inner.borrow_mut().state.viewport = viewport;
    }

    fn cull_face(&self) -> CullFace {
        self.inner.borrow().state.cull_face
    }

    fn set_cull_face(&self, mode: CullFace) {
        self.inner.borrow_mut().state.cull_face = mode;
    }

    fn set_blend_enabled(&self, enabled: bool) {
        self.inner.borrow_mut().state.blend = enabled;
    }

    fn set_depth_test_enabled(&self, enabled: bool) {
        self.inner.borrow_mut().state.depth_test = enabled;
    }

    fn draw_indexed(&self, index_buffer: BufferId, index_count: u32) {
        let mut inner = self.inner.borrow_mut();
        let Some(record) = inner.buffers.get(&index_buffer.0) else {
            log::warn!("draw_indexed with a dead index buffer {index_buffer:?}; ignoring");
            return;
        };
        if index_count as usize * std::mem::size_of::<u32>() > record.len {
            log::warn!("draw_indexed overruns index buffer {index_buffer:?}; ignoring");
            return;
        }
        let call = DrawCall {
            kind: DrawKind::Indexed {
                index_buffer,
                index_count,
            },
            program: inner.state.current_program,
            framebuffer: inner.state.bound_framebuffer,
            viewport: inner.state.viewport,
            cull_face: inner.state.cull_face,
        };
        inner.draw_calls.push(call);
    }

    fn draw_screen_quad(&self, width: u32, height: u32) {
        let mut inner = self.inner.borrow_mut();
        let call = DrawCall {
            kind: DrawKind::ScreenQuad { width, height },
            program: inner.state.current_program,
            framebuffer: inner.state.bound_framebuffer,
            viewport: inner.state.viewport,
            cull_face: inner.state.cull_face,
        };
        inner.draw_calls.push(call);
    }

    fn read_depth_pixels(&self, viewport: Viewport, out: &mut [f32]) -> Result<(), ResourceError> {
        if out.len() != viewport.pixel_count() {
            return Err(ResourceError::OutOfBounds);
        }
        let inner = self.inner.borrow();
        if inner.depth_pixels.len() == out.len() {
            out.copy_from_slice(&inner.depth_pixels);
        } else {
            // No scene depth installed: a cleared depth buffer reads 1.0.
            out.fill(1.0);
        }
        Ok(())
    }

    fn flush(&self) {}
}
