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

//! The renderable mesh: GPU-side model data, its shading programs, and
//! its light set.
//!
//! Rendering is a two-phase state machine. While any registered light
//! has a stale shadow map, one render call regenerates exactly one map
//! (insertion order) and draws nothing else; once every map is ready,
//! render calls shade normally.

use crate::error::MeshError;
use crate::frame::FrameContext;
use crate::program::ShaderProgram;
use crate::shaders;
use crate::shadow::{MeshGeometry, ShadowMapGenerator};
use crate::state_guard::StateGuard;
use parallax_core::camera::CameraSource;
use parallax_core::geometry::MeshData;
use parallax_core::gfx::{
    BufferDescriptor, BufferId, BufferKind, CullFace, GraphicsDevice, ProgramDescriptor,
    RenderError, TextureDescriptor, TextureId, UniformValue, VertexArrayId, VertexAttribute,
};
use parallax_core::light::{Light, LightRegistry};
use parallax_core::math::Vec3;
use std::rc::Rc;

/// Attribute slot order shared by every mesh program.
const ATTRIBUTES: &[&str] = &["vertex_position", "vertex_uv", "vertex_normal"];

#[derive(Debug, Clone, Copy)]
struct TextureRef {
    id: TextureId,
    cube: bool,
}

/// Device handles created so far during construction, released together
/// if a later step fails.
#[derive(Debug, Default)]
struct PendingResources {
    buffers: Vec<BufferId>,
    textures: Vec<TextureId>,
    vertex_arrays: Vec<VertexArrayId>,
}

impl PendingResources {
    fn release(self, device: &dyn GraphicsDevice) {
        for id in self.vertex_arrays {
            if let Err(err) = device.destroy_vertex_array(id) {
                log::warn!("Rollback failed for vertex array {id:?}: {err}");
            }
        }
        for id in self.textures {
            if let Err(err) = device.destroy_texture(id) {
                log::warn!("Rollback failed for texture {id:?}: {err}");
            }
        }
        for id in self.buffers {
            if let Err(err) = device.destroy_buffer(id) {
                log::warn!("Rollback failed for buffer {id:?}: {err}");
            }
        }
    }
}

/// A model uploaded to the device, ready to paint.
///
/// Owns all of its GPU resources exclusively; call
/// [`destroy`](Self::destroy) before dropping to release them.
#[derive(Debug)]
pub struct RenderMesh {
    position_buffer: BufferId,
    uv_buffer: BufferId,
    normal_buffer: BufferId,
    vertex_array: VertexArrayId,
    surfaces: Vec<(BufferId, u32)>,
    textures: Vec<TextureRef>,
    lights: LightRegistry,
    lit: ShaderProgram,
    unlit: ShaderProgram,
    shadow: ShadowMapGenerator,
    camera: Option<Rc<dyn CameraSource>>,
    released: bool,
}

impl RenderMesh {
    /// Validates `data` and uploads it: attribute buffers, one index
    /// buffer per surface, one texture per image set, plus the three
    /// shading programs.
    ///
    /// Touched upload state (unpack alignment, texture binding) is
    /// restored before returning. On error, every resource created so
    /// far is released.
    pub fn new(device: &dyn GraphicsDevice, data: &MeshData) -> Result<Self, MeshError> {
        data.validate()?;

        let _state = StateGuard::capture(device);
        let mut pending = PendingResources::default();
        match Self::upload(device, data, &mut pending) {
            Ok(mesh) => Ok(mesh),
            Err(err) => {
                pending.release(device);
                Err(err.into())
            }
        }
    }

    fn upload(
        device: &dyn GraphicsDevice,
        data: &MeshData,
        pending: &mut PendingResources,
    ) -> Result<Self, parallax_core::gfx::ResourceError> {
        device.set_unpack_alignment(1);

        let position_buffer = device.create_buffer(
            &BufferDescriptor {
                label: Some("mesh positions"),
                kind: BufferKind::Vertex,
            },
            bytemuck::cast_slice(&data.positions),
        )?;
        pending.buffers.push(position_buffer);

        let uv_buffer = device.create_buffer(
            &BufferDescriptor {
                label: Some("mesh uvs"),
                kind: BufferKind::Vertex,
            },
            bytemuck::cast_slice(&data.uvs),
        )?;
        pending.buffers.push(uv_buffer);

        let normal_buffer = device.create_buffer(
            &BufferDescriptor {
                label: Some("mesh normals"),
                kind: BufferKind::Vertex,
            },
            bytemuck::cast_slice(&data.normals),
        )?;
        pending.buffers.push(normal_buffer);

        // Slot order must match ATTRIBUTES.
        let vertex_array = device.create_vertex_array(&[
            VertexAttribute {
                buffer: position_buffer,
                components: 3,
            },
            VertexAttribute {
                buffer: uv_buffer,
                components: 2,
            },
            VertexAttribute {
                buffer: normal_buffer,
                components: 3,
            },
        ])?;
        pending.vertex_arrays.push(vertex_array);

        let mut surfaces = Vec::with_capacity(data.surfaces.len());
        for surface in &data.surfaces {
            let index_buffer = device.create_buffer(
                &BufferDescriptor {
                    label: Some("mesh indices"),
                    kind: BufferKind::Index,
                },
                bytemuck::cast_slice(&surface.indices),
            )?;
            pending.buffers.push(index_buffer);
            surfaces.push((index_buffer, surface.indices.len() as u32));
        }

        let mut textures = Vec::with_capacity(data.textures.len());
        for texture in &data.textures {
            let descriptor = TextureDescriptor {
                label: Some("mesh texture"),
                width: texture.width,
                height: texture.height,
            };
            let cube = texture.is_cube();
            let id = if cube {
                let f = &texture.faces;
                device.create_texture_cube(&descriptor, [&f[0], &f[1], &f[2], &f[3], &f[4], &f[5]])?
            } else {
                device.create_texture_2d(&descriptor, &texture.faces[0])?
            };
            pending.textures.push(id);
            textures.push(TextureRef { id, cube });
        }

        let lit = ShaderProgram::new(
            device,
            &ProgramDescriptor {
                label: Some("lit shading"),
                vertex_src: shaders::LIT_VERT,
                fragment_src: shaders::LIT_FRAG,
                geometry_src: None,
                attributes: ATTRIBUTES,
            },
        );
        let unlit = ShaderProgram::new(
            device,
            &ProgramDescriptor {
                label: Some("unlit shading"),
                vertex_src: shaders::UNLIT_VERT,
                fragment_src: shaders::UNLIT_FRAG,
                geometry_src: None,
                attributes: ATTRIBUTES,
            },
        );
        let shadow = ShadowMapGenerator::new(device);

        Ok(Self {
            position_buffer,
            uv_buffer,
            normal_buffer,
            vertex_array,
            surfaces,
            textures,
            lights: LightRegistry::new(),
            lit,
            unlit,
            shadow,
            camera: None,
            released: false,
        })
    }

    /// Attaches the camera whose position feeds shading and light
    /// placement. Rendering fails with [`RenderError::NotInitialized`]
    /// until one is attached.
    pub fn attach_camera(&mut self, camera: Rc<dyn CameraSource>) {
        self.camera = Some(camera);
    }

    /// Registers a light at `origin`, evicting the oldest lights while
    /// at capacity and releasing their shadow maps. The new light's map
    /// is generated lazily by the next render calls.
    pub fn add_light(&mut self, device: &dyn GraphicsDevice, origin: Vec3, color: Vec3) {
        let evicted = self.lights.push(Light::new(origin, color));
        for light in evicted {
            if let Some(depth_map) = light.depth_map {
                if let Err(err) = device.destroy_texture(depth_map) {
                    log::warn!("Failed to release evicted shadow map: {err}");
                }
            }
        }
    }

    /// The active lights, in shading order.
    pub fn lights(&self) -> &LightRegistry {
        &self.lights
    }

    /// Paints one frame of the mesh.
    ///
    /// Consumes a pending light-spawn request, then either regenerates
    /// the first stale shadow map (and returns without shading) or
    /// shades every textured surface with the full light set.
    pub fn render(&mut self, ctx: &mut FrameContext<'_>) -> Result<(), RenderError> {
        let camera_position = self
            .camera
            .as_ref()
            .ok_or(RenderError::NotInitialized)?
            .position();
        let device = ctx.device;

        if let Some(color) = ctx.input.add_light.take() {
            self.add_light(device, camera_position, color);
        }

        // Surfaces beyond the texture list are skipped, never drawn bare.
        let drawable = self.surfaces.len().min(self.textures.len());
        let geometry = MeshGeometry {
            vertex_array: self.vertex_array,
            surfaces: &self.surfaces[..drawable],
        };

        if let Some(light) = self.lights.first_stale_mut() {
            return self.shadow.generate(device, light, &geometry);
        }

        device.set_blend_enabled(true);
        device.set_depth_test_enabled(true);
        device.set_cull_face(CullFace::Back);

        let program = if ctx.input.unlit {
            &self.unlit
        } else {
            &self.lit
        };
        program.bind(device);

        program.set_uniform(
            device,
            "camera_position",
            UniformValue::Vec3(camera_position),
        );
        program.set_uniform(
            device,
            "light_color_ambient",
            UniformValue::Vec3(Vec3::new(0.5, 0.5, 0.5)),
        );
        program.set_uniform(device, "ambient_intensity", UniformValue::Float(0.4));
        program.set_uniform(device, "diffuse_intensity", UniformValue::Float(1.0));
        program.set_uniform(device, "specular_intensity", UniformValue::Float(1.0));
        program.set_uniform(device, "shininess", UniformValue::Float(64.0));
        program.set_uniform(device, "texture_sampler", UniformValue::Int(0));
        program.set_uniform(
            device,
            "light_count",
            UniformValue::Int(self.lights.len() as i32),
        );
        for (i, light) in self.lights.iter().enumerate() {
            program.set_uniform(
                device,
                &format!("depth_map[{i}]"),
                UniformValue::Int(1 + i as i32),
            );
            program.set_uniform(
                device,
                &format!("light_pos[{i}]"),
                UniformValue::Vec3(light.origin),
            );
            program.set_uniform(
                device,
                &format!("light_color[{i}]"),
                UniformValue::Vec3(light.color),
            );
        }

        device.bind_vertex_array(Some(self.vertex_array));
        for (&(index_buffer, index_count), texture) in self.surfaces.iter().zip(&self.textures) {
            device.set_active_texture_unit(0);
            if texture.cube {
                device.bind_texture_cube(Some(texture.id));
            } else {
                device.bind_texture_2d(Some(texture.id));
            }
            for (j, light) in self.lights.iter().enumerate() {
                device.set_active_texture_unit(1 + j as u32);
                device.bind_texture_cube(light.depth_map);
            }
            device.draw_indexed(index_buffer, index_count);
        }
        device.set_active_texture_unit(0);
        device.bind_vertex_array(None);

        Ok(())
    }

    /// Releases every GPU resource this mesh owns. Idempotent.
    pub fn destroy(&mut self, device: &dyn GraphicsDevice) {
        if self.released {
            return;
        }
        self.released = true;

        self.lit.destroy(device);
        self.unlit.destroy(device);
        self.shadow.destroy(device);

        for light in self.lights.drain() {
            if let Some(depth_map) = light.depth_map {
                if let Err(err) = device.destroy_texture(depth_map) {
                    log::warn!("Failed to release shadow map: {err}");
                }
            }
        }
        for texture in self.textures.drain(..) {
            if let Err(err) = device.destroy_texture(texture.id) {
                log::warn!("Failed to release mesh texture: {err}");
            }
        }
        for (index_buffer, _) in self.surfaces.drain(..) {
            if let Err(err) = device.destroy_buffer(index_buffer) {
                log::warn!("Failed to release index buffer: {err}");
            }
        }
        if let Err(err) = device.destroy_vertex_array(self.vertex_array) {
            log::warn!("Failed to release vertex array: {err}");
        }
        for buffer in [self.position_buffer, self.uv_buffer, self.normal_buffer] {
            if let Err(err) = device.destroy_buffer(buffer) {
                log::warn!("Failed to release vertex buffer: {err}");
            }
        }
    }
}

impl Drop for RenderMesh {
    fn drop(&mut self) {
        if !self.released {
            log::warn!("RenderMesh dropped without destroy(); its GPU resources leak");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parallax_core::camera::FixedCamera;
    use parallax_core::geometry::{Surface, TextureData};
    use parallax_core::light::MAX_LIGHTS;
    use parallax_infra::HeadlessDevice;

    fn triangle_data() -> MeshData {
        MeshData {
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            normals: vec![[0.0, 0.0, 1.0]; 3],
            uvs: vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]],
            surfaces: vec![Surface {
                indices: vec![0, 1, 2],
            }],
            textures: vec![TextureData {
                width: 1,
                height: 1,
                faces: vec![vec![255, 0, 0, 255]],
            }],
        }
    }

    fn mesh_with_camera(device: &HeadlessDevice) -> RenderMesh {
        let mut mesh = RenderMesh::new(device, &triangle_data()).unwrap();
        mesh.attach_camera(Rc::new(FixedCamera(Vec3::new(0.0, 0.0, 10.0))));
        mesh
    }

    #[test]
    fn invalid_data_is_rejected_before_any_upload() {
        let device = HeadlessDevice::new();
        let mut data = triangle_data();
        data.normals.pop();

        let err = RenderMesh::new(&device, &data).unwrap_err();
        assert!(matches!(err, MeshError::InvalidGeometry(_)));
        assert_eq!(device.live_resources(), Default::default());
    }

    #[test]
    fn mesh_with_attached_camera_is_debug_printable() {
        let device = HeadlessDevice::new();
        let mut mesh = mesh_with_camera(&device);
        let printed = format!("{mesh:?}");
        assert!(printed.contains("RenderMesh"));
        assert!(printed.contains("FixedCamera"));
        mesh.destroy(&device);
    }

    #[test]
    fn render_without_camera_fails_fast() {
        let device = HeadlessDevice::new();
        let mut mesh = RenderMesh::new(&device, &triangle_data()).unwrap();
        let mut ctx = FrameContext::new(&device);
        assert!(matches!(
            mesh.render(&mut ctx),
            Err(RenderError::NotInitialized)
        ));
        assert!(device.draw_calls().is_empty());
        mesh.destroy(&device);
    }

    #[test]
    fn stale_lights_delay_shading_one_frame_each() {
        let device = HeadlessDevice::new();
        let mut mesh = mesh_with_camera(&device);
        mesh.add_light(&device, Vec3::new(0.0, 50.0, 0.0), Vec3::ONE);
        mesh.add_light(&device, Vec3::new(50.0, 0.0, 0.0), Vec3::X);

        // Two stale lights: two shadow-only frames, oldest first.
        for _ in 0..2 {
            let mut ctx = FrameContext::new(&device);
            mesh.render(&mut ctx).unwrap();
            let draws = device.draw_calls();
            assert!(draws.iter().all(|d| d.framebuffer.is_some()));
            device.clear_draw_calls();
        }
        assert_eq!(mesh.lights().iter().filter(|l| l.is_ready()).count(), 2);

        // Third frame shades on the default framebuffer.
        let mut ctx = FrameContext::new(&device);
        mesh.render(&mut ctx).unwrap();
        let draws = device.draw_calls();
        assert_eq!(draws.len(), 1);
        assert!(draws[0].framebuffer.is_none());
        assert_eq!(draws[0].cull_face, CullFace::Back);
        mesh.destroy(&device);
    }

    #[test]
    fn shading_uploads_the_lighting_uniforms() {
        let device = HeadlessDevice::new();
        let mut mesh = mesh_with_camera(&device);
        mesh.add_light(&device, Vec3::new(1.0, 2.0, 3.0), Vec3::Y);

        let mut ctx = FrameContext::new(&device);
        mesh.render(&mut ctx).unwrap(); // shadow frame
        device.clear_uniform_writes();

        let mut ctx = FrameContext::new(&device);
        mesh.render(&mut ctx).unwrap(); // shaded frame

        let writes = device.uniform_writes();
        let find = |name: &str| {
            writes
                .iter()
                .find(|w| w.name == name)
                .unwrap_or_else(|| panic!("missing uniform {name}"))
                .value
        };
        assert_eq!(find("camera_position"), UniformValue::Vec3(Vec3::new(0.0, 0.0, 10.0)));
        assert_eq!(
            find("light_color_ambient"),
            UniformValue::Vec3(Vec3::new(0.5, 0.5, 0.5))
        );
        assert_eq!(find("ambient_intensity"), UniformValue::Float(0.4));
        assert_eq!(find("shininess"), UniformValue::Float(64.0));
        assert_eq!(find("texture_sampler"), UniformValue::Int(0));
        assert_eq!(find("light_count"), UniformValue::Int(1));
        assert_eq!(find("depth_map[0]"), UniformValue::Int(1));
        assert_eq!(
            find("light_pos[0]"),
            UniformValue::Vec3(Vec3::new(1.0, 2.0, 3.0))
        );
        assert_eq!(find("light_color[0]"), UniformValue::Vec3(Vec3::Y));
        mesh.destroy(&device);
    }

    #[test]
    fn unlit_mode_skips_lighting_uniforms() {
        let device = HeadlessDevice::new();
        let mut mesh = mesh_with_camera(&device);

        let mut ctx = FrameContext::new(&device);
        ctx.input.unlit = true;
        mesh.render(&mut ctx).unwrap();

        // The unlit program declares only the texture sampler, so no
        // lighting values can land anywhere.
        let writes = device.uniform_writes();
        assert!(writes.iter().all(|w| w.name == "texture_sampler"));
        assert_eq!(device.draw_calls().len(), 1);
        mesh.destroy(&device);
    }

    #[test]
    fn surfaces_without_textures_are_skipped() {
        let device = HeadlessDevice::new();
        let mut data = triangle_data();
        data.surfaces.push(Surface {
            indices: vec![2, 1, 0],
        });
        // Two surfaces, one texture.
        let mut mesh = RenderMesh::new(&device, &data).unwrap();
        mesh.attach_camera(Rc::new(FixedCamera(Vec3::ZERO)));

        let mut ctx = FrameContext::new(&device);
        mesh.render(&mut ctx).unwrap();
        assert_eq!(device.draw_calls().len(), 1);
        mesh.destroy(&device);
    }

    #[test]
    fn eviction_releases_the_oldest_shadow_map() {
        let device = HeadlessDevice::new();
        let mut mesh = mesh_with_camera(&device);

        for i in 0..MAX_LIGHTS {
            mesh.add_light(&device, Vec3::new(i as f32, 0.0, 0.0), Vec3::ONE);
        }
        // Generate every map.
        for _ in 0..MAX_LIGHTS {
            let mut ctx = FrameContext::new(&device);
            mesh.render(&mut ctx).unwrap();
        }
        let evicted_map = mesh.lights().iter().next().unwrap().depth_map.unwrap();

        mesh.add_light(&device, Vec3::new(99.0, 0.0, 0.0), Vec3::ONE);
        assert_eq!(mesh.lights().len(), MAX_LIGHTS);
        assert_eq!(device.texture_kind(evicted_map), None, "map released");
        mesh.destroy(&device);
    }

    #[test]
    fn spawn_request_places_the_light_at_the_camera() {
        let device = HeadlessDevice::new();
        let mut mesh = mesh_with_camera(&device);

        let mut ctx = FrameContext::new(&device);
        ctx.input.add_light = Some(Vec3::X);
        mesh.render(&mut ctx).unwrap();

        assert_eq!(ctx.input.add_light, None, "request consumed");
        let light = mesh.lights().iter().next().unwrap();
        assert_eq!(light.origin, Vec3::new(0.0, 0.0, 10.0));
        assert_eq!(light.color, Vec3::X);
        // The spawn frame went to the new light's shadow map.
        assert!(device.draw_calls().iter().all(|d| d.framebuffer.is_some()));
        mesh.destroy(&device);
    }

    #[test]
    fn cube_textures_upload_six_faces() {
        let device = HeadlessDevice::new();
        let mut data = triangle_data();
        data.textures = vec![TextureData {
            width: 2,
            height: 2,
            faces: vec![vec![0_u8; 2 * 2 * 4]; 6],
        }];
        let mesh = RenderMesh::new(&device, &data).unwrap();
        let counts = device.live_resources();
        assert_eq!(counts.textures, 1);

        let mut mesh = mesh;
        mesh.destroy(&device);
        assert_eq!(device.live_resources(), Default::default());
    }

    #[test]
    fn destroy_releases_everything() {
        let device = HeadlessDevice::new();
        let mut mesh = mesh_with_camera(&device);
        mesh.add_light(&device, Vec3::ZERO, Vec3::ONE);

        let mut ctx = FrameContext::new(&device);
        mesh.render(&mut ctx).unwrap(); // allocates one shadow map

        mesh.destroy(&device);
        assert_eq!(device.live_resources(), Default::default());
    }
}
