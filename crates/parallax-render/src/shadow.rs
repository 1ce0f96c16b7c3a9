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

//! Omnidirectional shadow depth-pass generation.
//!
//! One pass renders the mesh geometry into all six faces of a light's
//! depth cube map: the geometry stage fans every triangle out per face,
//! the fragment stage writes linearized light distance. The pass owns a
//! throwaway framebuffer and restores viewport, cull mode, and
//! framebuffer binding before returning.

use crate::program::ShaderProgram;
use crate::shaders;
use parallax_core::gfx::{
    CullFace, GraphicsDevice, ProgramDescriptor, RenderError, UniformValue, VertexArrayId,
    Viewport,
};
use parallax_core::light::Light;
use parallax_core::math::{Mat4, Vec3};

/// Per-face edge length of every shadow depth cube map.
pub const SHADOW_MAP_SIZE: u32 = 1024 * 4;

/// Near plane of the per-face shadow projection.
pub const SHADOW_NEAR: f32 = 1.0;

/// Far plane of the shadow projection; also the distance normalization
/// divisor shared with the lit program.
pub const SHADOW_FAR: f32 = 5000.0;

/// The geometry a shadow pass (or a shading pass) draws: one vertex
/// array and the index buffers of the surfaces to draw from it.
#[derive(Debug, Clone, Copy)]
pub struct MeshGeometry<'a> {
    /// The bound attribute streams.
    pub vertex_array: VertexArrayId,
    /// Index buffers with their index counts, in surface order.
    pub surfaces: &'a [(parallax_core::gfx::BufferId, u32)],
}

/// Computes the six face view-projection matrices for a light at
/// `origin`: a 90° perspective per cube face, faces ordered +X, −X, +Y,
/// −Y, +Z, −Z.
///
/// A degenerate look-at (never reachable with these fixed axes) falls
/// back to identity rather than panicking.
pub fn face_transforms(origin: Vec3) -> [Mat4; 6] {
    let projection = Mat4::perspective_rh(
        90.0_f32.to_radians(),
        1.0, // square faces
        SHADOW_NEAR,
        SHADOW_FAR,
    );

    let faces = [
        (Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, -1.0, 0.0)),
        (Vec3::new(-1.0, 0.0, 0.0), Vec3::new(0.0, -1.0, 0.0)),
        (Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 0.0, 1.0)),
        (Vec3::new(0.0, -1.0, 0.0), Vec3::new(0.0, 0.0, -1.0)),
        (Vec3::new(0.0, 0.0, 1.0), Vec3::new(0.0, -1.0, 0.0)),
        (Vec3::new(0.0, 0.0, -1.0), Vec3::new(0.0, -1.0, 0.0)),
    ];

    faces.map(|(direction, up)| {
        let view = Mat4::look_at_rh(origin, origin + direction, up).unwrap_or(Mat4::IDENTITY);
        projection * view
    })
}

/// Restores the draw state a shadow pass temporarily takes over.
struct PassScope<'a> {
    device: &'a dyn GraphicsDevice,
    viewport: Viewport,
    cull_face: CullFace,
}

impl Drop for PassScope<'_> {
    fn drop(&mut self) {
        self.device.bind_framebuffer(None);
        self.device.set_cull_face(self.cull_face);
        self.device.set_viewport(self.viewport);
    }
}

/// Renders shadow depth cube maps for stale lights.
#[derive(Debug)]
pub struct ShadowMapGenerator {
    program: ShaderProgram,
}

impl ShadowMapGenerator {
    /// Builds the layered depth-pass program.
    pub fn new(device: &dyn GraphicsDevice) -> Self {
        let program = ShaderProgram::new(
            device,
            &ProgramDescriptor {
                label: Some("shadow depth pass"),
                vertex_src: shaders::SHADOW_VERT,
                fragment_src: shaders::SHADOW_FRAG,
                geometry_src: Some(shaders::SHADOW_GEOM),
                attributes: &["vertex_position", "vertex_uv", "vertex_normal"],
            },
        );
        Self { program }
    }

    /// Renders the depth cube map for `light` and marks it ready.
    ///
    /// Allocates the cube map on first use for this light; renders all
    /// six faces in a single layered pass with front-face culling. On
    /// success `light.depth_map` is set. On failure the light stays
    /// stale and any texture allocated here is released.
    pub fn generate(
        &self,
        device: &dyn GraphicsDevice,
        light: &mut Light,
        geometry: &MeshGeometry<'_>,
    ) -> Result<(), RenderError> {
        let (depth_map, fresh) = match light.depth_map {
            Some(existing) => (existing, false),
            None => (device.create_depth_cube_map(SHADOW_MAP_SIZE)?, true),
        };

        let framebuffer = match device.create_depth_framebuffer(depth_map) {
            Ok(fb) => fb,
            Err(err) => {
                if fresh {
                    let _ = device.destroy_texture(depth_map);
                }
                return Err(err.into());
            }
        };

        let transforms = face_transforms(light.origin);

        let scope = PassScope {
            device,
            viewport: device.viewport(),
            cull_face: device.cull_face(),
        };

        self.program.bind(device);
        for (face, transform) in transforms.iter().enumerate() {
            self.program.set_uniform(
                device,
                &format!("light_space_matrix[{face}]"),
                UniformValue::Mat4(*transform),
            );
        }
        self.program
            .set_uniform(device, "light_position", UniformValue::Vec3(light.origin));
        self.program
            .set_uniform(device, "far_plane", UniformValue::Float(SHADOW_FAR));

        device.set_viewport(Viewport::with_size(SHADOW_MAP_SIZE, SHADOW_MAP_SIZE));
        device.set_cull_face(CullFace::Front);
        device.bind_framebuffer(Some(framebuffer));
        device.clear_depth();

        device.bind_vertex_array(Some(geometry.vertex_array));
        for &(index_buffer, index_count) in geometry.surfaces {
            device.draw_indexed(index_buffer, index_count);
        }
        device.bind_vertex_array(None);

        drop(scope);
        light.depth_map = Some(depth_map);
        device.destroy_framebuffer(framebuffer)?;
        Ok(())
    }

    /// Releases the depth-pass program.
    pub fn destroy(&mut self, device: &dyn GraphicsDevice) {
        self.program.destroy(device);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parallax_core::gfx::{BufferDescriptor, BufferKind, VertexAttribute};
    use parallax_core::math::Vec4;
    use parallax_infra::{DrawKind, HeadlessDevice, TextureKind};

    fn upload_triangle(device: &HeadlessDevice) -> MeshGeometry<'static> {
        let positions: [[f32; 3]; 3] = [[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let vbo = device
            .create_buffer(
                &BufferDescriptor {
                    label: None,
                    kind: BufferKind::Vertex,
                },
                bytemuck::cast_slice(&positions),
            )
            .unwrap();
        let vao = device
            .create_vertex_array(&[VertexAttribute {
                buffer: vbo,
                components: 3,
            }])
            .unwrap();
        let indices: [u32; 3] = [0, 1, 2];
        let ibo = device
            .create_buffer(
                &BufferDescriptor {
                    label: None,
                    kind: BufferKind::Index,
                },
                bytemuck::cast_slice(&indices),
            )
            .unwrap();
        let surfaces = Box::leak(Box::new([(ibo, 3_u32)]));
        MeshGeometry {
            vertex_array: vao,
            surfaces,
        }
    }

    #[test]
    fn six_face_transforms_are_distinct() {
        let transforms = face_transforms(Vec3::new(10.0, 20.0, 30.0));
        for i in 0..6 {
            for j in (i + 1)..6 {
                assert_ne!(transforms[i], transforms[j], "faces {i} and {j} collide");
            }
        }
    }

    #[test]
    fn each_face_centers_its_own_axis() {
        let origin = Vec3::new(5.0, -3.0, 8.0);
        let transforms = face_transforms(origin);
        let directions = [
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(-1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, -1.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(0.0, 0.0, -1.0),
        ];

        for (transform, direction) in transforms.iter().zip(directions) {
            let point = origin + direction * 100.0;
            let clip = *transform * Vec4::from_vec3(point, 1.0);
            // A point straight down the face axis projects to the center.
            assert!((clip.x / clip.w).abs() < 1e-4);
            assert!((clip.y / clip.w).abs() < 1e-4);
            assert!(clip.w > 0.0, "point ahead of the face camera");
        }
    }

    #[test]
    fn generate_allocates_the_cube_map_and_draws_offscreen() {
        let device = HeadlessDevice::new();
        let generator = ShadowMapGenerator::new(&device);
        let geometry = upload_triangle(&device);
        let mut light = Light::new(Vec3::new(0.0, 100.0, 0.0), Vec3::ONE);

        generator.generate(&device, &mut light, &geometry).unwrap();

        let depth_map = light.depth_map.expect("light marked ready");
        assert_eq!(
            device.texture_kind(depth_map),
            Some(TextureKind::DepthCube {
                size: SHADOW_MAP_SIZE
            })
        );

        let draws = device.draw_calls();
        assert_eq!(draws.len(), 1);
        assert!(draws[0].framebuffer.is_some(), "drawn into the shadow FBO");
        assert_eq!(
            draws[0].viewport,
            Viewport::with_size(SHADOW_MAP_SIZE, SHADOW_MAP_SIZE)
        );
        assert_eq!(draws[0].cull_face, CullFace::Front);
        assert!(matches!(
            draws[0].kind,
            DrawKind::Indexed { index_count: 3, .. }
        ));
    }

    #[test]
    fn generate_restores_viewport_cull_and_framebuffer() {
        let device = HeadlessDevice::new();
        let generator = ShadowMapGenerator::new(&device);
        let geometry = upload_triangle(&device);
        let mut light = Light::new(Vec3::ZERO, Vec3::ONE);

        let before = Viewport::with_size(800, 600);
        device.set_viewport(before);
        generator.generate(&device, &mut light, &geometry).unwrap();

        assert_eq!(device.viewport(), before);
        assert_eq!(device.cull_face(), CullFace::Back);
        // The pass framebuffer is gone again.
        assert_eq!(device.live_resources().framebuffers, 0);
    }

    #[test]
    fn generate_uploads_the_pass_uniforms() {
        let device = HeadlessDevice::new();
        let generator = ShadowMapGenerator::new(&device);
        let geometry = upload_triangle(&device);
        let origin = Vec3::new(1.0, 2.0, 3.0);
        let mut light = Light::new(origin, Vec3::ONE);

        generator.generate(&device, &mut light, &geometry).unwrap();

        let writes = device.uniform_writes();
        let names: Vec<&str> = writes.iter().map(|w| w.name.as_str()).collect();
        for face in 0..6 {
            assert!(names.contains(&format!("light_space_matrix[{face}]").as_str()));
        }
        assert!(writes
            .iter()
            .any(|w| w.name == "light_position" && w.value == UniformValue::Vec3(origin)));
        assert!(writes
            .iter()
            .any(|w| w.name == "far_plane" && w.value == UniformValue::Float(SHADOW_FAR)));
    }
}
