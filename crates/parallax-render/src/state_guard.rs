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

//! Scoped capture and restore of mutable device state.

use parallax_core::gfx::{GraphicsDevice, MatrixMode, ProgramId, TextureId};
use parallax_core::math::Mat4;

/// Captures the mutable slice of device state a pass is allowed to touch
/// and restores it on drop.
///
/// Restore order matters and is fixed: active program first, then the
/// projection and modelview matrices (each after switching to its mode),
/// then the originally active matrix mode, the 2D texture binding, and
/// finally the pixel unpack alignment.
#[derive(Debug)]
pub struct StateGuard<'a> {
    device: &'a dyn GraphicsDevice,
    program: Option<ProgramId>,
    projection: Mat4,
    modelview: Mat4,
    matrix_mode: MatrixMode,
    texture_2d: Option<TextureId>,
    unpack_alignment: i32,
}

impl<'a> StateGuard<'a> {
    /// Captures the current state of `device`.
    pub fn capture(device: &'a dyn GraphicsDevice) -> Self {
        Self {
            device,
            program: device.current_program(),
            projection: device.matrix(MatrixMode::Projection),
            modelview: device.matrix(MatrixMode::Modelview),
            matrix_mode: device.matrix_mode(),
            texture_2d: device.bound_texture_2d(),
            unpack_alignment: device.unpack_alignment(),
        }
    }
}

impl Drop for StateGuard<'_> {
    fn drop(&mut self) {
        let device = self.device;
        device.use_program(self.program);

        device.set_matrix_mode(MatrixMode::Projection);
        device.load_matrix(self.projection);
        device.set_matrix_mode(MatrixMode::Modelview);
        device.load_matrix(self.modelview);
        device.set_matrix_mode(self.matrix_mode);

        device.bind_texture_2d(self.texture_2d);
        device.set_unpack_alignment(self.unpack_alignment);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parallax_core::gfx::ProgramDescriptor;
    use parallax_core::math::{Vec3, Vec4};
    use parallax_infra::HeadlessDevice;

    #[test]
    fn scrambled_state_is_restored_on_drop() {
        let device = HeadlessDevice::new();
        let program = device
            .compile_program(&ProgramDescriptor {
                label: Some("guard test"),
                vertex_src: "void main(void) { }",
                fragment_src: "void main(void) { }",
                geometry_src: None,
                attributes: &[],
            })
            .unwrap();

        device.use_program(Some(program));
        device.set_matrix_mode(MatrixMode::Projection);
        let original_projection = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        device.load_matrix(original_projection);
        device.set_unpack_alignment(1);

        {
            let _guard = StateGuard::capture(&device);
            device.use_program(None);
            device.set_matrix_mode(MatrixMode::Modelview);
            device.load_matrix(Mat4::from_cols(
                Vec4::new(2.0, 0.0, 0.0, 0.0),
                Vec4::new(0.0, 2.0, 0.0, 0.0),
                Vec4::new(0.0, 0.0, 2.0, 0.0),
                Vec4::new(0.0, 0.0, 0.0, 1.0),
            ));
            device.set_unpack_alignment(4);
        }

        assert_eq!(device.current_program(), Some(program));
        assert_eq!(device.matrix_mode(), MatrixMode::Projection);
        assert_eq!(device.matrix(MatrixMode::Projection), original_projection);
        assert_eq!(device.matrix(MatrixMode::Modelview), Mat4::IDENTITY);
        assert_eq!(device.unpack_alignment(), 1);
    }

    #[test]
    fn texture_binding_is_restored() {
        let device = HeadlessDevice::new();
        let texture = device
            .create_texture_2d(
                &parallax_core::gfx::TextureDescriptor {
                    label: None,
                    width: 1,
                    height: 1,
                },
                &[0, 0, 0, 255],
            )
            .unwrap();
        device.bind_texture_2d(Some(texture));

        {
            let _guard = StateGuard::capture(&device);
            device.bind_texture_2d(None);
        }
        assert_eq!(device.bound_texture_2d(), Some(texture));
    }
}
