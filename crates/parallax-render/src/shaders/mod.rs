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

//! Embedded GLSL sources for the viewer's programs.
//!
//! Uniform and attribute names in these sources are contract: the Rust
//! call sites in `mesh`, `shadow`, and `stereogram` address them by
//! string. The lit and unlit programs share the attribute slot order
//! `vertex_position`, `vertex_uv`, `vertex_normal`.

/// Vertex stage of the lit (Blinn-Phong plus shadows) program.
pub const LIT_VERT: &str = include_str!("lit.vert");

/// Fragment stage of the lit program. Declares the per-light uniform
/// arrays sized at the light cap.
pub const LIT_FRAG: &str = include_str!("lit.frag");

/// Vertex stage of the unlit (texture pass-through) program.
pub const UNLIT_VERT: &str = include_str!("unlit.vert");

/// Fragment stage of the unlit program.
pub const UNLIT_FRAG: &str = include_str!("unlit.frag");

/// Vertex stage of the shadow depth pass (positions only, untransformed).
pub const SHADOW_VERT: &str = include_str!("shadow.vert");

/// Geometry stage of the shadow pass: fans each triangle out to the six
/// cube faces via `gl_Layer`.
pub const SHADOW_GEOM: &str = include_str!("shadow.geom");

/// Fragment stage of the shadow pass: writes linearized light distance
/// as depth.
pub const SHADOW_FRAG: &str = include_str!("shadow.frag");

/// Vertex stage of the screen-quad compositor program.
pub const SCREEN_VERT: &str = include_str!("screen.vert");

/// Fragment stage of the screen-quad compositor program.
pub const SCREEN_FRAG: &str = include_str!("screen.frag");

#[cfg(test)]
mod tests {
    use super::*;
    use parallax_core::light::MAX_LIGHTS;

    #[test]
    fn lit_program_declares_the_shading_uniforms() {
        for name in [
            "camera_position",
            "shininess",
            "texture_sampler",
            "light_color_ambient",
            "ambient_intensity",
            "diffuse_intensity",
            "specular_intensity",
            "light_count",
        ] {
            assert!(
                LIT_VERT.contains(name) || LIT_FRAG.contains(name),
                "missing uniform {name}"
            );
        }
    }

    #[test]
    fn per_light_arrays_are_sized_at_the_cap() {
        let dim = format!("[{MAX_LIGHTS}]");
        assert!(LIT_FRAG.contains(&format!("light_pos{dim}")));
        assert!(LIT_FRAG.contains(&format!("light_color{dim}")));
        assert!(LIT_FRAG.contains(&format!("depth_map{dim}")));
    }

    #[test]
    fn shadow_pass_declares_its_uniforms() {
        assert!(SHADOW_GEOM.contains("light_space_matrix[6]"));
        assert!(SHADOW_FRAG.contains("light_position"));
        assert!(SHADOW_FRAG.contains("far_plane"));
    }

    #[test]
    fn screen_program_samples_one_texture() {
        assert!(SCREEN_FRAG.contains("tex_sampler"));
    }
}
