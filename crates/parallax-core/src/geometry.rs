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

//! CPU-side mesh data handed over by the geometry/material loader.
//!
//! The core does not parse any file format; an OBJ-style loader
//! collaborator builds a [`MeshData`] and hands it to the renderable mesh,
//! which validates it once and uploads it to the device.

use std::fmt;

/// An ordered group of triangle indices sharing one material/texture.
#[derive(Debug, Clone, Default)]
pub struct Surface {
    /// Vertex indices, three per triangle, each `< positions.len()`.
    pub indices: Vec<u32>,
}

/// A texture image set: one RGBA8 image, or exactly six forming a cube.
#[derive(Debug, Clone, Default)]
pub struct TextureData {
    /// Width of each face in pixels.
    pub width: u32,
    /// Height of each face in pixels.
    pub height: u32,
    /// One face for a 2D texture, six (+X, −X, +Y, −Y, +Z, −Z) for a cube.
    /// Each face holds `width * height * 4` bytes.
    pub faces: Vec<Vec<u8>>,
}

impl TextureData {
    /// Whether this entry is a six-face cube set.
    pub fn is_cube(&self) -> bool {
        self.faces.len() == 6
    }
}

/// Parsed geometry for one model: index-aligned vertex attributes plus
/// per-material surfaces and their textures.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    /// Vertex positions.
    pub positions: Vec<[f32; 3]>,
    /// Vertex normals, index-aligned with `positions`.
    pub normals: Vec<[f32; 3]>,
    /// Vertex UV coordinates, index-aligned with `positions`.
    pub uvs: Vec<[f32; 2]>,
    /// Per-material index groups.
    pub surfaces: Vec<Surface>,
    /// One texture per surface, by position. A shorter list is tolerated
    /// at draw time (extra surfaces are skipped), but not the reverse.
    pub textures: Vec<TextureData>,
}

impl MeshData {
    /// Validates the construction invariants.
    ///
    /// Attribute streams must be index-aligned, every surface index must be
    /// in range, and every texture entry must be a single image or a
    /// six-face cube set.
    pub fn validate(&self) -> Result<(), GeometryError> {
        if self.positions.len() != self.normals.len() || self.positions.len() != self.uvs.len() {
            return Err(GeometryError::AttributeLengthMismatch {
                positions: self.positions.len(),
                normals: self.normals.len(),
                uvs: self.uvs.len(),
            });
        }

        let vertex_count = self.positions.len();
        for (surface_index, surface) in self.surfaces.iter().enumerate() {
            if let Some(&bad) = surface
                .indices
                .iter()
                .find(|&&i| i as usize >= vertex_count)
            {
                return Err(GeometryError::IndexOutOfRange {
                    surface: surface_index,
                    index: bad,
                    vertex_count,
                });
            }
        }

        for (texture_index, texture) in self.textures.iter().enumerate() {
            let faces = texture.faces.len();
            if faces != 1 && faces != 6 {
                return Err(GeometryError::InvalidFaceCount {
                    texture: texture_index,
                    faces,
                });
            }
        }

        Ok(())
    }
}

/// A violation of the mesh-data invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    /// `positions`, `normals`, and `uvs` are not the same length.
    AttributeLengthMismatch {
        /// Number of positions.
        positions: usize,
        /// Number of normals.
        normals: usize,
        /// Number of UV coordinates.
        uvs: usize,
    },
    /// A surface references a vertex index outside the position array.
    IndexOutOfRange {
        /// The offending surface's position in the surface list.
        surface: usize,
        /// The out-of-range index value.
        index: u32,
        /// Number of vertices in the mesh.
        vertex_count: usize,
    },
    /// A texture entry is neither a single image nor a six-face cube set.
    InvalidFaceCount {
        /// The offending texture's position in the texture list.
        texture: usize,
        /// The number of faces supplied.
        faces: usize,
    },
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryError::AttributeLengthMismatch {
                positions,
                normals,
                uvs,
            } => write!(
                f,
                "Vertex attribute streams are not index-aligned: \
                 {positions} positions, {normals} normals, {uvs} uvs"
            ),
            GeometryError::IndexOutOfRange {
                surface,
                index,
                vertex_count,
            } => write!(
                f,
                "Surface {surface} references vertex {index}, \
                 but the mesh has {vertex_count} vertices"
            ),
            GeometryError::InvalidFaceCount { texture, faces } => write!(
                f,
                "Texture {texture} has {faces} faces; expected 1 (2D) or 6 (cube)"
            ),
        }
    }
}

impl std::error::Error for GeometryError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad_mesh() -> MeshData {
        MeshData {
            positions: vec![[0.0; 3]; 4],
            normals: vec![[0.0, 0.0, 1.0]; 4],
            uvs: vec![[0.0; 2]; 4],
            surfaces: vec![Surface {
                indices: vec![0, 1, 2, 2, 3, 0],
            }],
            textures: vec![TextureData {
                width: 1,
                height: 1,
                faces: vec![vec![255, 255, 255, 255]],
            }],
        }
    }

    #[test]
    fn valid_mesh_passes() {
        assert!(quad_mesh().validate().is_ok());
    }

    #[test]
    fn attribute_length_mismatch_is_rejected() {
        let mut mesh = quad_mesh();
        mesh.normals.pop();
        assert!(matches!(
            mesh.validate(),
            Err(GeometryError::AttributeLengthMismatch {
                positions: 4,
                normals: 3,
                uvs: 4
            })
        ));
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let mut mesh = quad_mesh();
        mesh.surfaces[0].indices.push(4);
        assert_eq!(
            mesh.validate(),
            Err(GeometryError::IndexOutOfRange {
                surface: 0,
                index: 4,
                vertex_count: 4
            })
        );
    }

    #[test]
    fn texture_face_count_must_be_one_or_six() {
        let mut mesh = quad_mesh();
        mesh.textures[0].faces = vec![vec![0; 4]; 3];
        assert_eq!(
            mesh.validate(),
            Err(GeometryError::InvalidFaceCount {
                texture: 0,
                faces: 3
            })
        );

        mesh.textures[0].faces = vec![vec![0; 4]; 6];
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn error_display_names_the_problem() {
        let err = GeometryError::AttributeLengthMismatch {
            positions: 2,
            normals: 1,
            uvs: 2,
        };
        let text = format!("{err}");
        assert!(text.contains("2 positions"));
        assert!(text.contains("1 normals"));
    }
}
