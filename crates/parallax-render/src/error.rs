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

//! Error types of the render crate.

use parallax_core::geometry::GeometryError;
use parallax_core::gfx::{RenderError, ResourceError};
use thiserror::Error;

/// Errors raised while building a renderable mesh from loaded model data.
#[derive(Debug, Error)]
pub enum MeshError {
    /// The model data failed structural validation before any upload.
    #[error("invalid model data: {0}")]
    InvalidGeometry(#[from] GeometryError),

    /// A device resource could not be created. Resources created earlier
    /// in the same construction have already been released.
    #[error("resource creation failed: {0}")]
    Resource(#[from] ResourceError),
}

impl From<MeshError> for RenderError {
    fn from(err: MeshError) -> Self {
        match err {
            MeshError::InvalidGeometry(e) => RenderError::Internal(e.to_string()),
            MeshError::Resource(e) => RenderError::ResourceError(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_error_converts_through() {
        let err = MeshError::Resource(ResourceError::AllocationFailed("vbo".to_string()));
        let render: RenderError = err.into();
        assert!(matches!(render, RenderError::ResourceError(_)));
    }

    #[test]
    fn display_includes_cause() {
        let err = MeshError::Resource(ResourceError::OutOfBounds);
        assert!(err.to_string().contains("resource creation failed"));
    }
}
