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

//! The camera collaborator contract.

use crate::math::Vec3;

/// Supplies the world-space camera position on demand.
///
/// The rendering core only consumes the position, for view-dependent
/// shading uniforms and as the origin of newly added lights. Camera
/// movement and orientation are the embedding application's concern.
pub trait CameraSource: std::fmt::Debug {
    /// Returns the current world-space camera position.
    fn position(&self) -> Vec3;
}

/// A fixed camera position, useful for tests and static captures.
#[derive(Debug, Clone, Copy)]
pub struct FixedCamera(pub Vec3);

impl CameraSource for FixedCamera {
    fn position(&self) -> Vec3 {
        self.0
    }
}
