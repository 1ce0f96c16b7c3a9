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

//! Minimal linear-algebra types for the viewer: `Vec3`, `Vec4`, `Mat4`.
//!
//! Matrices are column-major and follow the OpenGL clip-space conventions
//! (right-handed, depth in `[-1, 1]`), since the device contract in
//! [`crate::gfx`] is GL-flavored.

mod matrix;
mod vector;

pub use matrix::Mat4;
pub use vector::{Vec3, Vec4};

/// Tolerance used for approximate float comparisons within this module.
pub const EPSILON: f32 = 1e-6;
