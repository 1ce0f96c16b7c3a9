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

//! # Parallax Core
//!
//! Foundational crate containing traits, core types, and interface contracts
//! for the Parallax model viewer: the math module, the backend-agnostic
//! graphics device contract, light types, and collaborator traits.

#![warn(missing_docs)]

pub mod camera;
pub mod geometry;
pub mod gfx;
pub mod light;
pub mod math;

pub use camera::CameraSource;
pub use gfx::GraphicsDevice;
