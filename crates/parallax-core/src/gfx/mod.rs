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

//! The backend-agnostic graphics device contract.
//!
//! The viewer renders through the [`GraphicsDevice`] trait: a GL-flavored
//! surface with named uniforms, matrix stacks, and client-visible pipeline
//! state. Concrete implementations live outside this crate (the headless
//! software device ships in `parallax-infra`; a real context-backed device
//! is the embedding application's concern).

pub mod device;
pub mod error;
pub mod resource;
pub mod state;

pub use device::GraphicsDevice;
pub use error::{RenderError, ResourceError, ShaderError};
pub use resource::{
    BufferDescriptor, BufferId, BufferKind, FramebufferId, ProgramDescriptor, ProgramId,
    TextureDescriptor, TextureId, UniformLocation, UniformValue, VertexArrayId, VertexAttribute,
};
pub use state::{CullFace, MatrixMode, Viewport};
