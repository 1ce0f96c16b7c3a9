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

//! # Parallax Render
//!
//! The hot-path rendering crate of the Parallax model viewer: the
//! renderable mesh with its multi-light shadow system, the shadow cube-map
//! generator, the autostereogram compositor, and the supporting program
//! wrapper, render-state guard, and painter list.
//!
//! Everything here renders through the `GraphicsDevice` contract from
//! `parallax-core` and runs synchronously on the context thread.

#![warn(missing_docs)]

pub mod error;
pub mod frame;
pub mod mesh;
pub mod painter;
pub mod program;
pub mod shaders;
pub mod shadow;
pub mod state_guard;
pub mod stereogram;

pub use error::MeshError;
pub use frame::{FrameContext, FrameInput};
pub use mesh::RenderMesh;
pub use painter::{Paintable, PainterList};
pub use program::ShaderProgram;
pub use shadow::ShadowMapGenerator;
pub use state_guard::StateGuard;
pub use stereogram::Stereogram;
