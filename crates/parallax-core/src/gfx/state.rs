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

//! Client-visible pipeline state types.
//!
//! These mirror the global device state the viewer queries, mutates, and
//! restores around its passes. They are shared mutable state in the sense
//! of the concurrency model: one context, one thread, restore-on-exit.

/// The matrix stack a `load_matrix` call targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MatrixMode {
    /// The modelview matrix stack.
    #[default]
    Modelview,
    /// The projection matrix stack.
    Projection,
}

/// Which triangle faces are culled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullFace {
    /// Cull back faces (normal shading).
    #[default]
    Back,
    /// Cull front faces (used during shadow depth passes to reduce
    /// self-shadowing artifacts).
    Front,
}

/// A viewport rectangle in window coordinates, origin bottom-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Viewport {
    /// Left edge.
    pub x: i32,
    /// Bottom edge.
    pub y: i32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Viewport {
    /// Creates a viewport anchored at the origin.
    pub const fn with_size(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    /// Number of pixels covered by the viewport.
    pub const fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}
