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

//! Per-frame context handed to every painter.

use parallax_core::gfx::GraphicsDevice;
use parallax_core::math::Vec3;

/// Input state sampled once per frame by the host window loop.
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    /// Shade without lighting (texture pass-through).
    pub unlit: bool,
    /// Composite the depth buffer as grayscale instead of a stereogram.
    pub debug_depth: bool,
    /// A light to spawn this frame at the camera position, with the given
    /// color. Consumed by the first mesh that renders.
    pub add_light: Option<Vec3>,
}

/// Everything a painter needs for one frame: the device owned by the
/// context thread and the sampled input state.
#[derive(Debug)]
pub struct FrameContext<'a> {
    /// The active graphics device.
    pub device: &'a dyn GraphicsDevice,
    /// Input sampled at the top of the frame.
    pub input: FrameInput,
}

impl<'a> FrameContext<'a> {
    /// Creates a frame context with default (idle) input.
    pub fn new(device: &'a dyn GraphicsDevice) -> Self {
        Self {
            device,
            input: FrameInput::default(),
        }
    }
}
