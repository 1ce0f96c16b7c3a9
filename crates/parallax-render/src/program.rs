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

//! Owning wrapper around a compiled shader program.

use parallax_core::gfx::{GraphicsDevice, ProgramDescriptor, ProgramId, UniformValue};

/// A compiled and linked shader program, or a degraded placeholder when
/// compilation failed.
///
/// Compile and link failures are not fatal to the viewer: the error is
/// logged once at construction and every subsequent [`bind`](Self::bind)
/// or [`set_uniform`](Self::set_uniform) on the degraded program is a
/// silent no-op, so the frame simply renders without that pass.
#[derive(Debug)]
pub struct ShaderProgram {
    handle: Option<ProgramId>,
    label: String,
}

impl ShaderProgram {
    /// Compiles and links a program from the descriptor.
    ///
    /// Never fails; inspect [`is_valid`](Self::is_valid) to tell a live
    /// program from a degraded one.
    pub fn new(device: &dyn GraphicsDevice, descriptor: &ProgramDescriptor<'_>) -> Self {
        let label = descriptor.label.unwrap_or("unnamed").to_string();
        let handle = match device.compile_program(descriptor) {
            Ok(id) => Some(id),
            Err(err) => {
                log::error!("Program '{label}' failed to build: {err}");
                None
            }
        };
        Self { handle, label }
    }

    /// Whether the program compiled and linked successfully.
    pub fn is_valid(&self) -> bool {
        self.handle.is_some()
    }

    /// The device handle, if the program is live.
    pub fn id(&self) -> Option<ProgramId> {
        self.handle
    }

    /// Activates the program for subsequent draws. No-op when degraded.
    pub fn bind(&self, device: &dyn GraphicsDevice) {
        if let Some(id) = self.handle {
            device.use_program(Some(id));
        }
    }

    /// Uploads a uniform by name, looking the location up on each call.
    ///
    /// A name the program does not declare is skipped silently; shading
    /// programs intentionally differ in which uniforms they use.
    pub fn set_uniform(&self, device: &dyn GraphicsDevice, name: &str, value: UniformValue) {
        let Some(id) = self.handle else {
            return;
        };
        if let Some(location) = device.uniform_location(id, name) {
            device.set_uniform(location, value);
        }
    }

    /// Releases the underlying device program.
    pub fn destroy(&mut self, device: &dyn GraphicsDevice) {
        if let Some(id) = self.handle.take() {
            if let Err(err) = device.destroy_program(id) {
                log::warn!("Failed to destroy program '{}': {err}", self.label);
            }
        }
    }
}
