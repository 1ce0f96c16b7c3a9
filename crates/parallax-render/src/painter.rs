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

//! The painter list: ordered frame composition.
//!
//! Painters render in registration order, so the scene painters come
//! first and the stereogram compositor last. The list holds its
//! registrants under a `Mutex`; painting holds the same lock, so the
//! list cannot change structurally mid-frame.

use crate::frame::FrameContext;
use crate::mesh::RenderMesh;
use crate::stereogram::Stereogram;
use parallax_core::gfx::RenderError;
use std::sync::Mutex;

/// Anything that can paint itself into the current frame.
pub trait Paintable {
    /// Paints one frame. Errors are reported per painter and do not
    /// stop the rest of the frame.
    fn render(&mut self, ctx: &mut FrameContext<'_>) -> Result<(), RenderError>;
}

/// An ordered list of painters, painted front to back each frame.
#[derive(Default)]
pub struct PainterList {
    painters: Mutex<Vec<Box<dyn Paintable>>>,
}

impl PainterList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a painter; it paints after everything registered before.
    pub fn register(&self, painter: Box<dyn Paintable>) {
        self.painters.lock().unwrap().push(painter);
    }

    /// Number of registered painters.
    pub fn len(&self) -> usize {
        self.painters.lock().unwrap().len()
    }

    /// Whether no painters are registered.
    pub fn is_empty(&self) -> bool {
        self.painters.lock().unwrap().is_empty()
    }

    /// Paints every registrant in order. A painter error is logged and
    /// the remaining painters still run.
    pub fn paint_all(&self, ctx: &mut FrameContext<'_>) {
        let mut painters = self.painters.lock().unwrap();
        for painter in painters.iter_mut() {
            if let Err(err) = painter.render(ctx) {
                log::error!("Painter failed this frame: {err}");
            }
        }
    }
}

impl std::fmt::Debug for PainterList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PainterList")
            .field("painters", &self.len())
            .finish()
    }
}

impl Paintable for RenderMesh {
    fn render(&mut self, ctx: &mut FrameContext<'_>) -> Result<(), RenderError> {
        RenderMesh::render(self, ctx)
    }
}

impl Paintable for Stereogram {
    fn render(&mut self, ctx: &mut FrameContext<'_>) -> Result<(), RenderError> {
        Stereogram::render(self, ctx)
    }
}
