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

//! Defines the point-light type and the bounded light registry.
//!
//! Lights are owned exclusively by the mesh that shades with them; the
//! registry bounds their number so shadow cube-map memory stays bounded,
//! evicting the oldest light first.

use crate::gfx::TextureId;
use crate::math::Vec3;

/// The maximum number of simultaneously active lights.
///
/// Matches the fixed uniform array sizes in the lit shading program.
pub const MAX_LIGHTS: usize = 5;

/// An omnidirectional point light with an optional shadow depth cube map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    /// World-space position of the light.
    pub origin: Vec3,
    /// Light color, each channel in `[0, 1]`.
    pub color: Vec3,
    /// The shadow depth cube map, absent until the shadow generator has
    /// produced it at least once. Present means "ready": the map is reused
    /// every frame unless invalidated.
    pub depth_map: Option<TextureId>,
}

impl Light {
    /// Creates a light with no depth map yet.
    pub fn new(origin: Vec3, color: Vec3) -> Self {
        Self {
            origin,
            color,
            depth_map: None,
        }
    }

    /// Whether the shadow map for this light is up to date.
    pub fn is_ready(&self) -> bool {
        self.depth_map.is_some()
    }
}

/// An ordered, bounded collection of active lights.
///
/// Insertion order is shading order: uniform slot `i` and texture unit
/// `1 + i` belong to the `i`-th registered light. When the registry is
/// full, pushing evicts from the front (FIFO) and hands the evicted
/// lights back so the owner can release their depth-map textures.
#[derive(Debug, Default)]
pub struct LightRegistry {
    lights: Vec<Light>,
}

impl LightRegistry {
    /// Creates an empty registry bounded at [`MAX_LIGHTS`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a light, evicting the oldest entries while the registry is
    /// at capacity.
    ///
    /// Returns the evicted lights, oldest first. The caller owns their GPU
    /// resources and must destroy any depth maps they still hold.
    #[must_use = "evicted lights still own GPU depth maps that must be released"]
    pub fn push(&mut self, light: Light) -> Vec<Light> {
        let mut evicted = Vec::new();
        while self.lights.len() >= MAX_LIGHTS {
            evicted.push(self.lights.remove(0));
        }
        self.lights.push(light);
        evicted
    }

    /// Removes and returns all lights, oldest first.
    ///
    /// Used at teardown; the caller releases any depth maps they hold.
    pub fn drain(&mut self) -> Vec<Light> {
        std::mem::take(&mut self.lights)
    }

    /// Number of active lights.
    pub fn len(&self) -> usize {
        self.lights.len()
    }

    /// Whether the registry holds no lights.
    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    /// Iterates lights in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Light> {
        self.lights.iter()
    }

    /// Iterates lights mutably in insertion order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Light> {
        self.lights.iter_mut()
    }

    /// Returns the first light (insertion order) whose depth map is stale.
    pub fn first_stale_mut(&mut self) -> Option<&mut Light> {
        self.lights.iter_mut().find(|l| !l.is_ready())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn light_at(x: f32) -> Light {
        Light::new(Vec3::new(x, 0.0, 0.0), Vec3::ONE)
    }

    #[test]
    fn new_light_is_stale() {
        let light = light_at(0.0);
        assert!(!light.is_ready());
        assert_eq!(light.depth_map, None);
    }

    #[test]
    fn push_under_capacity_evicts_nothing() {
        let mut reg = LightRegistry::new();
        for i in 0..MAX_LIGHTS {
            let evicted = reg.push(light_at(i as f32));
            assert!(evicted.is_empty());
        }
        assert_eq!(reg.len(), MAX_LIGHTS);
    }

    #[test]
    fn sixth_push_evicts_exactly_the_oldest() {
        let mut reg = LightRegistry::new();
        for i in 0..MAX_LIGHTS {
            let _ = reg.push(light_at(i as f32));
        }

        let evicted = reg.push(light_at(99.0));
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].origin.x, 0.0);

        // Remaining lights keep their original relative order.
        let xs: Vec<f32> = reg.iter().map(|l| l.origin.x).collect();
        assert_eq!(xs, vec![1.0, 2.0, 3.0, 4.0, 99.0]);
    }

    #[test]
    fn evicted_light_carries_its_depth_map() {
        let mut reg = LightRegistry::new();
        for i in 0..MAX_LIGHTS {
            let _ = reg.push(light_at(i as f32));
        }
        if let Some(first) = reg.iter_mut().next() {
            first.depth_map = Some(crate::gfx::TextureId(7));
        }

        let evicted = reg.push(light_at(99.0));
        assert_eq!(evicted[0].depth_map, Some(crate::gfx::TextureId(7)));
    }

    #[test]
    fn first_stale_follows_insertion_order() {
        let mut reg = LightRegistry::new();
        let _ = reg.push(light_at(0.0));
        let _ = reg.push(light_at(1.0));

        reg.first_stale_mut().unwrap().depth_map = Some(crate::gfx::TextureId(1));
        let next = reg.first_stale_mut().unwrap();
        assert_eq!(next.origin.x, 1.0);
    }

    #[test]
    fn drain_empties_the_registry() {
        let mut reg = LightRegistry::new();
        let _ = reg.push(light_at(0.0));
        let _ = reg.push(light_at(1.0));
        let drained = reg.drain();
        assert_eq!(drained.len(), 2);
        assert!(reg.is_empty());
    }
}
