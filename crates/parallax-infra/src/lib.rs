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

//! # Parallax Infra
//!
//! Concrete implementations of the external dependencies declared as
//! traits in `parallax-core`. Currently this is the headless software
//! device, used by the render crate's tests and by CI runs without a
//! graphics context.

#![warn(missing_docs)]

pub mod headless;

pub use headless::{
    DrawCall, DrawKind, HeadlessDevice, ResourceCounts, TextureKind, UniformWrite,
};
