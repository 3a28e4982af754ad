// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
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

//! Sega Saturn emulator core library
//!
//! This library provides the core emulation components for a Sega
//! Saturn VDP1/VDP2 video subsystem and SH-1 sub-CPU: a phase-accurate
//! raster timing driver, the VDP1 sprite/polygon rasterizer, the VDP2
//! background compositor, the SH-1 microcontroller core, and a
//! threaded render dispatcher that can move VDP2 compositing onto its
//! own thread.
//!
//! # Example
//!
//! ```
//! use saturn_core::core::sh1::Sh1;
//! use saturn_core::core::vdp2::Vdp2;
//!
//! let mut sh1 = Sh1::new();
//! let vdp2 = Vdp2::new();
//! sh1.hard_reset();
//! assert_eq!(vdp2.framebuffer().len(), 320 * 224);
//! ```

pub mod core;
