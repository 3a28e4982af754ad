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

//! Core emulation components
//!
//! This module contains all hardware emulation components:
//! - `sh1`: the SH-1 sub-CPU core (register file, decode, instructions)
//! - `vdp1`: sprite/polygon command processor and rasterizer
//! - `vdp2`: background/sprite-layer line compositor
//! - `raster`: the phase-accurate HCNT/VCNT timing driver
//! - `dispatcher`: the threaded render dispatcher (`video.threadedVDP`)
//! - `bus`: the `Bus`/`VideoCallbacks`/`SerialCallbacks` host-integration traits
//! - `config`: TOML + environment configuration loading
//! - `error`: the core's error taxonomy
//! - `timing`: the global tick/event scheduler
//! - `save_state`: bincode+serde save-state format, one section per component
//! - `system`: top-level composition wiring all of the above together

pub mod bus;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod raster;
pub mod save_state;
pub mod sh1;
pub mod system;
pub mod timing;
pub mod vdp1;
pub mod vdp2;

// Re-export commonly used types
pub use bus::{Bus, SerialCallbacks, VideoCallbacks};
pub use config::Configuration;
pub use dispatcher::Dispatcher;
pub use error::{Result, SaturnError};
pub use raster::{RasterDriver, RasterSink};
pub use save_state::SaveState;
pub use sh1::Sh1;
pub use system::System;
pub use timing::TimingEventManager;
pub use vdp1::Vdp1;
pub use vdp2::Vdp2;
