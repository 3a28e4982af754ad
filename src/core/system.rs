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

//! Top-level system composition: owns the SH-1, VDP1, VDP2 and raster
//! driver, wires them through the render dispatcher when threaded
//! rendering is enabled, and drives them together one `advance` slice
//! at a time.

use crate::core::bus::{FlatBus, SerialCallbacks, VideoCallbacks};
use crate::core::config::Configuration;
use crate::core::dispatcher::{Dispatcher, ThreadedVdp2Sink};
use crate::core::error::Result;
use crate::core::raster::{HResMode, RasterDriver};
use crate::core::sh1::Sh1;
use crate::core::vdp1::Vdp1;
use crate::core::vdp2::{Vdp2, Vdp2Sink};

/// A running Saturn core: the four hardware components plus the
/// timing driver that ticks them in lockstep.
pub struct System {
    pub sh1: Sh1,
    pub vdp1: Vdp1,
    pub vdp2: Vdp2,
    pub raster: RasterDriver,
    pub bus: FlatBus,
    dispatcher: Option<Dispatcher>,
    config: Configuration,
}

impl System {
    /// Builds a system from `config`, spawning the render dispatcher
    /// when `video.threadedVDP` is set.
    pub fn new(config: Configuration) -> Result<Self> {
        let dispatcher = if config.video.threaded_vdp {
            Some(Dispatcher::new()?)
        } else {
            None
        };
        let mut vdp2 = Vdp2::new();
        vdp2.set_deinterlace(config.video.deinterlace);
        let mut vdp1 = Vdp1::new();
        vdp1.set_transparent_meshes_enabled(config.video.transparent_meshes);

        Ok(Self {
            sh1: Sh1::new(),
            vdp1,
            vdp2,
            raster: RasterDriver::new(config.system.video_standard, HResMode::Normal),
            bus: FlatBus::new(0x0100_0000),
            dispatcher,
            config,
        })
    }

    /// Loads a 64 KiB SH-1 ROM image.
    pub fn load_sh1_rom(&mut self, rom: &[u8]) -> Result<()> {
        self.sh1.load_rom(rom)
    }

    /// Hard-resets every component and the raster phase machine.
    pub fn reset(&mut self) {
        self.sh1.hard_reset();
        self.vdp1.hard_reset();
        self.vdp2.hard_reset();
        self.raster.reset();
    }

    /// Runs the system for `cycles` SH-1 host cycles, ticking the
    /// raster phase machine (and, through it, VDP1/VDP2 line renders)
    /// once per elapsed cycle.
    pub fn advance<C: VideoCallbacks>(&mut self, cycles: u64, callbacks: &mut C, serial: &mut dyn SerialCallbacks) {
        self.sh1.advance(cycles, &mut self.bus, serial);

        for _ in 0..cycles {
            if let Some(dispatcher) = &self.dispatcher {
                let mut sink = ThreadedVdp2Sink {
                    dispatcher,
                    vdp1: &self.vdp1,
                    callbacks: &mut *callbacks,
                    use_mirror: self.config.video.include_vdp1_in_render_thread,
                };
                self.raster.tick(&mut sink);
            } else {
                let mut sink = Vdp2Sink {
                    vdp2: &mut self.vdp2,
                    vdp1: &self.vdp1,
                    callbacks: &mut *callbacks,
                    use_mirror: false,
                };
                self.raster.tick(&mut sink);
            }
        }
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn dispatcher(&self) -> Option<&Dispatcher> {
        self.dispatcher.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_system_starts_with_a_zeroed_sh1() {
        let system = System::new(Configuration::default()).unwrap();
        assert_eq!(system.sh1.total_cycles(), 0);
    }

    #[test]
    fn advance_ticks_the_raster_driver() {
        let mut system = System::new(Configuration::default()).unwrap();
        let rom = vec![0u8; crate::core::sh1::ROM_SIZE];
        system.load_sh1_rom(&rom).unwrap();
        system.reset();
        let mut callbacks = ();
        let mut serial = ();
        system.advance(4, &mut callbacks, &mut serial);
        assert!(system.sh1.total_cycles() > 0);
    }

    #[test]
    fn threaded_vdp_config_spawns_a_dispatcher() {
        let mut config = Configuration::default();
        config.video.threaded_vdp = true;
        let system = System::new(config).unwrap();
        assert!(system.dispatcher().is_some());
    }
}
