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

use saturn_core::core::config::Configuration;
use saturn_core::core::error::Result;
use saturn_core::core::save_state::SaveState;
use saturn_core::core::sh1::ROM_SIZE;
use saturn_core::core::system::System;
use chrono::{TimeZone, Utc};

fn blank_rom() -> Vec<u8> {
    vec![0u8; ROM_SIZE]
}

#[test]
fn system_starts_with_zeroed_cycles() -> Result<()> {
    let system = System::new(Configuration::default())?;
    assert_eq!(system.sh1.total_cycles(), 0);
    Ok(())
}

#[test]
fn reset_restores_pc_from_the_loaded_rom() {
    let mut system = System::new(Configuration::default()).unwrap();
    system.load_sh1_rom(&blank_rom()).unwrap();
    system.reset();
    assert_eq!(system.sh1.pc, 0);
}

#[test]
fn advance_runs_sh1_cycles_and_ticks_the_raster_driver() {
    let mut system = System::new(Configuration::default()).unwrap();
    system.load_sh1_rom(&blank_rom()).unwrap();
    system.reset();
    let mut callbacks = ();
    let mut serial = ();
    system.advance(1000, &mut callbacks, &mut serial);
    assert!(system.sh1.total_cycles() > 0);
}

#[test]
fn threaded_vdp_system_advances_without_deadlocking() {
    let mut config = Configuration::default();
    config.video.threaded_vdp = true;
    let mut system = System::new(config).unwrap();
    system.load_sh1_rom(&blank_rom()).unwrap();
    system.reset();
    let mut callbacks = ();
    let mut serial = ();
    system.advance(500, &mut callbacks, &mut serial);
}

#[test]
fn save_state_round_trips_through_a_running_system() {
    let mut system = System::new(Configuration::default()).unwrap();
    system.load_sh1_rom(&blank_rom()).unwrap();
    system.reset();
    let mut callbacks = ();
    let mut serial = ();
    system.advance(200, &mut callbacks, &mut serial);

    let timestamp = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let state = SaveState::from_system(&system, timestamp);
    state.validate(&system, false).unwrap();

    system.sh1.pc = 0xdead_beef;
    state.load_into(&mut system);
    assert_eq!(system.sh1.pc, state.sh1.pc);
}
