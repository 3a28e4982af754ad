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

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use saturn_core::core::config::Configuration;
use saturn_core::core::save_state::SaveState;
use saturn_core::core::sh1::ROM_SIZE;
use saturn_core::core::system::System;
use saturn_core::core::vdp2::cram::{Cram, CramMode};

proptest! {
    /// Any word written to CRAM reads back unchanged regardless of the
    /// addressing mode in effect at write time.
    #[test]
    fn cram_write_then_read_round_trips(
        addr in 0usize..4096,
        word in any::<u16>(),
        mode in prop_oneof![
            Just(CramMode::Mode0_1024x555Mirrored),
            Just(CramMode::Mode1_2048x555),
            Just(CramMode::Mode2_1024x888),
        ],
    ) {
        let mut cram = Cram::new();
        cram.set_mode(mode);
        cram.write_u16(addr, word);
        prop_assert_eq!(cram.read_u16(addr), word);
    }

    /// Saving then loading a state leaves the SH-1 program counter
    /// exactly where it was at save time, no matter how far execution
    /// has drifted in between.
    #[test]
    fn save_state_restores_program_counter(drift_cycles in 0u64..2000) {
        let mut system = System::new(Configuration::default()).unwrap();
        system.load_sh1_rom(&vec![0u8; ROM_SIZE]).unwrap();
        system.reset();

        let mut callbacks = ();
        let mut serial = ();
        system.advance(drift_cycles, &mut callbacks, &mut serial);

        let timestamp = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let state = SaveState::from_system(&system, timestamp);
        let pc_at_save = system.sh1.pc;

        system.advance(drift_cycles, &mut callbacks, &mut serial);
        state.load_into(&mut system);

        prop_assert_eq!(system.sh1.pc, pc_at_save);
    }
}
