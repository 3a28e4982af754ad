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

//! Save-state format: a versioned, bincode
//! encoded bundle of each component's own state, composed from
//! `save_state`/`validate_state`/`load_state` methods on
//! [`RasterDriver`], [`Vdp1`], [`Vdp2`], [`Sh1`] and, when threaded
//! rendering is enabled, the render dispatcher's mirror state.
//!
//! Validation is gated behind `skip_rom_checks` (§6.4): by default a
//! save state whose embedded SH-1 ROM hash doesn't match the ROM
//! currently loaded is rejected, since restoring registers and RAM
//! against a different ROM produces nonsensical execution state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::dispatcher::events::Vdp2Snapshot;
use crate::core::error::{Result, SaveStateError};
use crate::core::raster::RasterState;
use crate::core::sh1::Sh1State;
use crate::core::system::System;
use crate::core::vdp1::Vdp1State;
use crate::core::vdp2::Vdp2State;

/// Bumped whenever the on-disk layout of [`SaveState`] changes in a
/// way that isn't backward compatible.
pub const SAVE_STATE_VERSION: u32 = 1;

/// Metadata describing when a save state was produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveStateMetadata {
    pub created_at: DateTime<Utc>,
    pub version: u32,
}

impl SaveStateMetadata {
    fn new(created_at: DateTime<Utc>) -> Self {
        Self {
            created_at,
            version: SAVE_STATE_VERSION,
        }
    }
}

/// The render dispatcher's mirror state, captured only when threaded
/// rendering was enabled at save time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatcherState {
    pub mirror: Vdp2Snapshot,
}

/// A complete, self-describing snapshot of a running [`System`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveState {
    pub metadata: SaveStateMetadata,
    pub raster: RasterState,
    pub vdp1: Vdp1State,
    pub vdp2: Vdp2State,
    pub sh1: Sh1State,
    pub dispatcher: Option<DispatcherState>,
}

impl SaveState {
    /// Captures every component's state from a running system.
    /// `created_at` is supplied by the caller since this core never
    /// reads the wall clock itself.
    pub fn from_system(system: &System, created_at: DateTime<Utc>) -> Self {
        let dispatcher = system.dispatcher().map(|dispatcher| DispatcherState {
            mirror: dispatcher.save_state(),
        });

        Self {
            metadata: SaveStateMetadata::new(created_at),
            raster: system.raster.save_state(),
            vdp1: system.vdp1.save_state(),
            vdp2: system.vdp2.save_state(),
            sh1: system.sh1.save_state(),
            dispatcher,
        }
    }

    /// Validates every section against `system`'s current state,
    /// rejecting a mismatched version outright and rejecting ROM-hash
    /// mismatches unless `skip_rom_checks` is set.
    pub fn validate(&self, system: &System, skip_rom_checks: bool) -> Result<()> {
        if self.metadata.version != SAVE_STATE_VERSION {
            return Err(SaveStateError::VersionMismatch {
                expected: SAVE_STATE_VERSION,
                got: self.metadata.version,
            }
            .into());
        }
        system.raster.validate_state(&self.raster, skip_rom_checks)?;
        system.vdp1.validate_state(&self.vdp1, skip_rom_checks)?;
        system.vdp2.validate_state(&self.vdp2, skip_rom_checks)?;
        system.sh1.validate_state(&self.sh1, skip_rom_checks)?;
        if let (Some(dispatcher), Some(state)) = (system.dispatcher(), &self.dispatcher) {
            dispatcher.validate_state(&state.mirror, skip_rom_checks)?;
        }
        Ok(())
    }

    /// Restores every component's state onto `system`. Callers should
    /// call [`SaveState::validate`] first; this method does not
    /// re-validate.
    pub fn load_into(&self, system: &mut System) {
        system.raster.load_state(&self.raster);
        system.vdp1.load_state(&self.vdp1);
        system.vdp2.load_state(&self.vdp2);
        system.sh1.load_state(&self.sh1);
        if let (Some(dispatcher), Some(state)) = (system.dispatcher(), &self.dispatcher) {
            dispatcher.load_state(state.mirror.clone());
        }
    }

    /// Encodes this save state with bincode and writes it to `path`.
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<()> {
        let bytes = bincode::serde::encode_to_vec(self, bincode::config::standard())
            .map_err(|err| SaveStateError::Decode(err.to_string()))?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Reads and decodes a save state previously written by
    /// [`SaveState::save_to_file`].
    pub fn load_from_file(path: &std::path::Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let (state, _) = bincode::serde::decode_from_slice(&bytes, bincode::config::standard())
            .map_err(|err| SaveStateError::Decode(err.to_string()))?;
        Ok(state)
    }

    /// Rough encoded size in bytes, useful for UI progress/size display
    /// without actually performing the encode.
    pub fn estimated_size(&self) -> usize {
        bincode::serde::encode_to_vec(self, bincode::config::standard())
            .map(|bytes| bytes.len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Configuration;
    use crate::core::sh1::ROM_SIZE;
    use chrono::TimeZone;

    fn sample_system() -> System {
        let mut system = System::new(Configuration::default()).unwrap();
        system.load_sh1_rom(&vec![0u8; ROM_SIZE]).unwrap();
        system.reset();
        system
    }

    fn sample_timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn captures_the_current_format_version() {
        let system = sample_system();
        let state = SaveState::from_system(&system, sample_timestamp());
        assert_eq!(state.metadata.version, SAVE_STATE_VERSION);
    }

    #[test]
    fn validate_rejects_a_future_format_version() {
        let system = sample_system();
        let mut state = SaveState::from_system(&system, sample_timestamp());
        state.metadata.version = SAVE_STATE_VERSION + 1;
        let err = state.validate(&system, false).unwrap_err();
        assert!(matches!(
            err,
            crate::core::error::SaturnError::SaveState(SaveStateError::VersionMismatch { .. })
        ));
    }

    #[test]
    fn validate_rejects_a_mismatched_rom_hash_unless_skipped() {
        let system = sample_system();
        let mut state = SaveState::from_system(&system, sample_timestamp());
        state.sh1.rom_hash ^= 1;
        assert!(state.validate(&system, false).is_err());
        assert!(state.validate(&system, true).is_ok());
    }

    #[test]
    fn round_trips_through_a_file() {
        let system = sample_system();
        let state = SaveState::from_system(&system, sample_timestamp());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slot0.sav");
        state.save_to_file(&path).unwrap();
        let loaded = SaveState::load_from_file(&path).unwrap();
        assert_eq!(loaded.metadata.version, state.metadata.version);
        assert_eq!(loaded.sh1.rom_hash, state.sh1.rom_hash);
    }

    #[test]
    fn load_into_restores_sh1_registers() {
        let mut system = sample_system();
        let state = SaveState::from_system(&system, sample_timestamp());
        system.sh1.pc = 0xdead_beef;
        state.load_into(&mut system);
        assert_eq!(system.sh1.pc, state.sh1.pc);
    }
}
