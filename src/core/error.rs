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

//! Error types for the Saturn emulation core.
//!
//! Per the error handling design, no exception escapes the core's
//! public surface: decode errors, bus/address errors and command-list
//! corruption are all locally recovered (an exception vector is taken,
//! or a frame ends early, and a `log::warn!`/`log::debug!` entry is
//! produced instead). The types here exist for the cases that *do*
//! need to reach a caller: save-state validation, configuration
//! loading, and ROM loading.

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, SaturnError>;

/// Top-level error type for the Saturn emulation core.
#[derive(Debug, thiserror::Error)]
pub enum SaturnError {
    /// A save state failed validation or failed to load.
    #[error(transparent)]
    SaveState(#[from] SaveStateError),

    /// Configuration could not be loaded or parsed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An SH-1 bus/ROM-loading error.
    #[error(transparent)]
    Sh1(#[from] Sh1Error),

    /// I/O error (file operations).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the SH-1 core's public surface.
///
/// Decode errors and bus/address errors are locally
/// recovered by the interpreter itself (an exception vector is taken)
/// and never surface here. This type is used only by ROM loading.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Sh1Error {
    /// The supplied ROM image did not match the expected size.
    #[error("invalid SH-1 ROM size: expected {expected} bytes, got {got} bytes")]
    InvalidRomSize { expected: usize, got: usize },
}

/// Errors raised when validating or loading a save state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SaveStateError {
    /// The save state was produced by an incompatible format version.
    #[error("save state version mismatch: expected {expected}, got {got}")]
    VersionMismatch { expected: u32, got: u32 },

    /// The disc/BIOS/CD-block ROM hash embedded in the save state does
    /// not match the ROM currently loaded.
    #[error(
        "save state ROM hash mismatch for {component}: expected {expected:016x}, got {got:016x}"
    )]
    RomHashMismatch {
        component: &'static str,
        expected: u64,
        got: u64,
    },

    /// A component-level range check failed (e.g. an index outside its
    /// table, a count exceeding its buffer).
    #[error("save state range check failed: {0}")]
    RangeCheck(String),

    /// The save state file could not be decoded.
    #[error("save state decode error: {0}")]
    Decode(String),
}

/// Errors raised when loading configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be parsed as TOML.
    #[error("failed to parse configuration: {0}")]
    Toml(String),

    /// An environment variable override had an invalid value.
    #[error("invalid value for {key}: {value}")]
    InvalidEnvValue { key: &'static str, value: String },
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Toml(err.to_string())
    }
}
