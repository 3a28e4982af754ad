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

//! Configuration loading for the Saturn emulation core.
//!
//! Configuration values are injected as observed fields on a
//! [`Configuration`] object. A TOML file supplies the
//! base values; environment variables (loaded from an optional `.env`
//! file via `dotenvy`, then from the process environment) override
//! them, letting a host integrate this core without recompiling it.
//!
//! # Example
//!
//! ```
//! use saturn_core::core::config::Configuration;
//!
//! let config = Configuration::default();
//! assert_eq!(config.system.video_standard, saturn_core::core::config::VideoStandard::Ntsc);
//! ```

use crate::core::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Video timing standard; selects the HCNT/VCNT timing tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoStandard {
    /// 263/262 lines per field.
    Ntsc,
    /// 313/312 lines per field.
    Pal,
}

/// `system.*` configuration fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    /// `system.videoStandard` — switches NTSC/PAL timing tables.
    pub video_standard: VideoStandard,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            video_standard: VideoStandard::Ntsc,
        }
    }
}

/// `video.*` configuration fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// `video.threadedVDP` — enables the dual-threaded render dispatcher (§4.5).
    pub threaded_vdp: bool,
    /// `video.threadedDeinterlacer` — spawns a second render helper thread.
    pub threaded_deinterlacer: bool,
    /// `video.includeVDP1InRenderThread` — moves VDP1 command processing
    /// onto the render thread.
    pub include_vdp1_in_render_thread: bool,
    /// Emulator-internal deinterlacing: both field lines are written for
    /// each source scanline (§4.3 item 6).
    pub deinterlace: bool,
    /// Enables the transparent-mesh overlay enhancement (§3.2).
    pub transparent_meshes: bool,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            threaded_vdp: false,
            threaded_deinterlacer: false,
            include_vdp1_in_render_thread: false,
            deinterlace: false,
            transparent_meshes: false,
        }
    }
}

/// `sh1.*` configuration fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sh1Config {
    /// Relaxes save-state ROM hash validation (§3.5, §6.4).
    pub skip_rom_checks: bool,
}

impl Default for Sh1Config {
    fn default() -> Self {
        Self {
            skip_rom_checks: false,
        }
    }
}

/// Top-level configuration consumed by the core.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub system: SystemConfig,
    pub video: VideoConfig,
    pub sh1: Sh1Config,
}

impl Configuration {
    /// Loads configuration from an optional TOML file, then applies
    /// environment-variable overrides.
    ///
    /// `.env` (if present in the current directory) is loaded first via
    /// `dotenvy`, so environment overrides can be supplied either way.
    pub fn load(path: Option<&Path>) -> Result<Configuration> {
        // Best-effort: a missing .env file is not an error.
        let _ = dotenvy::dotenv();

        let mut config = match path {
            Some(path) if path.exists() => {
                let text = std::fs::read_to_string(path)?;
                toml::from_str(&text).map_err(ConfigError::from)?
            }
            _ => Configuration::default(),
        };

        config.apply_env_overrides()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(value) = std::env::var("SATURN_VIDEO_STANDARD") {
            self.system.video_standard = match value.to_lowercase().as_str() {
                "ntsc" => VideoStandard::Ntsc,
                "pal" => VideoStandard::Pal,
                _ => {
                    return Err(ConfigError::InvalidEnvValue {
                        key: "SATURN_VIDEO_STANDARD",
                        value,
                    }
                    .into())
                }
            };
        }

        self.video.threaded_vdp =
            Self::bool_override("SATURN_THREADED_VDP", self.video.threaded_vdp)?;
        self.video.threaded_deinterlacer = Self::bool_override(
            "SATURN_THREADED_DEINTERLACER",
            self.video.threaded_deinterlacer,
        )?;
        self.video.include_vdp1_in_render_thread = Self::bool_override(
            "SATURN_INCLUDE_VDP1_IN_RENDER_THREAD",
            self.video.include_vdp1_in_render_thread,
        )?;
        self.video.deinterlace =
            Self::bool_override("SATURN_DEINTERLACE", self.video.deinterlace)?;
        self.video.transparent_meshes = Self::bool_override(
            "SATURN_TRANSPARENT_MESHES",
            self.video.transparent_meshes,
        )?;
        self.sh1.skip_rom_checks =
            Self::bool_override("SATURN_SKIP_ROM_CHECKS", self.sh1.skip_rom_checks)?;

        Ok(())
    }

    fn bool_override(key: &'static str, current: bool) -> Result<bool> {
        match std::env::var(key) {
            Ok(value) => match value.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                _ => Err(ConfigError::InvalidEnvValue { key, value }.into()),
            },
            Err(_) => Ok(current),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_configuration_is_ntsc_single_threaded() {
        let config = Configuration::default();
        assert_eq!(config.system.video_standard, VideoStandard::Ntsc);
        assert!(!config.video.threaded_vdp);
        assert!(!config.sh1.skip_rom_checks);
    }

    #[test]
    fn toml_round_trip_preserves_fields() {
        let config = Configuration {
            system: SystemConfig {
                video_standard: VideoStandard::Pal,
            },
            video: VideoConfig {
                threaded_vdp: true,
                ..Default::default()
            },
            sh1: Sh1Config {
                skip_rom_checks: true,
            },
        };
        let text = toml::to_string(&config).unwrap();
        let parsed: Configuration = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = Configuration::load(Some(Path::new("/nonexistent/path.toml"))).unwrap();
        assert_eq!(config, Configuration::default());
    }
}
