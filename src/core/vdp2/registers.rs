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

//! Per-background, rotation, window and colour-offset register state.

use serde::{Deserialize, Serialize};

/// One of the six background layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Layer {
    Nbg0,
    Nbg1,
    Nbg2,
    Nbg3,
    Rbg0,
    Rbg1,
}

pub const ALL_LAYERS: [Layer; 6] = [
    Layer::Nbg0,
    Layer::Nbg1,
    Layer::Nbg2,
    Layer::Nbg3,
    Layer::Rbg0,
    Layer::Rbg1,
];

/// Colour format a background layer's cells/bitmap are stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorFormat {
    #[default]
    Palette16,
    Palette256,
    Palette2048,
    Rgb555,
    Rgb888,
}

/// Colour-calculation blend mode, selected per layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorCalcMode {
    #[default]
    SaturatedAdd,
    HalfBlend,
    /// Ratio taken from the top layer's attribute.
    RatioBlend,
    /// Ratio taken from the configured "second screen" layer instead.
    RatioBlendSecondScreen,
    /// Blends the bottom two layers first, then blends that result
    /// with the top layer.
    Extended,
}

/// Per-background configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BgParams {
    pub enabled: bool,
    pub color_format: ColorFormat,
    pub bitmap_mode: bool,
    /// Character/cell size: `false` = 1x1 pattern, `true` = 2x2.
    pub double_density_pattern: bool,
    pub mosaic_enabled: bool,
    pub priority: u8,
    pub color_calc_enabled: bool,
    pub color_calc_mode: ColorCalcMode,
    /// Blend ratio numerator out of 32 (0..=31), used by `RatioBlend`.
    pub color_calc_ratio: u8,
    pub scroll_x: i32,
    pub scroll_y: i32,
    pub line_scroll_enabled: bool,
    pub vertical_cell_scroll_enabled: bool,
    /// Base VRAM2 address the character/cell/bitmap data for this
    /// layer is fetched from.
    pub base_address: u32,
    /// Palette bank base within CRAM for palette formats.
    pub palette_base: u16,
    /// Bitmap size (power-of-two) when `bitmap_mode` is set.
    pub bitmap_width: u32,
    pub bitmap_height: u32,
    /// Flip flags applied at the character-pattern level.
    pub flip_h: bool,
    pub flip_v: bool,
    pub shadow_receiving: bool,
}

impl Default for BgParams {
    fn default() -> Self {
        Self {
            enabled: false,
            color_format: ColorFormat::default(),
            bitmap_mode: false,
            double_density_pattern: false,
            mosaic_enabled: false,
            priority: 0,
            color_calc_enabled: false,
            color_calc_mode: ColorCalcMode::default(),
            color_calc_ratio: 16,
            scroll_x: 0,
            scroll_y: 0,
            line_scroll_enabled: false,
            vertical_cell_scroll_enabled: false,
            base_address: 0,
            palette_base: 0,
            bitmap_width: 512,
            bitmap_height: 256,
            flip_h: false,
            flip_v: false,
            shadow_receiving: false,
        }
    }
}

/// One 3x3 affine screen transform plus coefficient-table selection
/// for a rotation parameter table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RotationParams {
    /// Screen-space origin (Xst, Yst).
    pub origin: (f32, f32),
    /// View-point (Xp, Yp) the rotation is performed about.
    pub viewpoint: (f32, f32),
    /// 3x3 matrix coefficients, row-major.
    pub matrix: [[f32; 3]; 3],
    /// Per-pixel coefficient table base in VRAM2, if enabled.
    pub coefficient_table_base: Option<u32>,
    pub line_color_base: Option<u32>,
}

impl Default for RotationParams {
    fn default() -> Self {
        Self {
            origin: (0.0, 0.0),
            viewpoint: (0.0, 0.0),
            matrix: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            coefficient_table_base: None,
            line_color_base: None,
        }
    }
}

/// Which rotation parameter table (or selection mode) an RBG layer
/// uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RotationSelect {
    #[default]
    TableA,
    TableB,
    /// Select by whether the coefficient is transparent.
    CoefficientTransparency,
    /// Select per-pixel via the configured window.
    Windowed,
}

/// Combine logic for the two coordinate windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WindowLogic {
    #[default]
    Or,
    And,
}

/// One rectangular coordinate window.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CoordinateWindow {
    pub enabled: bool,
    pub invert: bool,
    pub x0: i32,
    pub x1: i32,
    pub y0: i32,
    pub y1: i32,
    /// If set, per-line X start/end overrides are read from a VRAM2
    /// table instead of using `x0`/`x1` directly.
    pub line_window_table_base: Option<u32>,
}

impl CoordinateWindow {
    fn contains(&self, x: i32, y: i32) -> bool {
        let inside = x >= self.x0 && x <= self.x1 && y >= self.y0 && y <= self.y1;
        if self.invert {
            !inside
        } else {
            inside
        }
    }
}

/// Per-layer window enable + combine configuration.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct WindowConfig {
    pub use_window_a: bool,
    pub use_window_b: bool,
    pub use_sprite_window: bool,
    pub logic: WindowLogic,
}

/// Global window parameter state: the two coordinate windows and the
/// sprite window, plus per-layer combine configs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WindowParams {
    pub window_a: CoordinateWindow,
    pub window_b: CoordinateWindow,
    pub sprite_window_invert: bool,
    pub layer_configs: [WindowConfig; 8],
}

impl WindowParams {
    /// Computes the boolean pass/fail mask for `layer` across one
    /// scanline of `width` pixels, combining window A/B (and, when
    /// `sprite_window` is supplied, the sprite window) per the
    /// configured AND/OR logic with per-window invert.
    pub fn compute_mask(&self, layer_index: usize, y: i32, width: u32, sprite_window: Option<&[bool]>) -> Vec<bool> {
        let cfg = self.layer_configs[layer_index.min(7)];
        if !cfg.use_window_a && !cfg.use_window_b && !cfg.use_sprite_window {
            return vec![true; width as usize];
        }

        (0..width as i32)
            .map(|x| {
                let mut results = Vec::with_capacity(3);
                if cfg.use_window_a {
                    results.push(self.window_a.contains(x, y));
                }
                if cfg.use_window_b {
                    results.push(self.window_b.contains(x, y));
                }
                if cfg.use_sprite_window {
                    let mut hit = sprite_window
                        .and_then(|w| w.get(x as usize))
                        .copied()
                        .unwrap_or(false);
                    if self.sprite_window_invert {
                        hit = !hit;
                    }
                    results.push(hit);
                }
                match cfg.logic {
                    WindowLogic::And => results.iter().all(|&b| b),
                    WindowLogic::Or => results.iter().any(|&b| b),
                }
            })
            .collect()
    }
}

/// Signed 9-bit per-channel colour offset triple.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ColorOffset {
    pub r: i16,
    pub g: i16,
    pub b: i16,
}

impl ColorOffset {
    /// Applies the offset to an RGB888 colour with per-channel
    /// saturation.
    pub fn apply(&self, rgb: (u8, u8, u8)) -> (u8, u8, u8) {
        let clamp = |channel: u8, offset: i16| -> u8 {
            (channel as i16 + offset).clamp(0, 255) as u8
        };
        (clamp(rgb.0, self.r), clamp(rgb.1, self.g), clamp(rgb.2, self.b))
    }
}

/// The colour-offset table: two entries, each layer selecting one.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ColorOffsetTable {
    pub entries: [ColorOffset; 2],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_mask_defaults_to_all_pass_when_unconfigured() {
        let windows = WindowParams::default();
        let mask = windows.compute_mask(0, 10, 8, None);
        assert!(mask.iter().all(|&b| b));
    }

    #[test]
    fn and_logic_requires_both_windows() {
        let mut windows = WindowParams::default();
        windows.window_a = CoordinateWindow { enabled: true, invert: false, x0: 0, x1: 3, y0: 0, y1: 100, line_window_table_base: None };
        windows.window_b = CoordinateWindow { enabled: true, invert: false, x0: 2, x1: 5, y0: 0, y1: 100, line_window_table_base: None };
        windows.layer_configs[0] = WindowConfig { use_window_a: true, use_window_b: true, use_sprite_window: false, logic: WindowLogic::And };
        let mask = windows.compute_mask(0, 0, 8, None);
        assert_eq!(mask, vec![false, false, true, true, false, false, false, false]);
    }

    #[test]
    fn color_offset_saturates_at_bounds() {
        let offset = ColorOffset { r: 200, g: -200, b: 0 };
        let (r, g, b) = offset.apply((100, 50, 10));
        assert_eq!(r, 255);
        assert_eq!(g, 0);
        assert_eq!(b, 10);
    }
}
