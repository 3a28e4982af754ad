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

//! Composition/blending pipeline: selects each
//! pixel's three topmost non-transparent layers, blends them, applies
//! line-colour and sprite shadow, then hands back to the caller for
//! colour-offset application.

use super::registers::ColorCalcMode;

/// One candidate layer sample feeding the compositor for a single
/// pixel; `index` is the layer's fixed priority-tie-break order
/// (sprite layer plus NBG0..NBG3/RBG0/RBG1).
#[derive(Debug, Clone, Copy)]
pub struct CompositeInput {
    pub index: u8,
    pub priority: u8,
    pub transparent: bool,
    pub color: (u8, u8, u8),
    pub color_calc_enabled: bool,
    pub color_calc_mode: ColorCalcMode,
    /// Ratio out of 32.
    pub color_calc_ratio: u8,
    pub shadow_receiving: bool,
}

fn saturating_add(a: (u8, u8, u8), b: (u8, u8, u8)) -> (u8, u8, u8) {
    (a.0.saturating_add(b.0), a.1.saturating_add(b.1), a.2.saturating_add(b.2))
}

fn average(a: (u8, u8, u8), b: (u8, u8, u8)) -> (u8, u8, u8) {
    (
        ((a.0 as u16 + b.0 as u16) / 2) as u8,
        ((a.1 as u16 + b.1 as u16) / 2) as u8,
        ((a.2 as u16 + b.2 as u16) / 2) as u8,
    )
}

fn ratio_blend(top: (u8, u8, u8), bottom: (u8, u8, u8), ratio: u8) -> (u8, u8, u8) {
    let ratio = ratio.min(31) as u32;
    let mix = |t: u8, b: u8| -> u8 { ((t as u32 * ratio + b as u32 * (32 - ratio)) / 32) as u8 };
    (mix(top.0, bottom.0), mix(top.1, bottom.1), mix(top.2, bottom.2))
}

fn halve(c: (u8, u8, u8)) -> (u8, u8, u8) {
    (c.0 / 2, c.1 / 2, c.2 / 2)
}

fn blend_pair(top: (u8, u8, u8), bottom: (u8, u8, u8), mode: ColorCalcMode, ratio: u8) -> (u8, u8, u8) {
    match mode {
        ColorCalcMode::SaturatedAdd => saturating_add(top, bottom),
        ColorCalcMode::HalfBlend => average(top, bottom),
        ColorCalcMode::RatioBlend | ColorCalcMode::RatioBlendSecondScreen => ratio_blend(top, bottom, ratio),
        ColorCalcMode::Extended => average(top, bottom),
    }
}

/// Sorts visible layers by (priority desc, index asc) and keeps the
/// topmost three.
fn select_top_three(layers: &[CompositeInput]) -> Vec<CompositeInput> {
    let mut visible: Vec<CompositeInput> = layers.iter().copied().filter(|l| !l.transparent).collect();
    visible.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.index.cmp(&b.index)));
    visible.truncate(3);
    visible
}

/// Composites one pixel from its candidate layers.
/// `sprite_shadow_active` signals that a sprite-layer shadow pixel
/// covers this position; `line_color` is the optional per-line colour
/// overlay that blends with the second-topmost layer.
pub fn compose_pixel(
    layers: &[CompositeInput],
    sprite_shadow_active: bool,
    line_color: Option<(u8, u8, u8)>,
    back_color: (u8, u8, u8),
) -> (u8, u8, u8) {
    let top3 = select_top_three(layers);

    let mut result = match top3.len() {
        0 => back_color,
        1 => top3[0].color,
        2 => {
            let top = top3[0];
            let mut second = top3[1].color;
            if let Some(lc) = line_color {
                second = average(second, lc);
            }
            if top.color_calc_enabled {
                blend_pair(top.color, second, top.color_calc_mode, top.color_calc_ratio)
            } else {
                top.color
            }
        }
        _ => {
            let top = top3[0];
            let mid = top3[1];
            let bottom = top3[2];
            let mut second = if matches!(top.color_calc_mode, ColorCalcMode::Extended) {
                blend_pair(mid.color, bottom.color, ColorCalcMode::HalfBlend, 16)
            } else {
                mid.color
            };
            if let Some(lc) = line_color {
                second = average(second, lc);
            }
            if top.color_calc_enabled {
                blend_pair(top.color, second, top.color_calc_mode, top.color_calc_ratio)
            } else {
                top.color
            }
        }
    };

    if sprite_shadow_active {
        if let Some(top) = top3.first() {
            if top.shadow_receiving {
                result = halve(result);
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(index: u8, priority: u8, color: (u8, u8, u8)) -> CompositeInput {
        CompositeInput {
            index,
            priority,
            transparent: false,
            color,
            color_calc_enabled: false,
            color_calc_mode: ColorCalcMode::SaturatedAdd,
            color_calc_ratio: 16,
            shadow_receiving: false,
        }
    }

    #[test]
    fn no_visible_layers_yields_back_color() {
        let result = compose_pixel(&[], false, None, (1, 2, 3));
        assert_eq!(result, (1, 2, 3));
    }

    #[test]
    fn single_layer_passes_through() {
        let layers = [layer(0, 5, (10, 20, 30))];
        let result = compose_pixel(&layers, false, None, (0, 0, 0));
        assert_eq!(result, (10, 20, 30));
    }

    #[test]
    fn higher_priority_wins_tie_break_by_index() {
        let layers = [layer(1, 5, (10, 10, 10)), layer(0, 5, (20, 20, 20))];
        // Equal priority: lower index (0) wins the top slot.
        let result = compose_pixel(&layers, false, None, (0, 0, 0));
        assert_eq!(result, (20, 20, 20));
    }

    #[test]
    fn color_calc_half_blend_averages_top_two() {
        let mut top = layer(0, 5, (200, 200, 200));
        top.color_calc_enabled = true;
        top.color_calc_mode = ColorCalcMode::HalfBlend;
        let bottom = layer(1, 4, (0, 0, 0));
        let result = compose_pixel(&[top, bottom], false, None, (0, 0, 0));
        assert_eq!(result, (100, 100, 100));
    }

    #[test]
    fn sprite_shadow_halves_result_when_top_layer_receives_shadow() {
        let mut top = layer(0, 5, (200, 100, 50));
        top.shadow_receiving = true;
        let result = compose_pixel(&[top], true, None, (0, 0, 0));
        assert_eq!(result, (100, 50, 25));
    }
}
