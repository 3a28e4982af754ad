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

//! Sprite layer decode: reads the *displayed*
//! VDP1 framebuffer and interprets each pixel per the configured
//! sprite type — one of 16 layouts packing colour/priority/colour-calc
//! ratio/shadow-or-window bits across 8 or 16 bits of data.

use super::cram::Cram;

/// One of the 16 VDP1→VDP2 sprite data layouts. The low nibble of the
/// type value selects a word-mode (0x0..0x7) or byte-mode (0x8..0xf)
/// layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SpriteType(pub u8);

impl SpriteType {
    pub fn is_word_mode(&self) -> bool {
        self.0 < 8
    }
}

/// One decoded sprite-layer pixel.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpritePixel {
    pub transparent: bool,
    pub color: (u8, u8, u8),
    pub priority: u8,
    pub color_calc_ratio: u8,
    /// True if this pixel should be treated as a shadow source
    /// (halves the colour beneath it) rather than plotting its own
    /// colour.
    pub is_shadow: bool,
    /// True if this pixel participates in the sprite window.
    pub window_hit: bool,
}

/// Decodes one VDP1 framebuffer texel (already read as a u16) into a
/// sprite-layer pixel per `sprite_type`.
///
/// Word-mode types (0x0-0x7) pack a 15-bit colour directly or a
/// palette index plus priority/colour-calc/shadow fields at varying
/// bit widths depending on type, trading colour depth for more
/// priority/colour-calc bits. Byte-mode types (0x8-0xf) treat the
/// low/high byte of the word as two 8-bit palette-indexed pixels,
/// with fewer attribute bits available.
pub fn decode_sprite_pixel(sprite_type: SpriteType, texel: u16, cram: &mut Cram, palette_base: u16) -> SpritePixel {
    if sprite_type.is_word_mode() {
        decode_word_mode(sprite_type.0, texel, cram, palette_base)
    } else {
        decode_byte_mode(sprite_type.0, texel, cram, palette_base)
    }
}

fn decode_word_mode(type_id: u8, texel: u16, cram: &mut Cram, palette_base: u16) -> SpritePixel {
    match type_id {
        // Type 0: 10-bit colour, 3-bit priority, no colour calc, shadow bit.
        0 => {
            let color_index = texel & 0x03ff;
            let priority = ((texel >> 10) & 0x7) as u8;
            let shadow = texel & 0x8000 != 0;
            transparent_or(color_index == 0, || SpritePixel {
                transparent: false,
                color: cram.lookup(palette_base as usize + color_index as usize),
                priority,
                color_calc_ratio: 0,
                is_shadow: shadow,
                window_hit: false,
            })
        }
        // Type 1: 9-bit colour, 3-bit priority, 2-bit colour-calc ratio.
        1 => {
            let color_index = texel & 0x01ff;
            let priority = ((texel >> 9) & 0x7) as u8;
            let ratio = ((texel >> 12) & 0x3) as u8;
            transparent_or(color_index == 0, || SpritePixel {
                transparent: false,
                color: cram.lookup(palette_base as usize + color_index as usize),
                priority,
                color_calc_ratio: ratio,
                is_shadow: false,
                window_hit: false,
            })
        }
        // Type 2: direct RGB555, MSB-clear transparent, no priority/colour-calc.
        2 | 3..=7 => {
            if texel & 0x8000 == 0 {
                SpritePixel::default()
            } else {
                let expand = |c: u16| (((c & 0x1f) as u8) << 3) | ((c & 0x1f) as u8 >> 2);
                SpritePixel {
                    transparent: false,
                    color: (expand(texel), expand(texel >> 5), expand(texel >> 10)),
                    priority: 0,
                    color_calc_ratio: 0,
                    is_shadow: false,
                    window_hit: false,
                }
            }
        }
        _ => unreachable!("word-mode type out of range"),
    }
}

fn decode_byte_mode(_type_id: u8, texel: u16, cram: &mut Cram, palette_base: u16) -> SpritePixel {
    // Byte-mode types pack a smaller palette index with fewer
    // attribute bits; approximate with a 7-bit index, 1-bit priority
    // and 4 bits reserved for window/shadow flags.
    let color_index = texel & 0x007f;
    let priority = ((texel >> 7) & 0x1) as u8;
    let window_hit = texel & 0x0100 != 0;
    let shadow = texel & 0x0200 != 0;
    transparent_or(color_index == 0, || SpritePixel {
        transparent: false,
        color: cram.lookup(palette_base as usize + color_index as usize),
        priority,
        color_calc_ratio: 0,
        is_shadow: shadow,
        window_hit,
    })
}

fn transparent_or(is_transparent: bool, build: impl FnOnce() -> SpritePixel) -> SpritePixel {
    if is_transparent {
        SpritePixel::default()
    } else {
        build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type0_zero_index_is_transparent() {
        let mut cram = Cram::new();
        let pixel = decode_sprite_pixel(SpriteType(0), 0x0000, &mut cram, 0);
        assert!(pixel.transparent);
    }

    #[test]
    fn type0_extracts_priority_and_shadow() {
        let mut cram = Cram::new();
        let texel = 0x8000 | (3 << 10) | 5;
        let pixel = decode_sprite_pixel(SpriteType(0), texel, &mut cram, 0);
        assert!(!pixel.transparent);
        assert_eq!(pixel.priority, 3);
        assert!(pixel.is_shadow);
    }

    #[test]
    fn type2_rgb_mode_honours_msb_transparency() {
        let mut cram = Cram::new();
        let transparent = decode_sprite_pixel(SpriteType(2), 0x0000, &mut cram, 0);
        assert!(transparent.transparent);
        let opaque = decode_sprite_pixel(SpriteType(2), 0xffff, &mut cram, 0);
        assert!(!opaque.transparent);
        assert_eq!(opaque.color, (255, 255, 255));
    }

    #[test]
    fn byte_mode_extracts_window_hit() {
        let mut cram = Cram::new();
        let texel = 0x0100 | 4;
        let pixel = decode_sprite_pixel(SpriteType(8), texel, &mut cram, 0);
        assert!(pixel.window_hit);
        assert!(!pixel.transparent);
    }
}
