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

//! Background cell/bitmap fetch: page → character
//! → cell → dot for tilemap layers, or direct wrap-around sampling for
//! bitmap layers.

use super::cram::Cram;
use super::registers::{BgParams, ColorFormat};

pub const CELL_SIZE: u32 = 8;

/// One decoded background pixel.
#[derive(Debug, Clone, Copy, Default)]
pub struct BgPixel {
    pub transparent: bool,
    pub color: (u8, u8, u8),
}

/// A character pattern entry read from the page table: the cell
/// address plus its own flip/palette attributes (2x2 character
/// pattern support).
#[derive(Debug, Clone, Copy, Default)]
struct CharacterPattern {
    cell_address: u32,
    palette_bank: u16,
    flip_h: bool,
    flip_v: bool,
}

fn read_u16(vram: &[u8], addr: u32) -> u16 {
    let addr = addr as usize % vram.len();
    let hi = vram[addr] as u16;
    let lo = vram[(addr + 1) % vram.len()] as u16;
    (hi << 8) | lo
}

fn fetch_character_pattern(vram: &[u8], page_base: u32, cell_x: u32, cell_y: u32, page_width_cells: u32) -> CharacterPattern {
    let index = cell_y * page_width_cells + cell_x;
    let entry_addr = page_base + index * 2;
    let raw = read_u16(vram, entry_addr);
    CharacterPattern {
        cell_address: ((raw & 0x0fff) as u32) * 32,
        palette_bank: (raw >> 12) & 0x7,
        flip_h: raw & 0x4000 != 0,
        flip_v: raw & 0x8000 != 0,
    }
}

fn texel_offset_for_format(format: ColorFormat, dot_x: u32, dot_y: u32) -> usize {
    match format {
        ColorFormat::Palette16 => ((dot_y * 8 + dot_x) / 2) as usize,
        ColorFormat::Palette256 => (dot_y * 8 + dot_x) as usize,
        ColorFormat::Palette2048 | ColorFormat::Rgb555 => ((dot_y * 8 + dot_x) * 2) as usize,
        ColorFormat::Rgb888 => ((dot_y * 8 + dot_x) * 4) as usize,
    }
}

fn decode_cell_dot(vram: &[u8], cram: &mut Cram, cell_address: u32, dot_x: u32, dot_y: u32, format: ColorFormat, palette_base: u16, palette_bank: u16) -> BgPixel {
    let offset = texel_offset_for_format(format, dot_x, dot_y);
    let addr = (cell_address as usize + offset) % vram.len();

    match format {
        ColorFormat::Palette16 => {
            let byte = vram[addr];
            let nibble = if dot_x % 2 == 0 { byte >> 4 } else { byte & 0x0f };
            if nibble == 0 {
                BgPixel { transparent: true, color: (0, 0, 0) }
            } else {
                let index = palette_base as usize + (palette_bank as usize * 16) + nibble as usize;
                BgPixel { transparent: false, color: cram.lookup(index) }
            }
        }
        ColorFormat::Palette256 => {
            let index_in_cell = vram[addr] as usize;
            if index_in_cell == 0 {
                BgPixel { transparent: true, color: (0, 0, 0) }
            } else {
                let index = palette_base as usize + index_in_cell;
                BgPixel { transparent: false, color: cram.lookup(index) }
            }
        }
        ColorFormat::Palette2048 => {
            let index_in_cell = read_u16(vram, addr as u32) as usize & 0x7ff;
            if index_in_cell == 0 {
                BgPixel { transparent: true, color: (0, 0, 0) }
            } else {
                BgPixel { transparent: false, color: cram.lookup(palette_base as usize + index_in_cell) }
            }
        }
        ColorFormat::Rgb555 => {
            let word = read_u16(vram, addr as u32);
            if word & 0x8000 == 0 {
                BgPixel { transparent: true, color: (0, 0, 0) }
            } else {
                let expand = |c: u16| (((c & 0x1f) as u8) << 3) | ((c & 0x1f) as u8 >> 2);
                BgPixel {
                    transparent: false,
                    color: (expand(word), expand(word >> 5), expand(word >> 10)),
                }
            }
        }
        ColorFormat::Rgb888 => {
            let alpha = vram[addr];
            if alpha == 0 {
                BgPixel { transparent: true, color: (0, 0, 0) }
            } else {
                BgPixel {
                    transparent: false,
                    color: (vram[(addr + 1) % vram.len()], vram[(addr + 2) % vram.len()], vram[(addr + 3) % vram.len()]),
                }
            }
        }
    }
}

/// Fetches one scanline of a cell-based (tilemap) background layer.
///
/// Pages are laid out as a flat grid of 8x8-pixel cells; a page is
/// addressed modulo its total pixel size, giving the tilemap's
/// wrap-around behaviour. 2x2 character patterns are supported by
/// doubling the cell step when `double_density_pattern` is set.
pub fn fetch_cell_line(vram: &[u8], cram: &mut Cram, params: &BgParams, y: i32, width: u32) -> Vec<BgPixel> {
    let page_width_cells = 64u32;
    let page_height_cells = 64u32;
    let pattern_cells = if params.double_density_pattern { 2 } else { 1 };

    (0..width)
        .map(|x| {
            let sx = (x as i32 + params.scroll_x).rem_euclid((page_width_cells * CELL_SIZE) as i32) as u32;
            let sy = (y + params.scroll_y).rem_euclid((page_height_cells * CELL_SIZE) as i32) as u32;

            let cell_x = (sx / CELL_SIZE / pattern_cells) * pattern_cells;
            let cell_y = (sy / CELL_SIZE / pattern_cells) * pattern_cells;
            let pattern = fetch_character_pattern(vram, params.base_address, cell_x, cell_y, page_width_cells);

            let mut dot_x = sx % (CELL_SIZE * pattern_cells);
            let mut dot_y = sy % (CELL_SIZE * pattern_cells);
            if params.flip_h || pattern.flip_h {
                dot_x = CELL_SIZE * pattern_cells - 1 - dot_x;
            }
            if params.flip_v || pattern.flip_v {
                dot_y = CELL_SIZE * pattern_cells - 1 - dot_y;
            }
            let local_x = dot_x % CELL_SIZE;
            let local_y = dot_y % CELL_SIZE;

            decode_cell_dot(
                vram,
                cram,
                pattern.cell_address,
                local_x,
                local_y,
                params.color_format,
                params.palette_base,
                pattern.palette_bank,
            )
        })
        .collect()
}

/// Fetches one scanline of a bitmap-mode background layer, wrapping
/// at the configured power-of-two bitmap size.
pub fn fetch_bitmap_line(vram: &[u8], cram: &mut Cram, params: &BgParams, y: i32, width: u32) -> Vec<BgPixel> {
    let bw = params.bitmap_width.max(1);
    let bh = params.bitmap_height.max(1);
    let sy = (y + params.scroll_y).rem_euclid(bh as i32) as u32;

    (0..width)
        .map(|x| {
            let sx = (x as i32 + params.scroll_x).rem_euclid(bw as i32) as u32;
            let offset = match params.color_format {
                ColorFormat::Palette16 => ((sy * bw + sx) / 2) as usize,
                ColorFormat::Palette256 => (sy * bw + sx) as usize,
                ColorFormat::Palette2048 | ColorFormat::Rgb555 => ((sy * bw + sx) * 2) as usize,
                ColorFormat::Rgb888 => ((sy * bw + sx) * 4) as usize,
            };
            let addr = (params.base_address as usize + offset) % vram.len();
            match params.color_format {
                ColorFormat::Palette16 => {
                    let byte = vram[addr];
                    let nibble = if sx % 2 == 0 { byte >> 4 } else { byte & 0x0f };
                    if nibble == 0 {
                        BgPixel { transparent: true, color: (0, 0, 0) }
                    } else {
                        BgPixel { transparent: false, color: cram.lookup(params.palette_base as usize + nibble as usize) }
                    }
                }
                ColorFormat::Palette256 => {
                    let index = vram[addr] as usize;
                    if index == 0 {
                        BgPixel { transparent: true, color: (0, 0, 0) }
                    } else {
                        BgPixel { transparent: false, color: cram.lookup(params.palette_base as usize + index) }
                    }
                }
                ColorFormat::Palette2048 => {
                    let index = read_u16(vram, addr as u32) as usize & 0x7ff;
                    if index == 0 {
                        BgPixel { transparent: true, color: (0, 0, 0) }
                    } else {
                        BgPixel { transparent: false, color: cram.lookup(params.palette_base as usize + index) }
                    }
                }
                ColorFormat::Rgb555 => {
                    let word = read_u16(vram, addr as u32);
                    if word & 0x8000 == 0 {
                        BgPixel { transparent: true, color: (0, 0, 0) }
                    } else {
                        let expand = |c: u16| (((c & 0x1f) as u8) << 3) | ((c & 0x1f) as u8 >> 2);
                        BgPixel { transparent: false, color: (expand(word), expand(word >> 5), expand(word >> 10)) }
                    }
                }
                ColorFormat::Rgb888 => {
                    let alpha = vram[addr];
                    if alpha == 0 {
                        BgPixel { transparent: true, color: (0, 0, 0) }
                    } else {
                        BgPixel {
                            transparent: false,
                            color: (vram[(addr + 1) % vram.len()], vram[(addr + 2) % vram.len()], vram[(addr + 3) % vram.len()]),
                        }
                    }
                }
            }
        })
        .collect()
}

/// Dispatches to the cell or bitmap fetcher per `params.bitmap_mode`.
pub fn fetch_line(vram: &[u8], cram: &mut Cram, params: &BgParams, y: i32, width: u32) -> Vec<BgPixel> {
    if params.bitmap_mode {
        fetch_bitmap_line(vram, cram, params, y, width)
    } else {
        fetch_cell_line(vram, cram, params, y, width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::vdp2::registers::ColorFormat;

    #[test]
    fn palette256_cell_zero_index_is_transparent() {
        let vram = vec![0u8; 512 * 1024];
        let mut cram = Cram::new();
        let params = BgParams {
            color_format: ColorFormat::Palette256,
            ..Default::default()
        };
        let line = fetch_cell_line(&vram, &mut cram, &params, 0, 8);
        assert!(line.iter().all(|p| p.transparent));
    }

    #[test]
    fn bitmap_wraps_at_configured_size() {
        let mut vram = vec![0u8; 512 * 1024];
        vram[0] = 0xff; // non-zero alpha => opaque for Rgb888 at (0,0)
        vram[1] = 0x10;
        vram[2] = 0x20;
        vram[3] = 0x30;
        let mut cram = Cram::new();
        let params = BgParams {
            color_format: ColorFormat::Rgb888,
            bitmap_mode: true,
            bitmap_width: 4,
            bitmap_height: 4,
            ..Default::default()
        };
        let line = fetch_bitmap_line(&vram, &mut cram, &params, 4, 1);
        assert_eq!(line[0].color, (0x10, 0x20, 0x30));
    }
}
