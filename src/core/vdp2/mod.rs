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

//! VDP2 Line Compositor.
//!
//! Per scanline: latches line-colour/back-colour and rotation
//! parameters, computes window masks, decodes the sprite layer out of
//! the *displayed* VDP1 framebuffer, fetches NBG0..NBG3/RBG0/RBG1,
//! composites the topmost three layers and writes one scanline of
//! RGB888 into the output framebuffer.
//!
//! # Module layout
//!
//! - [`registers`] — BG/rotation/window/colour-offset register state.
//! - [`cram`] — colour look-up memory and its RGB888 cache.
//! - [`sprite`] — VDP1 framebuffer → sprite-layer pixel decode.
//! - [`background`] — cell/bitmap fetch for NBG/RBG layers.
//! - [`compose`] — the per-pixel blending pipeline.

pub mod background;
pub mod compose;
pub mod cram;
pub mod registers;
pub mod sprite;

use crate::core::bus::VideoCallbacks;
use crate::core::raster::RasterSink;
use crate::core::vdp1::Vdp1;

use compose::{compose_pixel, CompositeInput};
use cram::Cram;
use registers::{BgParams, ColorOffsetTable, RotationParams, WindowParams};
use sprite::{decode_sprite_pixel, SpriteType};

pub const VRAM2_SIZE: usize = 512 * 1024;
pub const SCREEN_WIDTH: u32 = 320;
pub const SCREEN_HEIGHT: u32 = 224;

/// VDP2 state: VRAM2, CRAM, registers, and the output framebuffer.
pub struct Vdp2 {
    vram: Vec<u8>,
    cram: Cram,
    pub bg_params: [BgParams; 6],
    pub rotation_params: [RotationParams; 2],
    pub window_params: WindowParams,
    pub color_offset_table: ColorOffsetTable,
    pub back_color: (u8, u8, u8),
    pub line_color: Option<(u8, u8, u8)>,
    pub sprite_type: SpriteType,
    pub sprite_palette_base: u16,
    /// RGB888 output, one `u32` (0x00RRGGBB with alpha forced to 0xFF
    /// in the high byte) per pixel, `SCREEN_WIDTH * SCREEN_HEIGHT`
    /// entries for progressive/non-deinterlaced output, doubled when
    /// deinterlacing writes both field lines.
    framebuffer: Vec<u32>,
    deinterlace: bool,
}

impl Vdp2 {
    pub fn new() -> Self {
        Self {
            vram: vec![0u8; VRAM2_SIZE],
            cram: Cram::new(),
            bg_params: [BgParams::default(); 6],
            rotation_params: [RotationParams::default(); 2],
            window_params: WindowParams::default(),
            color_offset_table: ColorOffsetTable::default(),
            back_color: (0, 0, 0),
            line_color: None,
            sprite_type: SpriteType(0),
            sprite_palette_base: 0,
            framebuffer: vec![0xff00_0000u32; (SCREEN_WIDTH * SCREEN_HEIGHT) as usize],
            deinterlace: false,
        }
    }

    pub fn hard_reset(&mut self) {
        self.vram.iter_mut().for_each(|b| *b = 0);
        self.cram.reset();
        self.soft_reset();
    }

    pub fn soft_reset(&mut self) {
        self.bg_params = [BgParams::default(); 6];
        self.rotation_params = [RotationParams::default(); 2];
        self.window_params = WindowParams::default();
        self.color_offset_table = ColorOffsetTable::default();
        self.back_color = (0, 0, 0);
        self.line_color = None;
        self.framebuffer.iter_mut().for_each(|p| *p = 0xff00_0000);
    }

    pub fn vram(&self) -> &[u8] {
        &self.vram
    }
    pub fn vram_mut(&mut self) -> &mut [u8] {
        &mut self.vram
    }
    pub fn cram(&self) -> &Cram {
        &self.cram
    }
    pub fn cram_mut(&mut self) -> &mut Cram {
        &mut self.cram
    }
    pub fn framebuffer(&self) -> &[u32] {
        &self.framebuffer
    }

    /// Enables emulator-internal deinterlacing, which doubles the
    /// output framebuffer so both field lines are written per source
    /// scanline.
    pub fn set_deinterlace(&mut self, enabled: bool) {
        self.deinterlace = enabled;
        let rows = if enabled { SCREEN_HEIGHT * 2 } else { SCREEN_HEIGHT };
        self.framebuffer = vec![0xff00_0000u32; (SCREEN_WIDTH * rows) as usize];
    }

    pub fn deinterlace(&self) -> bool {
        self.deinterlace
    }

    /// Renders one scanline of output from the configured layers and
    /// the given sprite-layer source pixels (already read out of the
    /// displayed VDP1 framebuffer at this scanline), writing the
    /// result into the output framebuffer at the row(s) selected by
    /// the deinterlacing mode.
    pub fn render_line(&mut self, y: u16, sprite_line: &[u16]) {
        let width = SCREEN_WIDTH;
        let y = y as i32;

        let sprite_pixels: Vec<sprite::SpritePixel> = sprite_line
            .iter()
            .map(|&texel| decode_sprite_pixel(self.sprite_type, texel, &mut self.cram, self.sprite_palette_base))
            .collect();
        let sprite_window_hits: Vec<bool> = sprite_pixels.iter().map(|p| p.window_hit).collect();

        let sprite_mask = self
            .window_params
            .compute_mask(0, y, width, Some(&sprite_window_hits));

        let mut bg_lines: Vec<Vec<background::BgPixel>> = Vec::with_capacity(6);
        let mut bg_masks: Vec<Vec<bool>> = Vec::with_capacity(6);
        for (i, params) in self.bg_params.iter().enumerate() {
            if params.enabled {
                bg_lines.push(background::fetch_line(&self.vram, &mut self.cram, params, y, width));
                bg_masks.push(self.window_params.compute_mask(i + 1, y, width, Some(&sprite_window_hits)));
            } else {
                bg_lines.push(Vec::new());
                bg_masks.push(Vec::new());
            }
        }

        // Emulator-internal deinterlacing writes both field lines per
        // source scanline; otherwise the scanline lands directly on
        // its progressive row.
        let row_indices: Vec<usize> = if self.deinterlace {
            vec![(y as usize) * 2, (y as usize) * 2 + 1]
        } else {
            vec![y as usize]
        };

        for x in 0..width as usize {
            let mut candidates: Vec<CompositeInput> = Vec::with_capacity(7);

            if sprite_mask.get(x).copied().unwrap_or(true) {
                let sp = sprite_pixels[x];
                if !sp.transparent {
                    candidates.push(CompositeInput {
                        index: 0,
                        priority: sp.priority,
                        transparent: false,
                        color: sp.color,
                        color_calc_enabled: sp.color_calc_ratio > 0,
                        color_calc_mode: registers::ColorCalcMode::RatioBlend,
                        color_calc_ratio: sp.color_calc_ratio,
                        shadow_receiving: false,
                    });
                }
            }

            for (i, params) in self.bg_params.iter().enumerate() {
                if !params.enabled {
                    continue;
                }
                let mask_pass = bg_masks[i].get(x).copied().unwrap_or(true);
                let pixel = &bg_lines[i][x];
                if mask_pass && !pixel.transparent {
                    candidates.push(CompositeInput {
                        index: i as u8 + 1,
                        priority: params.priority,
                        transparent: false,
                        color: pixel.color,
                        color_calc_enabled: params.color_calc_enabled,
                        color_calc_mode: params.color_calc_mode,
                        color_calc_ratio: params.color_calc_ratio,
                        shadow_receiving: params.shadow_receiving,
                    });
                }
            }

            let shadow_active = sprite_pixels[x].is_shadow && sprite_mask.get(x).copied().unwrap_or(true);
            let composed = compose_pixel(&candidates, shadow_active, self.line_color, self.back_color);
            let (r, g, b) = self.color_offset_table.entries[0].apply(composed);
            let packed = 0xff00_0000u32 | ((r as u32) << 16) | ((g as u32) << 8) | b as u32;

            for &row in &row_indices {
                let idx = row * width as usize + x;
                if let Some(slot) = self.framebuffer.get_mut(idx) {
                    *slot = packed;
                }
            }
        }
    }

    pub fn frame_complete(&self, callbacks: &mut dyn VideoCallbacks) {
        callbacks.frame_complete(&self.framebuffer, SCREEN_WIDTH, SCREEN_HEIGHT);
    }

    /// Captures VRAM2, CRAM and every register bank for a save state
    ///. The output framebuffer is a derived render
    /// artifact regenerated by the next `render_line`/`frame_complete`
    /// call, so it isn't part of the saved state.
    pub fn save_state(&self) -> Vdp2State {
        Vdp2State {
            vram: self.vram.clone(),
            cram: self.cram.save_state(),
            bg_params: self.bg_params,
            rotation_params: self.rotation_params,
            window_params: self.window_params.clone(),
            color_offset_table: self.color_offset_table.clone(),
            back_color: self.back_color,
            line_color: self.line_color,
            sprite_type: self.sprite_type,
            sprite_palette_base: self.sprite_palette_base,
            deinterlace: self.deinterlace,
        }
    }

    /// VDP2 has no embedded ROM, so validation only range-checks VRAM2
    /// rather than hashing anything.
    pub fn validate_state(&self, state: &Vdp2State, _skip_rom_checks: bool) -> crate::core::error::Result<()> {
        if state.vram.len() != VRAM2_SIZE {
            return Err(crate::core::error::SaveStateError::RangeCheck(format!(
                "VDP2 VRAM size mismatch: expected {}, got {}",
                VRAM2_SIZE,
                state.vram.len()
            ))
            .into());
        }
        if state.cram.raw.len() != cram::CRAM_SIZE {
            return Err(crate::core::error::SaveStateError::RangeCheck(format!(
                "VDP2 CRAM size mismatch: expected {}, got {}",
                cram::CRAM_SIZE,
                state.cram.raw.len()
            ))
            .into());
        }
        Ok(())
    }

    pub fn load_state(&mut self, state: &Vdp2State) {
        self.vram = state.vram.clone();
        self.cram.load_state(&state.cram);
        self.bg_params = state.bg_params;
        self.rotation_params = state.rotation_params;
        self.window_params = state.window_params.clone();
        self.color_offset_table = state.color_offset_table.clone();
        self.back_color = state.back_color;
        self.line_color = state.line_color;
        self.sprite_type = state.sprite_type;
        self.sprite_palette_base = state.sprite_palette_base;
        self.set_deinterlace(state.deinterlace);
    }
}

impl Default for Vdp2 {
    fn default() -> Self {
        Self::new()
    }
}

/// Saveable snapshot of [`Vdp2`].
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Vdp2State {
    pub vram: Vec<u8>,
    pub cram: cram::CramState,
    pub bg_params: [BgParams; 6],
    pub rotation_params: [RotationParams; 2],
    pub window_params: WindowParams,
    pub color_offset_table: ColorOffsetTable,
    pub back_color: (u8, u8, u8),
    pub line_color: Option<(u8, u8, u8)>,
    pub sprite_type: SpriteType,
    pub sprite_palette_base: u16,
    pub deinterlace: bool,
}

/// Adapts a [`Vdp2`] plus the owning [`Vdp1`] and callback surface
/// into a [`RasterSink`], so the raster driver can dispatch per-line
/// renders without either video component needing to know about the
/// other's lifetime.
pub struct Vdp2Sink<'a, C: VideoCallbacks> {
    pub vdp2: &'a mut Vdp2,
    pub vdp1: &'a Vdp1,
    pub callbacks: &'a mut C,
    pub use_mirror: bool,
}

impl<'a, C: VideoCallbacks> RasterSink for Vdp2Sink<'a, C> {
    fn dispatch_line_render(&mut self, line: u16) {
        let width = crate::core::vdp1::FB_WIDTH;
        let base = line as usize * width;
        let sprite_line: Vec<u16> = if self.use_mirror {
            (0..width.min(SCREEN_WIDTH as usize))
                .map(|x| self.vdp1.displayed_pixel(x as i32, line as i32, true).unwrap_or(0))
                .collect()
        } else {
            self.vdp1
                .displayed_framebuffer()
                .get(base..base + width.min(SCREEN_WIDTH as usize))
                .map(|s| s.to_vec())
                .unwrap_or_default()
        };
        self.vdp2.render_line(line, &sprite_line);
    }

    fn on_vblank_in(&mut self, _field_parity: u8) {
        self.callbacks.vblank_state_change(true);
        self.callbacks.trigger_optimized_intback_read();
    }

    fn on_vblank_out(&mut self) {
        self.callbacks.vblank_state_change(false);
        self.vdp2.frame_complete(self.callbacks);
    }

    fn on_hblank_change(&mut self, hblank: bool, vblank: bool) {
        self.callbacks.hblank_state_change(hblank, vblank);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backdrop_only_frame_yields_back_color_everywhere() {
        let mut vdp2 = Vdp2::new();
        vdp2.back_color = (0, 0, 255);
        let sprite_line = vec![0u16; SCREEN_WIDTH as usize];
        vdp2.render_line(0, &sprite_line);
        let row = &vdp2.framebuffer()[0..SCREEN_WIDTH as usize];
        assert!(row.iter().all(|&p| p == 0xff0000ff));
    }

    #[test]
    fn hard_reset_clears_vram_and_cram() {
        let mut vdp2 = Vdp2::new();
        vdp2.vram_mut()[0] = 0xAB;
        vdp2.cram_mut().write_u8(0, 0xCD);
        vdp2.hard_reset();
        assert_eq!(vdp2.vram()[0], 0);
        assert_eq!(vdp2.cram().read_u8(0), 0);
    }

    #[test]
    fn enabled_layer_with_opaque_pixel_overrides_backdrop() {
        let mut vdp2 = Vdp2::new();
        vdp2.back_color = (0, 0, 0);
        vdp2.bg_params[0].enabled = true;
        vdp2.bg_params[0].color_format = registers::ColorFormat::Rgb888;
        vdp2.bg_params[0].bitmap_mode = true;
        vdp2.bg_params[0].bitmap_width = 512;
        vdp2.bg_params[0].bitmap_height = 256;
        vdp2.bg_params[0].priority = 1;
        vdp2.vram_mut()[0] = 0xff;
        vdp2.vram_mut()[1] = 0x11;
        vdp2.vram_mut()[2] = 0x22;
        vdp2.vram_mut()[3] = 0x33;
        let sprite_line = vec![0u16; SCREEN_WIDTH as usize];
        vdp2.render_line(0, &sprite_line);
        assert_eq!(vdp2.framebuffer()[0], 0xff112233);
    }
}
