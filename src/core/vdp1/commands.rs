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

//! Command-list decode and the per-frame command walk.
//!
//! Each command is a 32-byte record in VRAM1. `CMDCTRL`'s high bits
//! select how the list continues after this command (jump/skip
//! modes); its low bits select what the command draws. The walk
//! spends a cycle budget per call so it can be driven once per
//! scanline without ever running unbounded within a single tick.

use crate::core::bus::VideoCallbacks;

use super::render::{blend, decode_pixel, ColorMode, PixelSample, QuadStepper, TextureStepper};
use super::render::quad::Quad;
use super::render::line::LineStepper;
use super::{Rect, Vdp1, FB_WIDTH, FRAME_CYCLE_BUDGET};

const COMMAND_SIZE: u32 = 0x20;

/// How the command list continues once this command has been acted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpMode {
    /// Proceed to the next 32-byte record.
    Next,
    /// Jump to the word address in `CMDLINK`.
    Assign,
    /// Push the next record's address and jump to `CMDLINK`.
    Call,
    /// Pop the address pushed by the last `Call`.
    Return,
}

/// What a command instructs VDP1 to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandType {
    DrawNormalSprite,
    DrawScaledSprite,
    DrawDistortedSprite,
    DrawPolygon,
    DrawPolylines,
    DrawLine,
    SetUserClipping,
    SetSystemClipping,
    SetLocalCoordinates,
    /// An unrecognised or explicit end command; ends the frame.
    End,
}

/// The 2-bit clip mode carried in `CMDPMOD` of draw commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClipMode {
    #[default]
    None,
    /// Pixels outside the user clip rectangle are not drawn.
    Clip,
    /// Pixels *inside* the user clip rectangle are not drawn.
    ClipInverted,
}

/// A decoded 32-byte command record.
#[derive(Debug, Clone, Copy)]
pub struct CommandRecord {
    pub jump_mode: JumpMode,
    pub skip: bool,
    pub command_type: CommandType,
    pub pmod: u16,
    pub colr: u16,
    pub srca: u16,
    pub size: u16,
    pub link: u16,
    pub grda: u16,
    pub vertices: [(i32, i32); 4],
}

impl CommandRecord {
    /// Parses a command record from a 32-byte window of VRAM1.
    pub fn parse(bytes: &[u8]) -> Self {
        let word = |offset: usize| -> u16 {
            ((bytes.get(offset).copied().unwrap_or(0) as u16) << 8)
                | bytes.get(offset + 1).copied().unwrap_or(0) as u16
        };
        let signed = |offset: usize| -> i32 { word(offset) as i16 as i32 };

        let ctrl = word(0x00);
        let jump_select = (ctrl >> 13) & 0x7;
        let (jump_mode, skip) = match jump_select {
            0b000 => (JumpMode::Next, false),
            0b001 => (JumpMode::Assign, false),
            0b010 => (JumpMode::Call, false),
            0b011 => (JumpMode::Return, false),
            0b100 => (JumpMode::Next, true),
            0b101 => (JumpMode::Assign, true),
            0b110 => (JumpMode::Call, true),
            _ => (JumpMode::Return, true),
        };

        let command_type = match ctrl & 0x000f {
            0x0 => CommandType::DrawNormalSprite,
            0x1 => CommandType::DrawScaledSprite,
            0x2 => CommandType::DrawDistortedSprite,
            0x4 => CommandType::DrawPolygon,
            0x5 => CommandType::DrawPolylines,
            0x6 => CommandType::DrawLine,
            0x8 => CommandType::SetUserClipping,
            0x9 => CommandType::SetSystemClipping,
            0xa => CommandType::SetLocalCoordinates,
            _ => CommandType::End,
        };

        Self {
            jump_mode,
            skip,
            command_type,
            pmod: word(0x04),
            colr: word(0x06),
            srca: word(0x08),
            size: word(0x0a),
            link: word(0x02),
            grda: word(0x1c),
            vertices: [
                (signed(0x0c), signed(0x0e)),
                (signed(0x10), signed(0x12)),
                (signed(0x14), signed(0x16)),
                (signed(0x18), signed(0x1a)),
            ],
        }
    }

    fn color_mode(&self) -> ColorMode {
        match (self.pmod >> 3) & 0x7 {
            0 => ColorMode::Banked4Bpp,
            1 => ColorMode::Lookup4Bpp,
            2 => ColorMode::Bank8Bpp64,
            3 => ColorMode::Bank8Bpp128,
            4 => ColorMode::Bank8Bpp256,
            _ => ColorMode::Rgb16Bpp,
        }
    }

    fn clip_mode(&self) -> ClipMode {
        match (self.pmod >> 6) & 0x3 {
            1 => ClipMode::Clip,
            2 => ClipMode::ClipInverted,
            _ => ClipMode::None,
        }
    }

    fn texture_width(&self) -> u32 {
        (((self.size >> 8) & 0x3f) as u32 * 8).max(1)
    }

    fn texture_height(&self) -> u32 {
        (self.size & 0xff) as u32
    }

    /// Rough line-length proxy cycle cost, per the open-question
    /// decision recorded for this core: the longest edge of the shape
    /// plus a fixed per-command overhead.
    fn cycle_cost(&self) -> u32 {
        let span = |a: (i32, i32), b: (i32, i32)| {
            ((a.0 - b.0).unsigned_abs()).max((a.1 - b.1).unsigned_abs())
        };
        let longest = match self.command_type {
            CommandType::DrawLine => span(self.vertices[0], self.vertices[1]),
            CommandType::DrawPolygon
            | CommandType::DrawDistortedSprite
            | CommandType::DrawScaledSprite
            | CommandType::DrawNormalSprite
            | CommandType::DrawPolylines => span(self.vertices[0], self.vertices[3])
                .max(span(self.vertices[1], self.vertices[2])),
            _ => 0,
        };
        longest + 16
    }
}

fn in_clip(x: i32, y: i32, mode: ClipMode, clip: &Rect) -> bool {
    match mode {
        ClipMode::None => true,
        ClipMode::Clip => clip.contains(x, y),
        ClipMode::ClipInverted => !clip.contains(x, y),
    }
}

fn plot(vdp1: &mut Vdp1, x: i32, y: i32, rgb555: u16, control: super::render::color::SpecialColorControl, mesh: bool) {
    if x < 0 || y < 0 || x as usize >= FB_WIDTH {
        return;
    }
    let mesh_on = mesh && (x + y) % 2 == 0;
    let mesh_overlay = vdp1.mesh_overlay_for_draw();
    let idx = match (y as usize).checked_mul(FB_WIDTH).and_then(|v| v.checked_add(x as usize)) {
        Some(idx) if idx < mesh_overlay.len() => idx,
        _ => return,
    };
    if mesh_on {
        mesh_overlay[idx] = 1;
        return;
    }
    let fb = vdp1.draw_framebuffer_mut();
    if let Some(existing) = fb.get(idx).copied() {
        fb[idx] = blend(existing, rgb555, control);
    }
}

fn palette_for(vdp1: &Vdp1, colr: u16) -> Vec<u16> {
    // Colour bank entries are read directly out of VRAM1 as RGB555
    // words, 256 entries starting at the bank selected by CMDCOLR.
    let base = (colr as u32) * 2 * 256;
    (0..256)
        .map(|i| vdp1.read_vram_u16(base + i * 2))
        .collect()
}

fn texture_bytes(vdp1: &Vdp1, srca: u16, len: usize) -> Vec<u8> {
    let base = (srca as u32) * 8;
    (0..len)
        .map(|i| vdp1.vram()[((base as usize) + i) % vdp1.vram().len()])
        .collect()
}

fn draw_line(vdp1: &mut Vdp1, cmd: &CommandRecord) {
    let (x0, y0) = cmd.vertices[0];
    let (x1, y1) = cmd.vertices[1];
    let clip = cmd.clip_mode();
    let rect = vdp1.ctx.user_clip;
    if LineStepper::system_clip_reject(x0, y0, x1, y1, &vdp1.ctx.system_clip) {
        return;
    }
    let color = cmd.colr & 0x7fff;
    let mut stepper = LineStepper::new(x0, y0, x1, y1);
    let mut i = 0;
    while let Some(step) = stepper.next(false, i) {
        if in_clip(step.x, step.y, clip, &rect) {
            plot(vdp1, step.x, step.y, color, Default::default(), false);
        }
        i += 1;
    }
}

fn draw_quad(vdp1: &mut Vdp1, cmd: &CommandRecord, textured: bool) {
    let clip = cmd.clip_mode();
    let rect = vdp1.ctx.user_clip;
    let quad = Quad {
        a: cmd.vertices[0],
        b: cmd.vertices[1],
        c: cmd.vertices[2],
        d: cmd.vertices[3],
    };
    let mesh = (cmd.pmod >> 8) & 1 != 0;
    let mode = cmd.color_mode();
    let tex_w = if textured { cmd.texture_width() } else { 1 };
    let tex_h = if textured { cmd.texture_height() } else { 1 };
    let plain_color = cmd.colr & 0x7fff;
    let palette = if textured { palette_for(vdp1, cmd.colr) } else { Vec::new() };
    let tex_data = if textured {
        texture_bytes(vdp1, cmd.srca, tex_w as usize * tex_h as usize * 2)
    } else {
        Vec::new()
    };

    let mut stepper = QuadStepper::new(quad, tex_w, [(255, 255, 255); 4]);
    let mut row: u32 = 0;
    while let Some(span) = stepper.next_span() {
        let (x0, x1) = if span.x0 <= span.x1 { (span.x0, span.x1) } else { (span.x1, span.x0) };
        if textured {
            let span_width = ((x1 - x0) + 1).max(1) as u32;
            let mut tex_stepper = TextureStepper::new(tex_w, span_width);
            let mut px = x0;
            while let Some(u) = tex_stepper.next_texel() {
                if in_clip(px, span.y, clip, &rect) {
                    let row_clamped = row.min(tex_h.saturating_sub(1));
                    let texel_index = (row_clamped * tex_w + u) as usize;
                    let sample = decode_pixel(mode, &tex_data, texel_index, &palette);
                    if let PixelSample::Opaque { rgb555, control } = sample {
                        plot(vdp1, px, span.y, rgb555, control, mesh);
                    }
                }
                px += 1;
            }
        } else {
            for px in x0..=x1 {
                if in_clip(px, span.y, clip, &rect) {
                    plot(vdp1, px, span.y, plain_color, Default::default(), mesh);
                }
            }
        }
        row += 1;
    }
}

fn execute(vdp1: &mut Vdp1, cmd: &CommandRecord) {
    if cmd.skip {
        return;
    }
    match cmd.command_type {
        CommandType::DrawLine => draw_line(vdp1, cmd),
        CommandType::DrawPolygon => draw_quad(vdp1, cmd, false),
        CommandType::DrawPolylines => {
            let edges = [(0, 1), (1, 2), (2, 3), (3, 0)];
            for (a, b) in edges {
                let mut synthetic = *cmd;
                synthetic.vertices[0] = cmd.vertices[a];
                synthetic.vertices[1] = cmd.vertices[b];
                draw_line(vdp1, &synthetic);
            }
        }
        CommandType::DrawNormalSprite | CommandType::DrawScaledSprite | CommandType::DrawDistortedSprite => {
            draw_quad(vdp1, cmd, true)
        }
        CommandType::SetUserClipping => {
            vdp1.ctx.user_clip = Rect {
                x0: cmd.vertices[0].0,
                y0: cmd.vertices[0].1,
                x1: cmd.vertices[2].0,
                y1: cmd.vertices[2].1,
            };
        }
        CommandType::SetSystemClipping => {
            vdp1.ctx.system_clip = Rect {
                x0: 0,
                y0: 0,
                x1: cmd.vertices[2].0,
                y1: cmd.vertices[2].1,
            };
        }
        CommandType::SetLocalCoordinates => {
            vdp1.ctx.local_coord = cmd.vertices[0];
        }
        CommandType::End => {}
    }
}

/// Advances the command walk by up to `cycle_budget` cycles, resuming
/// from wherever the last call left off. Returns `true` once the
/// frame has ended (an `End` command was reached or the jump-to-zero
/// rule fired).
pub fn advance(vdp1: &mut Vdp1, callbacks: &mut dyn VideoCallbacks, cycle_budget: u32) -> bool {
    if vdp1.ctx.frame_ended {
        return true;
    }

    let mut spent_this_call = 0u32;
    loop {
        if vdp1.ctx.cycles_spent >= FRAME_CYCLE_BUDGET {
            vdp1.ctx.frame_ended = true;
            callbacks.trigger_sprite_draw_end();
            return true;
        }
        if spent_this_call >= cycle_budget {
            return false;
        }

        let addr = vdp1.ctx.command_address;
        let bytes = (0..COMMAND_SIZE)
            .map(|i| vdp1.vram()[((addr + i) as usize) % vdp1.vram().len()])
            .collect::<Vec<u8>>();
        let cmd = CommandRecord::parse(&bytes);

        if matches!(cmd.command_type, CommandType::End) {
            vdp1.ctx.frame_ended = true;
            callbacks.trigger_sprite_draw_end();
            return true;
        }

        execute(vdp1, &cmd);
        let cost = cmd.cycle_cost();
        vdp1.ctx.cycles_spent += cost;
        spent_this_call += cost;

        let next_addr = match cmd.jump_mode {
            JumpMode::Next => addr + COMMAND_SIZE,
            JumpMode::Assign => (cmd.link as u32) * COMMAND_SIZE,
            JumpMode::Call => {
                vdp1.ctx.return_address = Some(addr + COMMAND_SIZE);
                (cmd.link as u32) * COMMAND_SIZE
            }
            JumpMode::Return => vdp1.ctx.return_address.take().unwrap_or(addr + COMMAND_SIZE),
        };

        // A jump back to address zero with no return address pushed
        // is treated as an immediate end-of-frame signal.
        if next_addr == 0 && matches!(cmd.jump_mode, JumpMode::Assign) {
            vdp1.ctx.frame_ended = true;
            callbacks.trigger_sprite_draw_end();
            return true;
        }

        vdp1.ctx.command_address = next_addr;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_end() -> [u8; 32] {
        let mut rec = [0u8; 32];
        rec[0] = 0xff;
        rec[1] = 0xff;
        rec
    }

    fn encode_line(x0: i16, y0: i16, x1: i16, y1: i16, color: u16) -> [u8; 32] {
        let mut rec = [0u8; 32];
        rec[0..2].copy_from_slice(&0x0006u16.to_be_bytes());
        rec[6..8].copy_from_slice(&color.to_be_bytes());
        rec[0x0c..0x0e].copy_from_slice(&x0.to_be_bytes());
        rec[0x0e..0x10].copy_from_slice(&y0.to_be_bytes());
        rec[0x10..0x12].copy_from_slice(&x1.to_be_bytes());
        rec[0x12..0x14].copy_from_slice(&y1.to_be_bytes());
        rec
    }

    #[test]
    fn parses_end_command() {
        let rec = CommandRecord::parse(&encode_end());
        assert_eq!(rec.command_type, CommandType::End);
    }

    #[test]
    fn parses_draw_line_with_vertices() {
        let rec = CommandRecord::parse(&encode_line(1, 2, 3, 4, 0x7fff));
        assert_eq!(rec.command_type, CommandType::DrawLine);
        assert_eq!(rec.vertices[0], (1, 2));
        assert_eq!(rec.vertices[1], (3, 4));
    }

    #[test]
    fn single_end_command_ends_frame_immediately() {
        let mut vdp1 = Vdp1::new();
        vdp1.vram_mut()[0..32].copy_from_slice(&encode_end());
        let ended = advance(&mut vdp1, &mut (), 1000);
        assert!(ended);
        assert!(vdp1.ctx.frame_ended);
    }

    #[test]
    fn draw_line_plots_pixels_then_hits_end() {
        let mut vdp1 = Vdp1::new();
        vdp1.vram_mut()[0..32].copy_from_slice(&encode_line(0, 0, 3, 0, 0x7fff));
        vdp1.vram_mut()[32..64].copy_from_slice(&encode_end());
        let ended = advance(&mut vdp1, &mut (), 1000);
        assert!(ended);
        assert_eq!(vdp1.draw_framebuffer()[0], 0x7fff);
        assert_eq!(vdp1.draw_framebuffer()[3], 0x7fff);
    }

    #[test]
    fn cycle_budget_splits_walk_across_calls() {
        let mut vdp1 = Vdp1::new();
        vdp1.vram_mut()[0..32].copy_from_slice(&encode_line(0, 0, 1, 0, 0x7fff));
        vdp1.vram_mut()[32..64].copy_from_slice(&encode_end());
        let ended_first = advance(&mut vdp1, &mut (), 0);
        assert!(!ended_first);
        assert!(!vdp1.ctx.frame_ended);
        let ended_second = advance(&mut vdp1, &mut (), 1000);
        assert!(ended_second);
    }
}
