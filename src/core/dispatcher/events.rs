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

//! The event stream carried across the emulator-thread/render-thread
//! queue. Every mutation the render thread's mirror
//! state needs is expressed as one variant, issued in program order so
//! the render thread can replay them without seeing authoritative state
//! directly.

use crate::core::vdp2::registers::{BgParams, ColorOffsetTable, RotationParams, WindowParams};
use crate::core::vdp2::sprite::SpriteType;

/// A full register latch, sent wholesale rather than as per-field
/// deltas: VDP2's register writes are cheap to clone and land far less
/// often than VRAM/CRAM pokes, so snapshotting the whole set on any
/// change is simpler than threading individual register events.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RegisterSnapshot {
    pub bg_params: [BgParams; 6],
    pub rotation_params: [RotationParams; 2],
    pub window_params: WindowParams,
    pub color_offset_table: ColorOffsetTable,
    pub back_color: (u8, u8, u8),
    pub line_color: Option<(u8, u8, u8)>,
    pub sprite_type: SpriteType,
    pub sprite_palette_base: u16,
}

/// A full CRAM re-sync, used after a save-state load: the render
/// thread's mirror replaces its colour memory outright rather than
/// replaying every write since the last checkpoint.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CramSnapshot {
    pub raw: Vec<u8>,
    pub mode: crate::core::vdp2::cram::CramMode,
}

/// Everything a render worker's mirror state needs to be restored to
/// after a save-state load, bundled into one barrier event rather than
/// a burst of individual writes.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Vdp2Snapshot {
    pub vram: Vec<u8>,
    pub cram: CramSnapshot,
    pub registers: RegisterSnapshot,
    pub deinterlace: bool,
}

/// One entry in the render queue.
#[derive(Debug, Clone)]
pub enum RenderEvent {
    /// A single VRAM2 byte write, applied to the mirror before any
    /// later-queued line render observes it.
    Vram2Write { offset: u32, value: u8 },
    /// A single CRAM byte write.
    CramWrite { offset: u32, value: u8 },
    /// CRAM addressing mode changed.
    CramMode(crate::core::vdp2::cram::CramMode),
    /// A full register latch replacing the mirror's current one.
    Registers(RegisterSnapshot),
    /// Emulator-internal deinterlacing was toggled.
    SetDeinterlace(bool),
    /// Render scanline `line` of the current field. `sprite_line`
    /// carries the VDP1-decoded texel row already read out of the
    /// displayed framebuffer by the emulator thread — VDP1 command
    /// processing stays on the emulator thread (unless
    /// `includeVDP1InRenderThread` is set, in which case VDP1 itself
    /// runs inside the render worker and this field is unused), so
    /// shipping the row is simpler than mirroring all of VRAM1.
    LineRender { line: u16, sprite_line: Vec<u16> },
    /// VBlank-out transition: the render thread finishes the frame and
    /// raises `renderFinished` once this event drains. VBlank-in and
    /// HBlank changes don't touch mirror state, so the emulator-thread
    /// sink delivers those to the host callbacks directly instead of
    /// routing them through the queue.
    VblankOut,
    /// Barrier: once processed, the render thread raises
    /// `preSaveSync`, signalling the emulator thread that its mirror
    /// state reflects every event issued before this one.
    PreSaveSync,
    /// Barrier carrying a full re-sync snapshot after a save-state
    /// load; the render thread applies it and raises `postLoadSync`.
    PostLoadSync(Box<Vdp2Snapshot>),
    /// Barrier: once processed, the render thread copies its mirror
    /// state into the shared capture slot and raises `captureDone`, so
    /// the emulator thread can read it back out for a save state.
    CaptureSnapshot,
    /// Worker shutdown sentinel.
    Shutdown,
}
