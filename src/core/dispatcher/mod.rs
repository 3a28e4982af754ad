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

//! Threaded render dispatcher.
//!
//! When `video.threadedVDP` is enabled, VDP2 compositing moves onto a
//! dedicated render thread. The emulator thread stays the sole writer
//! of authoritative VDP2 state; every mutation that thread's register
//! and VRAM2/CRAM writes would have applied directly in single-threaded
//! mode is instead pushed onto an [`events::RenderEvent`] queue in
//! program order, and a render worker applies them to its own mirror
//! [`Vdp2`] before compositing each scanline. Four rendezvous points
//! (`renderFinished`, `preSaveSync`, `postLoadSync`, plus the implicit
//! ordering the queue itself provides for everything else) keep the two
//! threads' views consistent at exactly the points the emulator thread
//! needs to observe render-thread state: frame completion and
//! save/load boundaries.
//!
//! The queue is unbounded (`crossbeam_channel::unbounded`) rather than a
//! fixed-capacity ring: a dropped or overwritten event here is a
//! correctness bug, not a recoverable condition, so there is no lossy
//! path to guard against overflow on.

pub mod events;
pub mod signal;

use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::core::bus::VideoCallbacks;
use crate::core::error::Result;
use crate::core::raster::RasterSink;
use crate::core::vdp1::{Vdp1, FB_WIDTH};
use crate::core::vdp2::{Vdp2, SCREEN_HEIGHT, SCREEN_WIDTH};

use events::{RegisterSnapshot, RenderEvent, Vdp2Snapshot};
use signal::Signal;

/// Owns the render worker thread and the channel/signal plumbing
/// feeding it. One `Dispatcher` per running system; dropping it joins
/// the worker after asking it to shut down.
pub struct Dispatcher {
    sender: Sender<RenderEvent>,
    handle: Option<JoinHandle<()>>,
    render_finished: Arc<Signal>,
    pre_save_sync: Arc<Signal>,
    post_load_sync: Arc<Signal>,
    capture_done: Arc<Signal>,
    output: Arc<Mutex<Vec<u32>>>,
    captured: Arc<Mutex<Option<Vdp2Snapshot>>>,
}

impl Dispatcher {
    /// Spawns the render worker thread.
    pub fn new() -> Result<Self> {
        let (sender, receiver) = unbounded();
        let render_finished = Arc::new(Signal::new());
        let pre_save_sync = Arc::new(Signal::new());
        let post_load_sync = Arc::new(Signal::new());
        let capture_done = Arc::new(Signal::new());
        let output = Arc::new(Mutex::new(vec![
            0xff00_0000u32;
            (SCREEN_WIDTH * SCREEN_HEIGHT) as usize
        ]));
        let captured = Arc::new(Mutex::new(None));

        let worker = Worker {
            receiver,
            render_finished: Arc::clone(&render_finished),
            pre_save_sync: Arc::clone(&pre_save_sync),
            post_load_sync: Arc::clone(&post_load_sync),
            capture_done: Arc::clone(&capture_done),
            output: Arc::clone(&output),
            captured: Arc::clone(&captured),
        };
        let handle = std::thread::Builder::new()
            .name("saturn-render".to_string())
            .spawn(move || worker.run())?;

        Ok(Self {
            sender,
            handle: Some(handle),
            render_finished,
            pre_save_sync,
            post_load_sync,
            capture_done,
            output,
            captured,
        })
    }

    /// Pushes an event onto the queue. The channel is unbounded, so
    /// this only fails if the worker thread has already terminated.
    pub fn enqueue(&self, event: RenderEvent) {
        if self.sender.send(event).is_err() {
            log::error!("render thread has exited; dropping a queued render event");
        }
    }

    /// Blocks until the worker raises `renderFinished`.
    pub fn wait_render_finished(&self) {
        self.render_finished.wait();
    }

    /// The render thread's output framebuffer, readable once
    /// [`Dispatcher::wait_render_finished`] has returned.
    pub fn output_framebuffer(&self) -> MutexGuard<'_, Vec<u32>> {
        self.output.lock().unwrap()
    }

    /// Enqueues a `PreSaveSync` barrier and blocks until the worker has
    /// drained every event issued before it, so the caller can read the
    /// render thread's mirror-derived state (i.e. the framebuffer) for
    /// serialization without a race.
    pub fn pre_save_sync(&self) {
        self.enqueue(RenderEvent::PreSaveSync);
        self.pre_save_sync.wait();
    }

    /// Enqueues a full re-sync snapshot after a save-state load and
    /// blocks until the worker has applied it.
    pub fn post_load_sync(&self, snapshot: Vdp2Snapshot) {
        self.enqueue(RenderEvent::PostLoadSync(Box::new(snapshot)));
        self.post_load_sync.wait();
    }

    /// Asks the worker to exit and joins it.
    pub fn shutdown(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.enqueue(RenderEvent::Shutdown);
            let _ = handle.join();
        }
    }

    /// Enqueues a `CaptureSnapshot` barrier and blocks until the worker
    /// has copied its mirror state into the shared slot, then takes it
    /// out.
    fn capture_snapshot(&self) -> Vdp2Snapshot {
        self.enqueue(RenderEvent::CaptureSnapshot);
        self.capture_done.wait();
        self.captured.lock().unwrap().take().expect("render worker did not populate the capture slot")
    }

    /// Drains the render queue, captures the render thread's mirror
    /// state and returns it for inclusion in a save state. Blocks
    /// until the worker is caught up.
    pub fn save_state(&self) -> Vdp2Snapshot {
        self.pre_save_sync();
        self.capture_snapshot()
    }

    /// VDP2's mirror state has no embedded ROM, so validation only
    /// range-checks the captured buffers.
    pub fn validate_state(&self, state: &Vdp2Snapshot, _skip_rom_checks: bool) -> Result<()> {
        if state.vram.len() != crate::core::vdp2::VRAM2_SIZE {
            return Err(crate::core::error::SaveStateError::RangeCheck(
                "render-thread VRAM2 mirror size mismatch".to_string(),
            )
            .into());
        }
        if state.cram.raw.len() != crate::core::vdp2::cram::CRAM_SIZE {
            return Err(crate::core::error::SaveStateError::RangeCheck(
                "render-thread CRAM mirror size mismatch".to_string(),
            )
            .into());
        }
        Ok(())
    }

    /// Re-syncs the render thread's mirror state after a save-state
    /// load and blocks until the worker has applied it.
    pub fn load_state(&self, state: Vdp2Snapshot) {
        self.post_load_sync(state);
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct Worker {
    receiver: Receiver<RenderEvent>,
    render_finished: Arc<Signal>,
    pre_save_sync: Arc<Signal>,
    post_load_sync: Arc<Signal>,
    capture_done: Arc<Signal>,
    output: Arc<Mutex<Vec<u32>>>,
    captured: Arc<Mutex<Option<Vdp2Snapshot>>>,
}

impl Worker {
    fn run(self) {
        let mut mirror = Vdp2::new();
        for event in self.receiver.iter() {
            match event {
                RenderEvent::Vram2Write { offset, value } => {
                    if let Some(slot) = mirror.vram_mut().get_mut(offset as usize) {
                        *slot = value;
                    }
                }
                RenderEvent::CramWrite { offset, value } => {
                    mirror.cram_mut().write_u8(offset as usize, value)
                }
                RenderEvent::CramMode(mode) => mirror.cram_mut().set_mode(mode),
                RenderEvent::Registers(snapshot) => apply_registers(&mut mirror, snapshot),
                RenderEvent::SetDeinterlace(enabled) => mirror.set_deinterlace(enabled),
                RenderEvent::LineRender { line, sprite_line } => {
                    mirror.render_line(line, &sprite_line)
                }
                RenderEvent::VblankOut => {
                    let mut output = self.output.lock().unwrap();
                    output.clear();
                    output.extend_from_slice(mirror.framebuffer());
                    drop(output);
                    self.render_finished.raise();
                }
                RenderEvent::PreSaveSync => self.pre_save_sync.raise(),
                RenderEvent::PostLoadSync(snapshot) => {
                    apply_snapshot(&mut mirror, *snapshot);
                    self.post_load_sync.raise();
                }
                RenderEvent::CaptureSnapshot => {
                    *self.captured.lock().unwrap() = Some(capture_snapshot(&mirror));
                    self.capture_done.raise();
                }
                RenderEvent::Shutdown => break,
            }
        }
    }
}

fn apply_registers(mirror: &mut Vdp2, snapshot: RegisterSnapshot) {
    mirror.bg_params = snapshot.bg_params;
    mirror.rotation_params = snapshot.rotation_params;
    mirror.window_params = snapshot.window_params;
    mirror.color_offset_table = snapshot.color_offset_table;
    mirror.back_color = snapshot.back_color;
    mirror.line_color = snapshot.line_color;
    mirror.sprite_type = snapshot.sprite_type;
    mirror.sprite_palette_base = snapshot.sprite_palette_base;
}

fn capture_snapshot(mirror: &Vdp2) -> Vdp2Snapshot {
    Vdp2Snapshot {
        vram: mirror.vram().to_vec(),
        cram: events::CramSnapshot {
            raw: (0..crate::core::vdp2::cram::CRAM_SIZE).map(|i| mirror.cram().read_u8(i)).collect(),
            mode: mirror.cram().mode(),
        },
        registers: RegisterSnapshot {
            bg_params: mirror.bg_params,
            rotation_params: mirror.rotation_params,
            window_params: mirror.window_params.clone(),
            color_offset_table: mirror.color_offset_table.clone(),
            back_color: mirror.back_color,
            line_color: mirror.line_color,
            sprite_type: mirror.sprite_type,
            sprite_palette_base: mirror.sprite_palette_base,
        },
        deinterlace: mirror.deinterlace(),
    }
}

fn apply_snapshot(mirror: &mut Vdp2, snapshot: Vdp2Snapshot) {
    mirror.vram_mut().copy_from_slice(&snapshot.vram);
    mirror.cram_mut().set_mode(snapshot.cram.mode);
    for (offset, byte) in snapshot.cram.raw.into_iter().enumerate() {
        mirror.cram_mut().write_u8(offset, byte);
    }
    apply_registers(mirror, snapshot.registers);
    mirror.set_deinterlace(snapshot.deinterlace);
}

/// Dual-threaded [`RasterSink`] adapter: the emulator-thread side of
/// the split. Parallels [`crate::core::vdp2::Vdp2Sink`] exactly, but
/// instead of compositing directly it enqueues the work and only
/// blocks at frame boundaries, so the raster driver's per-line timing
/// loop never waits on the render thread mid-frame.
pub struct ThreadedVdp2Sink<'a, C: VideoCallbacks> {
    pub dispatcher: &'a Dispatcher,
    pub vdp1: &'a Vdp1,
    pub callbacks: &'a mut C,
    pub use_mirror: bool,
}

impl<'a, C: VideoCallbacks> RasterSink for ThreadedVdp2Sink<'a, C> {
    fn dispatch_line_render(&mut self, line: u16) {
        let width = FB_WIDTH;
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
        self.dispatcher.enqueue(RenderEvent::LineRender { line, sprite_line });
    }

    fn on_vblank_in(&mut self, _field_parity: u8) {
        self.callbacks.vblank_state_change(true);
        self.callbacks.trigger_optimized_intback_read();
    }

    fn on_vblank_out(&mut self) {
        self.dispatcher.enqueue(RenderEvent::VblankOut);
        self.dispatcher.wait_render_finished();
        self.callbacks.vblank_state_change(false);
        let framebuffer = self.dispatcher.output_framebuffer();
        self.callbacks.frame_complete(&framebuffer, SCREEN_WIDTH, SCREEN_HEIGHT);
    }

    fn on_hblank_change(&mut self, hblank: bool, vblank: bool) {
        self.callbacks.hblank_state_change(hblank, vblank);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::vdp2::cram::CramMode;

    struct RecordingCallbacks {
        frames: usize,
        last_pixel: u32,
    }
    impl VideoCallbacks for RecordingCallbacks {
        fn frame_complete(&mut self, pixels: &[u32], _width: u32, _height: u32) {
            self.frames += 1;
            self.last_pixel = pixels[0];
        }
    }

    #[test]
    fn save_state_captures_a_pending_vram_write() {
        let dispatcher = Dispatcher::new().unwrap();
        dispatcher.enqueue(RenderEvent::Vram2Write { offset: 0, value: 0xab });
        let snapshot = dispatcher.save_state();
        assert_eq!(snapshot.vram[0], 0xab);
        dispatcher.load_state(snapshot);
    }

    #[test]
    fn vram_write_then_line_render_round_trips_through_the_worker() {
        let dispatcher = Dispatcher::new().unwrap();
        dispatcher.enqueue(RenderEvent::Vram2Write { offset: 0, value: 0xab });
        dispatcher.enqueue(RenderEvent::VblankOut);
        dispatcher.wait_render_finished();
        let framebuffer = dispatcher.output_framebuffer();
        assert_eq!(framebuffer.len(), (SCREEN_WIDTH * SCREEN_HEIGHT) as usize);
    }

    #[test]
    fn frame_complete_observes_the_render_threads_framebuffer() {
        let vdp1 = Vdp1::new();
        let mut callbacks = RecordingCallbacks { frames: 0, last_pixel: 0 };
        let dispatcher = Dispatcher::new().unwrap();
        {
            let mut sink = ThreadedVdp2Sink {
                dispatcher: &dispatcher,
                vdp1: &vdp1,
                callbacks: &mut callbacks,
                use_mirror: false,
            };
            sink.dispatch_line_render(0);
            sink.on_vblank_out();
        }
        assert_eq!(callbacks.frames, 1);
        assert_eq!(callbacks.last_pixel, 0xff00_0000);
    }

    #[test]
    fn pre_save_sync_blocks_until_queued_writes_are_applied() {
        let dispatcher = Dispatcher::new().unwrap();
        dispatcher.enqueue(RenderEvent::CramMode(CramMode::Mode1_2048x555));
        dispatcher.pre_save_sync();
    }

    #[test]
    fn post_load_sync_resyncs_the_mirror() {
        let dispatcher = Dispatcher::new().unwrap();
        let snapshot = Vdp2Snapshot {
            vram: vec![0u8; crate::core::vdp2::VRAM2_SIZE],
            cram: events::CramSnapshot {
                raw: vec![0u8; crate::core::vdp2::cram::CRAM_SIZE],
                mode: CramMode::Mode0_1024x555Mirrored,
            },
            registers: RegisterSnapshot {
                bg_params: [crate::core::vdp2::registers::BgParams::default(); 6],
                rotation_params: [crate::core::vdp2::registers::RotationParams::default(); 2],
                window_params: crate::core::vdp2::registers::WindowParams::default(),
                color_offset_table: crate::core::vdp2::registers::ColorOffsetTable::default(),
                back_color: (0, 0, 0),
                line_color: None,
                sprite_type: crate::core::vdp2::sprite::SpriteType(0),
                sprite_palette_base: 0,
            },
            deinterlace: false,
        };
        dispatcher.post_load_sync(snapshot);
    }
}
