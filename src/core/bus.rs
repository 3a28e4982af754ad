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

//! External bus and callback capabilities.
//!
//! The SH-1 core consumes a [`Bus`] capability rather than owning
//! memory directly: the surrounding system (SH-2 bus, CD-block RAM,
//! on-chip peripherals of other cores) is an external collaborator,
//! so the core only specifies the contract it crosses.
//! The core promises to mask addresses to 24 bits before calling into
//! the bus and to sequence multi-byte accesses in big-endian order;
//! callers of [`Bus`] implementations do not need to re-mask.

/// Capability exposing byte/word/long memory access to the SH-1 core.
///
/// Implementors back this with whatever the host system uses for
/// on-chip ROM, external RAM/DRAM, on-chip peripheral registers and
/// on-chip RAM; the core only ever calls through this
/// trait, never touching host memory directly, so the cyclic
/// reference between the SH-1 and the CD block never
/// materializes as an actual Rust reference cycle.
pub trait Bus {
    /// Reads a byte. `address` must already be masked to 24 bits.
    fn read_u8(&mut self, address: u32) -> u8;
    /// Reads a 16-bit word, big-endian.
    fn read_u16(&mut self, address: u32) -> u16;
    /// Reads a 32-bit long, big-endian.
    fn read_u32(&mut self, address: u32) -> u32;

    /// Writes a byte.
    fn write_u8(&mut self, address: u32, value: u8);
    /// Writes a 16-bit word, big-endian.
    fn write_u16(&mut self, address: u32, value: u16);
    /// Writes a 32-bit long, big-endian.
    fn write_u32(&mut self, address: u32, value: u32);
}

/// A flat byte-addressed bus backed by a single buffer, useful for
/// tests and as the default bus for a standalone [`crate::core::sh1::Sh1`].
///
/// Real hosts (the SH-2 bus, CD-block internals) implement [`Bus`]
/// themselves with proper region decoding; this type exists so the
/// SH-1 core and its peripherals can be exercised without one.
#[derive(Debug, Clone)]
pub struct FlatBus {
    memory: Vec<u8>,
}

impl FlatBus {
    /// Creates a new flat bus of `size` bytes, zero-initialized.
    pub fn new(size: usize) -> Self {
        Self {
            memory: vec![0u8; size],
        }
    }

    /// Returns the backing memory as a byte slice.
    pub fn as_slice(&self) -> &[u8] {
        &self.memory
    }

    /// Returns the backing memory as a mutable byte slice.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.memory
    }

    fn mask(&self, address: u32) -> usize {
        (address as usize) % self.memory.len().max(1)
    }
}

impl Bus for FlatBus {
    fn read_u8(&mut self, address: u32) -> u8 {
        let idx = self.mask(address);
        self.memory[idx]
    }

    fn read_u16(&mut self, address: u32) -> u16 {
        let hi = self.read_u8(address) as u16;
        let lo = self.read_u8(address.wrapping_add(1)) as u16;
        (hi << 8) | lo
    }

    fn read_u32(&mut self, address: u32) -> u32 {
        let hi = self.read_u16(address) as u32;
        let lo = self.read_u16(address.wrapping_add(2)) as u32;
        (hi << 16) | lo
    }

    fn write_u8(&mut self, address: u32, value: u8) {
        let idx = self.mask(address);
        self.memory[idx] = value;
    }

    fn write_u16(&mut self, address: u32, value: u16) {
        self.write_u8(address, (value >> 8) as u8);
        self.write_u8(address.wrapping_add(1), value as u8);
    }

    fn write_u32(&mut self, address: u32, value: u32) {
        self.write_u16(address, (value >> 16) as u16);
        self.write_u16(address.wrapping_add(2), value as u16);
    }
}

/// Video callback surface.
///
/// Invoked by the raster phase driver and VDP1 frame-end logic so the
/// surrounding system can raise SCU interrupts, latch SMPC input, and
/// receive completed frames. A no-op default implementation is
/// provided on `()` so tests that don't care about callbacks can pass
/// it directly.
pub trait VideoCallbacks {
    /// Invoked once per full raster frame with the composited RGB888
    /// scanline buffer, `width` and `height` in pixels.
    fn frame_complete(&mut self, _pixels: &[u32], _width: u32, _height: u32) {}

    /// Invoked on every HBlank state change.
    fn hblank_state_change(&mut self, _hblank: bool, _vblank: bool) {}

    /// Invoked on every VBlank state change.
    fn vblank_state_change(&mut self, _vblank: bool) {}

    /// Fired when VDP1 finishes processing the sprite draw list.
    fn trigger_sprite_draw_end(&mut self) {}

    /// Fired when VDP1's displayed/draw framebuffers swap.
    fn vdp1_framebuffer_swap(&mut self) {}

    /// Fired when VDP1 finishes drawing the current frame.
    fn vdp1_draw_finished(&mut self) {}

    /// One-shot hint ~1ms before VBlank-in so SMPC latching can race
    /// the CPU.
    fn trigger_optimized_intback_read(&mut self) {}
}

impl VideoCallbacks for () {}

/// Byte-level serial hooks for the SH-1's two SCI channels, used by
/// the CD drive bridge in the original system.
pub trait SerialCallbacks {
    /// Called when a byte has been received on `channel` (0 or 1).
    fn serial_rx(&mut self, _channel: u8, _byte: u8) {}
    /// Called to transmit a byte on `channel` (0 or 1); returns the
    /// byte actually placed on the wire (echo/loopback friendly).
    fn serial_tx(&mut self, _channel: u8, byte: u8) -> u8 {
        byte
    }
}

impl SerialCallbacks for () {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_bus_round_trips_big_endian() {
        let mut bus = FlatBus::new(16);
        bus.write_u32(0, 0x1234_5678);
        assert_eq!(bus.read_u8(0), 0x12);
        assert_eq!(bus.read_u8(1), 0x34);
        assert_eq!(bus.read_u8(2), 0x56);
        assert_eq!(bus.read_u8(3), 0x78);
        assert_eq!(bus.read_u32(0), 0x1234_5678);
        assert_eq!(bus.read_u16(2), 0x5678);
    }

    #[test]
    fn unit_callbacks_are_no_ops() {
        let mut cb = ();
        cb.frame_complete(&[], 0, 0);
        cb.hblank_state_change(true, false);
        cb.vblank_state_change(true);
        cb.trigger_sprite_draw_end();
        cb.vdp1_framebuffer_swap();
        cb.vdp1_draw_finished();
        cb.trigger_optimized_intback_read();
    }
}
