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

//! Colour look-up memory: 4 KiB of raw storage, three
//! addressing modes, and a pre-expanded RGB888 cache invalidated on
//! writes.

pub const CRAM_SIZE: usize = 4 * 1024;

/// The three CRAM addressing modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CramMode {
    /// 1024 entries x RGB555, mirrored across the 4 KiB space.
    Mode0_1024x555Mirrored,
    /// 2048 entries x RGB555.
    Mode1_2048x555,
    /// 1024 entries x RGB888.
    Mode2_1024x888,
}

/// Colour look-up memory plus its pre-expanded cache.
pub struct Cram {
    raw: [u8; CRAM_SIZE],
    mode: CramMode,
    /// Pre-expanded RGB888 cache, one entry per addressable colour
    /// index under the current mode; invalidated (lazily rebuilt) on
    /// any write.
    cache: Vec<(u8, u8, u8)>,
    cache_dirty: bool,
}

impl Cram {
    pub fn new() -> Self {
        let mut cram = Self {
            raw: [0u8; CRAM_SIZE],
            mode: CramMode::Mode0_1024x555Mirrored,
            cache: Vec::new(),
            cache_dirty: true,
        };
        cram.rebuild_cache();
        cram
    }

    pub fn set_mode(&mut self, mode: CramMode) {
        if mode != self.mode {
            self.mode = mode;
            self.cache_dirty = true;
        }
    }

    pub fn mode(&self) -> CramMode {
        self.mode
    }

    pub fn reset(&mut self) {
        self.raw = [0u8; CRAM_SIZE];
        self.mode = CramMode::Mode0_1024x555Mirrored;
        self.cache_dirty = true;
        self.rebuild_cache();
    }

    fn entry_count(&self) -> usize {
        match self.mode {
            CramMode::Mode0_1024x555Mirrored => 1024,
            CramMode::Mode1_2048x555 => 2048,
            CramMode::Mode2_1024x888 => 1024,
        }
    }

    fn entry_stride(&self) -> usize {
        match self.mode {
            CramMode::Mode0_1024x555Mirrored | CramMode::Mode1_2048x555 => 2,
            CramMode::Mode2_1024x888 => 4,
        }
    }

    pub fn write_u8(&mut self, address: usize, value: u8) {
        let addr = address % CRAM_SIZE;
        self.raw[addr] = value;
        self.cache_dirty = true;
    }

    pub fn read_u8(&self, address: usize) -> u8 {
        self.raw[address % CRAM_SIZE]
    }

    pub fn write_u16(&mut self, address: usize, value: u16) {
        let addr = (address / 2 * 2) % CRAM_SIZE;
        self.raw[addr] = (value >> 8) as u8;
        self.raw[(addr + 1) % CRAM_SIZE] = value as u8;
        self.cache_dirty = true;
    }

    pub fn read_u16(&self, address: usize) -> u16 {
        let addr = (address / 2 * 2) % CRAM_SIZE;
        ((self.raw[addr] as u16) << 8) | self.raw[(addr + 1) % CRAM_SIZE] as u16
    }

    fn rebuild_cache(&mut self) {
        let count = self.entry_count();
        let stride = self.entry_stride();
        let mirrored = matches!(self.mode, CramMode::Mode0_1024x555Mirrored);
        let mut cache = Vec::with_capacity(if mirrored { count * 2 } else { count });

        for i in 0..count {
            let base = (i * stride) % CRAM_SIZE;
            let color = match self.mode {
                CramMode::Mode0_1024x555Mirrored | CramMode::Mode1_2048x555 => {
                    let word = ((self.raw[base] as u16) << 8) | self.raw[(base + 1) % CRAM_SIZE] as u16;
                    rgb555_to_888(word)
                }
                CramMode::Mode2_1024x888 => (
                    self.raw[(base + 1) % CRAM_SIZE],
                    self.raw[(base + 2) % CRAM_SIZE],
                    self.raw[(base + 3) % CRAM_SIZE],
                ),
            };
            cache.push(color);
        }
        if mirrored {
            let mirror = cache.clone();
            cache.extend(mirror);
        }
        self.cache = cache;
        self.cache_dirty = false;
    }

    /// Looks up the expanded RGB888 colour for palette `index`,
    /// rebuilding the cache first if it's stale.
    pub fn lookup(&mut self, index: usize) -> (u8, u8, u8) {
        if self.cache_dirty {
            self.rebuild_cache();
        }
        self.cache.get(index % self.cache.len().max(1)).copied().unwrap_or((0, 0, 0))
    }
}

impl Default for Cram {
    fn default() -> Self {
        Self::new()
    }
}

/// Saveable snapshot of [`Cram`]. The RGB888 cache is
/// rebuilt lazily from `raw`/`mode` on next lookup, so it isn't saved.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CramState {
    pub raw: Vec<u8>,
    pub mode: CramMode,
}

impl Cram {
    pub fn save_state(&self) -> CramState {
        CramState {
            raw: self.raw.to_vec(),
            mode: self.mode,
        }
    }

    pub fn load_state(&mut self, state: &CramState) {
        self.raw.copy_from_slice(&state.raw);
        self.mode = state.mode;
        self.cache_dirty = true;
    }
}

fn rgb555_to_888(word: u16) -> (u8, u8, u8) {
    let r = (word & 0x1f) as u8;
    let g = ((word >> 5) & 0x1f) as u8;
    let b = ((word >> 10) & 0x1f) as u8;
    let expand = |c: u8| (c << 3) | (c >> 2);
    (expand(r), expand(g), expand(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_written_words() {
        let mut cram = Cram::new();
        cram.write_u16(0, 0x1234);
        assert_eq!(cram.read_u16(0), 0x1234);
    }

    #[test]
    fn lookup_reflects_written_entry_after_write() {
        let mut cram = Cram::new();
        cram.write_u16(2, 0x7fff);
        let color = cram.lookup(1);
        assert_eq!(color, (255, 255, 255));
    }

    #[test]
    fn mode0_mirrors_across_the_full_cache() {
        let mut cram = Cram::new();
        cram.write_u16(0, 0x7fff);
        let a = cram.lookup(0);
        let b = cram.lookup(1024);
        assert_eq!(a, b);
    }

    #[test]
    fn mode2_reads_rgb888_triples_directly() {
        let mut cram = Cram::new();
        cram.set_mode(CramMode::Mode2_1024x888);
        cram.write_u8(0, 0x00);
        cram.write_u8(1, 0x10);
        cram.write_u8(2, 0x20);
        cram.write_u8(3, 0x30);
        assert_eq!(cram.lookup(0), (0x10, 0x20, 0x30));
    }
}
