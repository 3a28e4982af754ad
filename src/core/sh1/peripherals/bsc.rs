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

//! Bus State Controller: wait-state, DRAM timing, and refresh register
//! bank. This core's [`super::super::super::bus::Bus`] capability has no
//! notion of wait states or DRAM refresh cycles, so these registers are
//! stored and returned verbatim with no effect on bus timing.

#[derive(Clone, serde::Serialize, serde::Deserialize)]
pub struct Bsc {
    bcr: u16,
    wcr1: u16,
    wcr2: u16,
    wcr3: u16,
    dcr: u16,
    pcr: u16,
    rcr: u16,
    rtcsr: u16,
    rtcnt: u8,
    rtcor: u8,
}

impl Bsc {
    pub fn new() -> Self {
        let mut bsc = Self {
            bcr: 0,
            wcr1: 0xffff,
            wcr2: 0xffff,
            wcr3: 0xf800,
            dcr: 0,
            pcr: 0,
            rcr: 0,
            rtcsr: 0,
            rtcnt: 0,
            rtcor: 0xff,
        };
        bsc.reset();
        bsc
    }

    pub fn reset(&mut self) {
        self.bcr = 0;
        self.wcr1 = 0xffff;
        self.wcr2 = 0xffff;
        self.wcr3 = 0xf800;
        self.dcr = 0;
        self.pcr = 0;
        self.rcr = 0;
        self.rtcsr = 0;
        self.rtcnt = 0;
        self.rtcor = 0xff;
    }

    pub(super) fn read_u8(&self, reg: u32) -> Option<u8> {
        let word = |v: u16, lo: bool| if lo { v as u8 } else { (v >> 8) as u8 };
        match reg {
            0x0 => Some(word(self.bcr, false)),
            0x1 => Some(word(self.bcr, true)),
            0x2 => Some(word(self.wcr1, false)),
            0x3 => Some(word(self.wcr1, true)),
            0x4 => Some(word(self.wcr2, false)),
            0x5 => Some(word(self.wcr2, true)),
            0x6 => Some(word(self.wcr3, false)),
            0x7 => Some(word(self.wcr3, true)),
            0x8 => Some(word(self.dcr, false)),
            0x9 => Some(word(self.dcr, true)),
            0xa => Some(word(self.pcr, false)),
            0xb => Some(word(self.pcr, true)),
            0xc => Some(word(self.rcr, false)),
            0xd => Some(word(self.rcr, true)),
            0xe => Some(word(self.rtcsr, false)),
            0xf => Some(word(self.rtcsr, true)),
            0x10 => Some(self.rtcnt),
            0x11 => Some(self.rtcor),
            _ => None,
        }
    }

    pub(super) fn write_u8(&mut self, reg: u32, value: u8) -> bool {
        let set_hi = |v: &mut u16, b: u8| *v = (*v & 0x00ff) | ((b as u16) << 8);
        let set_lo = |v: &mut u16, b: u8| *v = (*v & 0xff00) | b as u16;
        match reg {
            0x0 => set_hi(&mut self.bcr, value),
            0x1 => set_lo(&mut self.bcr, value),
            0x2 => set_hi(&mut self.wcr1, value),
            0x3 => set_lo(&mut self.wcr1, value),
            0x4 => set_hi(&mut self.wcr2, value),
            0x5 => set_lo(&mut self.wcr2, value),
            0x6 => set_hi(&mut self.wcr3, value),
            0x7 => set_lo(&mut self.wcr3, value),
            0x8 => set_hi(&mut self.dcr, value),
            0x9 => set_lo(&mut self.dcr, value),
            0xa => set_hi(&mut self.pcr, value),
            0xb => set_lo(&mut self.pcr, value),
            0xc => set_hi(&mut self.rcr, value),
            0xd => set_lo(&mut self.rcr, value),
            0xe => set_hi(&mut self.rtcsr, value),
            0xf => set_lo(&mut self.rtcsr, value),
            0x10 => self.rtcnt = value,
            0x11 => self.rtcor = value,
            _ => return false,
        }
        true
    }
}

impl Default for Bsc {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_matches_hardware_defaults() {
        let bsc = Bsc::new();
        assert_eq!(bsc.wcr1, 0xffff);
        assert_eq!(bsc.wcr3, 0xf800);
        assert_eq!(bsc.rtcor, 0xff);
    }

    #[test]
    fn dcr_round_trips_byte_halves() {
        let mut bsc = Bsc::new();
        bsc.write_u8(0x8, 0x12);
        bsc.write_u8(0x9, 0x34);
        assert_eq!(bsc.dcr, 0x1234);
        assert_eq!(bsc.read_u8(0x8), Some(0x12));
        assert_eq!(bsc.read_u8(0x9), Some(0x34));
    }
}
