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

//! A/D converter: 4 channel pairs (A-D), single or scan mode. Conversion
//! results are always zero since nothing on a Saturn SH-1 board feeds it
//! a real analog signal; only the timing and completion-flag protocol
//! are modelled.

use super::intc::{Intc, InterruptSource};

const SLOW_CLOCK_CYCLES: u64 = 266 * 8;
const FAST_CLOCK_CYCLES: u64 = 134 * 8;

#[derive(Clone, serde::Serialize, serde::Deserialize)]
pub struct Ad {
    data_regs: [u16; 4],
    conv_ended: bool,
    intr_enable: bool,
    enable: bool,
    scan_mode: bool,
    fast_clock: bool,
    chan_select: u8,
    trigger_enable: bool,
    cycle_count: u64,
}

impl Ad {
    pub fn new() -> Self {
        let mut ad = Self {
            data_regs: [0; 4],
            conv_ended: false,
            intr_enable: false,
            enable: false,
            scan_mode: false,
            fast_clock: false,
            chan_select: 0,
            trigger_enable: false,
            cycle_count: 0,
        };
        ad.reset();
        ad
    }

    pub fn reset(&mut self) {
        self.data_regs = [0; 4];
        self.conv_ended = false;
        self.intr_enable = false;
        self.enable = false;
        self.scan_mode = false;
        self.fast_clock = false;
        self.chan_select = 0;
        self.trigger_enable = false;
        self.cycle_count = 0;
    }

    fn conversion_cycles(&self) -> u64 {
        if self.fast_clock {
            FAST_CLOCK_CYCLES
        } else {
            SLOW_CLOCK_CYCLES
        }
    }

    pub fn advance(&mut self, cycles: u64, intc: &mut Intc) {
        if !self.enable {
            return;
        }
        self.cycle_count += cycles;
        if self.cycle_count < self.conversion_cycles() {
            return;
        }
        self.cycle_count = 0;
        self.conv_ended = true;
        if !self.scan_mode {
            self.enable = false;
        }
        if self.intr_enable {
            intc.raise(InterruptSource::Ad);
        }
    }

    fn read_adcsr(&self) -> u8 {
        ((self.conv_ended as u8) << 7)
            | ((self.intr_enable as u8) << 6)
            | ((self.enable as u8) << 5)
            | ((self.scan_mode as u8) << 4)
            | ((self.fast_clock as u8) << 3)
            | (self.chan_select & 0x7)
    }

    fn write_adcsr(&mut self, value: u8) {
        self.conv_ended &= value & 0x80 != 0;
        self.intr_enable = value & 0x40 != 0;
        self.enable = value & 0x20 != 0;
        self.scan_mode = value & 0x10 != 0;
        self.fast_clock = value & 0x08 != 0;
        self.chan_select = value & 0x7;
    }

    fn read_adcr(&self) -> u8 {
        ((self.trigger_enable as u8) << 7) | 0x7f
    }

    fn write_adcr(&mut self, value: u8) {
        self.trigger_enable = value & 0x80 != 0;
    }

    pub(super) fn read_u8(&self, reg: u32) -> Option<u8> {
        match reg {
            0x0..=0x7 => {
                let index = (reg / 2) as usize;
                let value = self.data_regs[index];
                Some(if reg % 2 == 0 { (value >> 8) as u8 } else { value as u8 })
            }
            0x8 => Some(self.read_adcsr()),
            0x9 => Some(self.read_adcr()),
            _ => None,
        }
    }

    pub(super) fn write_u8(&mut self, reg: u32, value: u8) -> bool {
        match reg {
            0x8 => self.write_adcsr(value),
            0x9 => self.write_adcr(value),
            _ => return false,
        }
        true
    }
}

impl Default for Ad {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_mode_conversion_completes_and_disables() {
        let mut ad = Ad::new();
        let mut intc = Intc::new();
        intc.configure_level(InterruptSource::Ad, 6);
        ad.write_adcsr(0b0110_0000); // ADIE + ADST, slow clock
        ad.advance(SLOW_CLOCK_CYCLES, &mut intc);
        assert!(ad.conv_ended);
        assert!(!ad.enable);
        assert_eq!(intc.pending_source(), InterruptSource::Ad);
    }

    #[test]
    fn scan_mode_conversion_stays_enabled() {
        let mut ad = Ad::new();
        let mut intc = Intc::new();
        ad.write_adcsr(0b0011_0000); // ADST + SCAN
        ad.advance(SLOW_CLOCK_CYCLES, &mut intc);
        assert!(ad.enable);
    }
}
