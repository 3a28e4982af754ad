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

//! Watchdog timer. In watchdog mode (`TCSR.WT_nIT`) an overflow with
//! `RSTCSR.RSTE` set requests a reset; in interval-timer mode an
//! overflow raises an interrupt instead.

const CLOCK_DIVIDER_SHIFTS: [u32; 8] = [1, 6, 7, 8, 9, 10, 12, 13];

#[derive(Debug, Clone, Copy, Default)]
pub struct WdtEvent {
    pub reset: bool,
    pub interrupt: bool,
}

#[derive(Clone, serde::Serialize, serde::Deserialize)]
pub struct Wdt {
    ovf: bool,
    watchdog_mode: bool,
    timer_enabled: bool,
    clock_select: u8,
    tcnt: u8,
    wovf: bool,
    reset_enabled: bool,
    reset_select_manual: bool,
    cycle_count: u64,
}

impl Wdt {
    pub fn new() -> Self {
        let mut wdt = Self {
            ovf: false,
            watchdog_mode: false,
            timer_enabled: false,
            clock_select: 0,
            tcnt: 0,
            wovf: false,
            reset_enabled: false,
            reset_select_manual: false,
            cycle_count: 0,
        };
        wdt.reset(false);
        wdt
    }

    pub fn reset(&mut self, watchdog_initiated: bool) {
        self.ovf = false;
        self.watchdog_mode = false;
        self.timer_enabled = false;
        self.clock_select = 0;
        self.tcnt = 0;
        if !watchdog_initiated {
            self.wovf = false;
            self.reset_enabled = false;
            self.reset_select_manual = false;
        }
        self.cycle_count = 0;
    }

    fn divider_shift(&self) -> u32 {
        CLOCK_DIVIDER_SHIFTS[self.clock_select as usize & 7]
    }

    pub fn advance(&mut self, cycles: u64) -> WdtEvent {
        if !self.timer_enabled {
            self.cycle_count = self.cycle_count.wrapping_add(cycles);
            return WdtEvent::default();
        }

        let shift = self.divider_shift();
        let before = self.cycle_count >> shift;
        self.cycle_count = self.cycle_count.wrapping_add(cycles);
        let after = self.cycle_count >> shift;
        let steps = after.saturating_sub(before);
        if steps == 0 {
            return WdtEvent::default();
        }

        let next = self.tcnt as u64 + steps;
        let mut event = WdtEvent::default();
        if next >= 0x100 {
            if self.watchdog_mode {
                self.wovf = true;
                if self.reset_enabled {
                    event.reset = true;
                }
            } else {
                self.ovf = true;
                event.interrupt = true;
            }
        }
        self.tcnt = next as u8;
        event
    }

    pub fn read_tcsr(&self) -> u8 {
        ((self.ovf as u8) << 7) | ((self.watchdog_mode as u8) << 6) | ((self.timer_enabled as u8) << 5) | 0b1_1000 | (self.clock_select & 7)
    }

    pub fn write_tcsr(&mut self, value: u8) {
        self.ovf &= value & 0x80 != 0;
        self.watchdog_mode = value & 0x40 != 0;
        self.timer_enabled = value & 0x20 != 0;
        self.clock_select = value & 7;
        if !self.timer_enabled {
            self.tcnt = 0;
            self.ovf = false;
        }
    }

    pub fn read_tcnt(&self) -> u8 {
        self.tcnt
    }

    pub fn write_tcnt(&mut self, value: u8) {
        if self.timer_enabled {
            self.tcnt = value;
        }
    }

    pub fn read_rstcsr(&self) -> u8 {
        ((self.wovf as u8) << 7) | ((self.reset_enabled as u8) << 6) | ((self.reset_select_manual as u8) << 5) | 0b1_1111
    }

    pub fn write_rstcsr(&mut self, value: u8) {
        self.wovf &= value & 0x80 != 0;
        self.reset_enabled = value & 0x40 != 0;
        self.reset_select_manual = value & 0x20 != 0;
    }

    pub(super) fn read_u8(&self, reg: u32) -> Option<u8> {
        match reg {
            0x00 => Some(self.read_tcsr()),
            0x01 => Some(self.read_tcnt()),
            0x02 => Some(self.read_rstcsr()),
            _ => None,
        }
    }

    pub(super) fn write_u8(&mut self, reg: u32, value: u8) -> bool {
        match reg {
            0x00 => {
                self.write_tcsr(value);
                true
            }
            0x01 => {
                self.write_tcnt(value);
                true
            }
            0x02 => {
                self.write_rstcsr(value);
                true
            }
            _ => false,
        }
    }
}

impl Default for Wdt {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_mode_overflow_raises_interrupt_not_reset() {
        let mut wdt = Wdt::new();
        wdt.write_tcsr(0b0010_0000); // TME set, interval mode, fastest divider
        let mut event = WdtEvent::default();
        for _ in 0..300 {
            let e = wdt.advance(2);
            if e.interrupt || e.reset {
                event = e;
                break;
            }
        }
        assert!(event.interrupt);
        assert!(!event.reset);
    }

    #[test]
    fn watchdog_mode_overflow_with_reset_enabled_requests_reset() {
        let mut wdt = Wdt::new();
        wdt.write_tcsr(0b0110_0000); // TME + watchdog mode
        wdt.write_rstcsr(0b0100_0000); // RSTE
        let mut event = WdtEvent::default();
        for _ in 0..300 {
            let e = wdt.advance(2);
            if e.interrupt || e.reset {
                event = e;
                break;
            }
        }
        assert!(event.reset);
    }

    #[test]
    fn disabled_timer_never_overflows() {
        let mut wdt = Wdt::new();
        let event = wdt.advance(1_000_000);
        assert!(!event.interrupt && !event.reset);
    }
}
