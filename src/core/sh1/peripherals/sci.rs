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

//! Serial Communication Interface, 2 independent asynchronous channels.
//! Bit-rate timing is approximated from `BRR` as a cycle divisor rather
//! than the real hardware's exact baud-rate generator formula, since
//! the external bridge (the CD block in the original system) only
//! cares about byte-level framing.

use super::intc::{Intc, InterruptSource};
use crate::core::bus::SerialCallbacks;

const CHANNEL_TX_SOURCES: [InterruptSource; 2] = [InterruptSource::Sci0, InterruptSource::Sci1];

#[derive(Clone, Default, serde::Serialize, serde::Deserialize)]
struct Channel {
    te: bool,
    re: bool,
    tie: bool,
    rie: bool,
    brr: u8,
    tdr: u8,
    tdr_pending: bool,
    tdre: bool,
    rdr: u8,
    rdrf: bool,
    orer: bool,
    cycle_count: u64,
}

impl Channel {
    fn reset(&mut self) {
        *self = Channel {
            tdre: true,
            ..Default::default()
        };
    }

    fn divider(&self) -> u64 {
        64u64 << (self.brr as u64 & 0x3)
    }

    fn advance(&mut self, cycles: u64) -> bool {
        if !self.te || !self.tdr_pending {
            return false;
        }
        self.cycle_count += cycles;
        if self.cycle_count < self.divider() {
            return false;
        }
        self.cycle_count = 0;
        self.tdr_pending = false;
        self.tdre = true;
        self.tie
    }
}

#[derive(Clone, serde::Serialize, serde::Deserialize)]
pub struct Sci {
    channels: [Channel; 2],
}

impl Sci {
    pub fn new() -> Self {
        let mut sci = Self {
            channels: Default::default(),
        };
        sci.reset();
        sci
    }

    pub fn reset(&mut self) {
        self.channels.iter_mut().for_each(Channel::reset);
    }

    pub fn advance(&mut self, cycles: u64, intc: &mut Intc, serial: &mut dyn SerialCallbacks) {
        for (i, channel) in self.channels.iter_mut().enumerate() {
            if channel.advance(cycles) {
                let sent = serial.serial_tx(i as u8, channel.tdr);
                let _ = sent;
                intc.raise(CHANNEL_TX_SOURCES[i]);
            }
        }
    }

    /// Injects a received byte from the external bridge.
    pub fn receive(&mut self, channel: usize, byte: u8, intc: &mut Intc) {
        let Some(ch) = self.channels.get_mut(channel) else {
            return;
        };
        if !ch.re {
            return;
        }
        if ch.rdrf {
            ch.orer = true;
        } else {
            ch.rdr = byte;
            ch.rdrf = true;
            if ch.rie {
                intc.raise(CHANNEL_TX_SOURCES[channel]);
            }
        }
    }

    fn read_scr(channel: &Channel) -> u8 {
        ((channel.te as u8) << 5) | ((channel.re as u8) << 4) | ((channel.tie as u8) << 7) | ((channel.rie as u8) << 6)
    }

    fn write_scr(channel: &mut Channel, value: u8) {
        channel.tie = value & 0x80 != 0;
        channel.rie = value & 0x40 != 0;
        channel.te = value & 0x20 != 0;
        channel.re = value & 0x10 != 0;
    }

    fn read_ssr(channel: &Channel) -> u8 {
        ((channel.tdre as u8) << 7) | ((channel.rdrf as u8) << 6) | ((channel.orer as u8) << 5)
    }

    fn write_ssr(channel: &mut Channel, value: u8) {
        channel.tdre &= value & 0x80 != 0;
        channel.rdrf &= value & 0x40 != 0;
        channel.orer &= value & 0x20 != 0;
    }

    pub(super) fn read_u8(&self, reg: u32) -> Option<u8> {
        let ch = (reg >> 4) as usize;
        let channel = self.channels.get(ch)?;
        match reg & 0xf {
            0x0 => Some(channel.brr),
            0x1 => Some(Self::read_scr(channel)),
            0x2 => Some(channel.tdr),
            0x3 => Some(Self::read_ssr(channel)),
            0x4 => Some(channel.rdr),
            _ => None,
        }
    }

    pub(super) fn write_u8(&mut self, reg: u32, value: u8) -> bool {
        let ch = (reg >> 4) as usize;
        let Some(channel) = self.channels.get_mut(ch) else {
            return false;
        };
        match reg & 0xf {
            0x0 => channel.brr = value,
            0x1 => Self::write_scr(channel, value),
            0x2 => {
                channel.tdr = value;
                channel.tdr_pending = true;
                channel.tdre = false;
            }
            0x3 => Self::write_ssr(channel, value),
            _ => return false,
        }
        true
    }
}

impl Default for Sci {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transmit_completes_after_divider_cycles_and_raises_interrupt() {
        let mut sci = Sci::new();
        let mut intc = Intc::new();
        intc.configure_level(InterruptSource::Sci0, 2);
        Sci::write_scr(&mut sci.channels[0], 0b1010_0000); // TIE + TE
        sci.write_u8(0x02, 0x41);
        let mut serial = ();
        sci.advance(64, &mut intc, &mut serial);
        assert!(sci.channels[0].tdre);
        assert_eq!(intc.pending_source(), InterruptSource::Sci0);
    }

    #[test]
    fn receive_sets_overrun_when_rdr_already_full() {
        let mut sci = Sci::new();
        let mut intc = Intc::new();
        sci.channels[0].re = true;
        sci.receive(0, 0x11, &mut intc);
        sci.receive(0, 0x22, &mut intc);
        assert!(sci.channels[0].orer);
        assert_eq!(sci.channels[0].rdr, 0x11);
    }
}
