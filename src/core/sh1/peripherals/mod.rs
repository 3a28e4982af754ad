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

//! On-chip peripheral block: the nine sub-blocks accessible from the
//! SH-1's own address space. Each sub-block owns
//! its own registers and is addressed through a single flat window
//! rather than the real hardware's scattered register map, since
//! nothing outside this crate depends on the exact physical addresses.

pub mod ad;
pub mod bsc;
pub mod dmac;
pub mod intc;
pub mod itu;
pub mod pfc;
pub mod sci;
pub mod tpc;
pub mod wdt;

use crate::core::bus::{Bus, SerialCallbacks};
use intc::Intc;

const BASE: u32 = 0x0005_0000;
const INTC_BASE: u32 = 0x000;
const INTC_SIZE: u32 = 0x040;
const DMAC_BASE: u32 = INTC_BASE + INTC_SIZE;
const DMAC_SIZE: u32 = 0x040;
const ITU_BASE: u32 = DMAC_BASE + DMAC_SIZE;
const ITU_SIZE: u32 = 0x050;
const WDT_BASE: u32 = ITU_BASE + ITU_SIZE;
const WDT_SIZE: u32 = 0x003;
const SCI_BASE: u32 = WDT_BASE + 0x010;
const SCI_SIZE: u32 = 0x020;
const AD_BASE: u32 = SCI_BASE + SCI_SIZE;
const AD_SIZE: u32 = 0x00a;
const PFC_BASE: u32 = AD_BASE + 0x010;
const PFC_SIZE: u32 = 0x00d;
const TPC_BASE: u32 = PFC_BASE + 0x010;
const TPC_SIZE: u32 = 0x006;
const BSC_BASE: u32 = TPC_BASE + 0x010;
const BSC_SIZE: u32 = 0x012;
const TOTAL_SIZE: u32 = BSC_BASE + BSC_SIZE;

#[derive(Clone, serde::Serialize, serde::Deserialize)]
pub struct Peripherals {
    pub intc: Intc,
    pub dmac: dmac::Dmac,
    pub itu: itu::Itu,
    pub wdt: wdt::Wdt,
    pub sci: sci::Sci,
    pub ad: ad::Ad,
    pub pfc: pfc::Pfc,
    pub tpc: tpc::Tpc,
    pub bsc: bsc::Bsc,
}

impl Peripherals {
    pub fn new() -> Self {
        Self {
            intc: Intc::new(),
            dmac: dmac::Dmac::new(),
            itu: itu::Itu::new(),
            wdt: wdt::Wdt::new(),
            sci: sci::Sci::new(),
            ad: ad::Ad::new(),
            pfc: pfc::Pfc::new(),
            tpc: tpc::Tpc::new(),
            bsc: bsc::Bsc::new(),
        }
    }

    pub fn reset(&mut self, watchdog_initiated: bool) {
        self.intc.reset();
        self.dmac.reset();
        self.itu.reset();
        self.wdt.reset(watchdog_initiated);
        self.sci.reset();
        self.ad.reset();
        self.pfc.reset();
        self.tpc.reset();
        self.bsc.reset();
    }

    /// Advances every ticking sub-block by `cycles` and feeds DMA its
    /// bus capability; SCI additionally needs the host's
    /// serial callbacks to deliver completed transmissions.
    pub fn advance(&mut self, cycles: u64, bus: &mut dyn Bus, serial: &mut dyn SerialCallbacks) {
        let wdt_event = self.wdt.advance(cycles);
        if wdt_event.interrupt {
            self.intc.raise(intc::InterruptSource::Wdt);
        }
        self.itu.advance(cycles, &mut self.intc);
        self.sci.advance(cycles, &mut self.intc, serial);
        self.dmac.advance(cycles, bus, &mut self.intc);
        self.ad.advance(cycles, &mut self.intc);
    }

    fn local_offset(address: u32) -> Option<u32> {
        let offset = address.checked_sub(BASE)?;
        (offset < TOTAL_SIZE).then_some(offset)
    }

    pub(crate) fn read_u8(&self, address: u32) -> Option<u8> {
        let offset = Self::local_offset(address)?;
        match offset {
            o if o < DMAC_BASE => self.intc.read_u8(o - INTC_BASE),
            o if o < ITU_BASE => self.dmac.read_u8(o - DMAC_BASE),
            o if o < WDT_BASE => self.itu.read_u8(o - ITU_BASE),
            o if o < SCI_BASE => self.wdt.read_u8(o - WDT_BASE),
            o if o < AD_BASE => self.sci.read_u8(o - SCI_BASE),
            o if o < PFC_BASE => self.ad.read_u8(o - AD_BASE),
            o if o < TPC_BASE => self.pfc.read_u8(o - PFC_BASE),
            o if o < BSC_BASE => self.tpc.read_u8(o - TPC_BASE),
            o => self.bsc.read_u8(o - BSC_BASE),
        }
    }

    pub(crate) fn write_u8(&mut self, address: u32, value: u8) -> bool {
        let Some(offset) = Self::local_offset(address) else {
            return false;
        };
        match offset {
            o if o < DMAC_BASE => self.intc.write_u8(o - INTC_BASE, value),
            o if o < ITU_BASE => self.dmac.write_u8(o - DMAC_BASE, value),
            o if o < WDT_BASE => self.itu.write_u8(o - ITU_BASE, value),
            o if o < SCI_BASE => self.wdt.write_u8(o - WDT_BASE, value),
            o if o < AD_BASE => self.sci.write_u8(o - SCI_BASE, value),
            o if o < PFC_BASE => self.ad.write_u8(o - AD_BASE, value),
            o if o < TPC_BASE => self.pfc.write_u8(o - PFC_BASE, value),
            o if o < BSC_BASE => self.tpc.write_u8(o - TPC_BASE, value),
            o => self.bsc.write_u8(o - BSC_BASE, value),
        }
    }

    pub(crate) fn read_u16(&self, address: u32) -> Option<u16> {
        let hi = self.read_u8(address)? as u16;
        let lo = self.read_u8(address.wrapping_add(1))? as u16;
        Some((hi << 8) | lo)
    }

    pub(crate) fn write_u16(&mut self, address: u32, value: u16) -> bool {
        let hi_ok = self.write_u8(address, (value >> 8) as u8);
        let lo_ok = self.write_u8(address.wrapping_add(1), value as u8);
        hi_ok || lo_ok
    }
}

impl Default for Peripherals {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bus::FlatBus;

    #[test]
    fn intc_level_registers_are_reachable_through_the_flat_window() {
        let mut peripherals = Peripherals::new();
        assert!(peripherals.write_u8(BASE, 5));
        assert_eq!(peripherals.read_u8(BASE), Some(5));
    }

    #[test]
    fn bsc_registers_sit_at_the_end_of_the_window() {
        let mut peripherals = Peripherals::new();
        assert!(peripherals.write_u8(BASE + BSC_BASE + 0x10, 0x42));
        assert_eq!(peripherals.read_u8(BASE + BSC_BASE + 0x10), Some(0x42));
    }

    #[test]
    fn out_of_range_address_falls_through() {
        let peripherals = Peripherals::new();
        assert_eq!(peripherals.read_u8(BASE + TOTAL_SIZE), None);
        assert_eq!(peripherals.read_u8(BASE - 1), None);
    }

    #[test]
    fn advance_routes_dma_through_the_supplied_bus() {
        let mut peripherals = Peripherals::new();
        let mut bus = FlatBus::new(0x100);
        let mut serial = ();
        peripherals.advance(4, &mut bus, &mut serial);
    }
}
