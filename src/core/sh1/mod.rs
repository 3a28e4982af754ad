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

//! SH-1 microcontroller core.
//!
//! Interpretation is dispatched from [`decode::decode`], which keys off
//! the 16-bit opcode; branch-delay semantics are resolved by passing a
//! `delay_slot` flag into each instruction body rather than by
//! compile-time template duplication.
//!
//! # Module layout
//!
//! - [`decode`] — opcode → [`decode::Mnemonic`] + operand fields.
//! - [`instructions`] — one execution body per mnemonic, grouped by
//!   category.
//! - [`peripherals`] — DMAC/ITU/WDT/SCI/AD/INTC/PFC/TPC/BSC sub-blocks.

pub mod decode;
pub mod instructions;
pub mod peripherals;

use crate::core::bus::{Bus, SerialCallbacks};
use crate::core::error::{Result, Sh1Error};

pub const ROM_SIZE: usize = 64 * 1024;
pub const RAM_SIZE: usize = 4 * 1024;

/// Multiply-accumulate register pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RegMac {
    pub mach: u32,
    pub macl: u32,
}

/// Status register flags: T/S/M bits plus a 4-bit interrupt mask
/// level. `q` is carried alongside `m` since DIV0S/DIV1 require it
/// to compute the sign of the running division per the real SH-1
/// ISA; it has no separate mention in the data model because it's
/// mechanically tied to the same division feature `m` supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RegSr {
    pub t: bool,
    pub s: bool,
    pub m: bool,
    pub q: bool,
    pub i_level: u8,
}

impl Default for RegSr {
    fn default() -> Self {
        Self {
            t: false,
            s: false,
            m: false,
            q: false,
            i_level: 0xf,
        }
    }
}

impl RegSr {
    pub fn to_bits(self) -> u32 {
        (self.t as u32)
            | ((self.s as u32) << 1)
            | ((self.q as u32) << 8)
            | ((self.m as u32) << 9)
            | ((self.i_level as u32 & 0xf) << 4)
    }

    pub fn from_bits(bits: u32) -> Self {
        Self {
            t: bits & 1 != 0,
            s: bits & 2 != 0,
            i_level: ((bits >> 4) & 0xf) as u8,
            q: bits & 0x100 != 0,
            m: bits & 0x200 != 0,
        }
    }
}

/// Delay-slot hazard state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DelaySlot {
    pub active: bool,
    pub target: u32,
}

/// The SH-1 microcontroller.
pub struct Sh1 {
    pub r: [u32; 16],
    pub pc: u32,
    pub pr: u32,
    pub mac: RegMac,
    pub sr: RegSr,
    pub gbr: u32,
    pub vbr: u32,

    delay_slot: DelaySlot,

    cycles_executed: u64,
    total_cycles: u64,

    rom: Vec<u8>,
    ram: Vec<u8>,
    rom_hash: u64,

    sleep: bool,
    nmi_latched: bool,

    pub peripherals: peripherals::Peripherals,
}

impl Sh1 {
    pub fn new() -> Self {
        let mut sh1 = Self {
            r: [0; 16],
            pc: 0,
            pr: 0,
            mac: RegMac::default(),
            sr: RegSr::default(),
            gbr: 0,
            vbr: 0,
            delay_slot: DelaySlot::default(),
            cycles_executed: 0,
            total_cycles: 0,
            rom: vec![0u8; ROM_SIZE],
            ram: vec![0u8; RAM_SIZE],
            rom_hash: 0,
            sleep: false,
            nmi_latched: false,
            peripherals: peripherals::Peripherals::new(),
        };
        sh1.hard_reset();
        sh1
    }

    /// Loads a 64 KiB ROM image and fingerprints it with FNV-1a
    /// for later save-state validation.
    pub fn load_rom(&mut self, rom: &[u8]) -> Result<()> {
        if rom.len() != ROM_SIZE {
            return Err(Sh1Error::InvalidRomSize {
                expected: ROM_SIZE,
                got: rom.len(),
            }
            .into());
        }
        self.rom.copy_from_slice(rom);
        self.rom_hash = fnv1a_64(rom);
        Ok(())
    }

    pub fn rom_hash(&self) -> u64 {
        self.rom_hash
    }

    /// Hard reset: clears RAM, registers and all on-chip peripherals
    ///. `watchdog_initiated` preserves the watchdog's
    /// own control/status so software can diagnose the reset cause.
    pub fn hard_reset(&mut self) {
        self.reset_registers();
        self.ram.iter_mut().for_each(|b| *b = 0);
        self.peripherals.reset(false);
    }

    /// Soft reset: re-initialises registers and latches but preserves
    /// RAM contents.
    pub fn soft_reset(&mut self, watchdog_initiated: bool) {
        self.reset_registers();
        self.peripherals.reset(watchdog_initiated);
    }

    fn reset_registers(&mut self) {
        self.r = [0; 16];
        self.r[15] = read_be32(&self.rom, 4);
        self.pc = read_be32(&self.rom, 0);
        self.pr = 0;
        self.mac = RegMac::default();
        self.sr = RegSr::default();
        self.gbr = 0;
        self.vbr = 0;
        self.delay_slot = DelaySlot::default();
        self.cycles_executed = 0;
        self.sleep = false;
        self.nmi_latched = false;
    }

    pub fn total_cycles(&self) -> u64 {
        self.total_cycles
    }

    pub fn in_delay_slot(&self) -> bool {
        self.delay_slot.active
    }

    pub fn is_asleep(&self) -> bool {
        self.sleep
    }

    pub fn set_nmi(&mut self) {
        self.nmi_latched = true;
    }

    /// Interrupt acceptance gate, recomputed after any register write
    /// that could change it: deferred while a
    /// delay slot is pending.
    fn interrupt_pending(&self) -> bool {
        if self.delay_slot.active {
            return false;
        }
        self.nmi_latched || self.peripherals.intc.pending_level() > self.sr.i_level
    }

    /// Runs a single instruction (or services a pending interrupt/NMI
    /// first), returning the number of cycles consumed.
    pub fn step(&mut self, bus: &mut dyn Bus, serial: &mut dyn SerialCallbacks) -> u64 {
        if self.sleep {
            return 1;
        }
        if self.interrupt_pending() {
            return self.enter_interrupt(bus);
        }

        let opcode = self.fetch_instruction(bus);
        let (mnemonic, args) = decode::decode(opcode);
        let was_delay_slot = self.delay_slot.active;
        self.delay_slot = DelaySlot::default();

        let cycles = instructions::execute(self, bus, serial, mnemonic, args, was_delay_slot);
        self.cycles_executed += cycles;
        self.total_cycles += cycles;
        cycles
    }

    /// Advances for at least `cycles` host cycles, ticking on-chip
    /// peripherals after each instruction.
    pub fn advance(&mut self, cycles: u64, bus: &mut dyn Bus, serial: &mut dyn SerialCallbacks) -> u64 {
        let mut executed = 0u64;
        while executed < cycles {
            let step_cycles = self.step(bus, serial);
            executed += step_cycles.max(1);
            let wdt_event = self.peripherals.wdt.advance(step_cycles);
            if wdt_event.reset {
                self.soft_reset(true);
            } else if wdt_event.interrupt {
                self.peripherals.intc.raise(peripherals::intc::InterruptSource::Wdt);
            }
            self.peripherals.itu.advance(step_cycles, &mut self.peripherals.intc);
            self.peripherals.sci.advance(step_cycles, &mut self.peripherals.intc, serial);
            self.peripherals.dmac.advance(step_cycles, bus, &mut self.peripherals.intc);
        }
        executed
    }

    fn enter_interrupt(&mut self, bus: &mut dyn Bus) -> u64 {
        let (vector, level) = if self.nmi_latched {
            self.nmi_latched = false;
            (0x0b, 0xf)
        } else {
            let source = self.peripherals.intc.pending_source();
            let level = self.peripherals.intc.pending_level();
            let vector = self.peripherals.intc.vector_for(source);
            self.peripherals.intc.acknowledge(source);
            (vector, level)
        };
        self.push(bus, self.sr.to_bits());
        self.push(bus, self.pc);
        self.sr.i_level = level.min(0xf);
        self.pc = bus.read_u32(self.vbr.wrapping_add(4 * vector as u32));
        8
    }

    pub(crate) fn push(&mut self, bus: &mut dyn Bus, value: u32) {
        self.r[15] = self.r[15].wrapping_sub(4);
        bus.write_u32(self.r[15], value);
    }

    pub(crate) fn pop(&mut self, bus: &mut dyn Bus) -> u32 {
        let value = bus.read_u32(self.r[15]);
        self.r[15] = self.r[15].wrapping_add(4);
        value
    }

    fn fetch_instruction(&mut self, bus: &mut dyn Bus) -> u16 {
        let opcode = self.read_u16(bus, self.pc);
        self.pc = if self.delay_slot.active {
            let target = self.delay_slot.target;
            target
        } else {
            self.pc.wrapping_add(2)
        };
        opcode
    }

    /// Routes a memory access through the on-chip ROM mirror/RAM when
    /// the address falls in those ranges, otherwise through the
    /// external [`Bus`]: address decode uses the top nibble.
    pub(crate) fn read_u8(&mut self, bus: &mut dyn Bus, address: u32) -> u8 {
        let address = address & 0x00ff_ffff;
        if let Some(byte) = self.on_chip_read_u8(address) {
            byte
        } else {
            bus.read_u8(address)
        }
    }

    pub(crate) fn read_u16(&mut self, bus: &mut dyn Bus, address: u32) -> u16 {
        let address = address & 0x00ff_ffff;
        let top = address >> 24;
        if top == 0x0 || top == 0x8 {
            read_be16(&self.rom, (address & 0xffff) as usize)
        } else if top == 0xf {
            read_be16(&self.ram, (address & 0x0fff) as usize)
        } else if let Some(value) = self.peripherals.read_u16(address) {
            value
        } else {
            bus.read_u16(address)
        }
    }

    pub(crate) fn read_u32(&mut self, bus: &mut dyn Bus, address: u32) -> u32 {
        let address = address & 0x00ff_ffff;
        let top = address >> 24;
        if top == 0x0 || top == 0x8 {
            read_be32(&self.rom, (address & 0xffff) as usize)
        } else if top == 0xf {
            read_be32(&self.ram, (address & 0x0fff) as usize)
        } else {
            bus.read_u32(address)
        }
    }

    fn on_chip_read_u8(&mut self, address: u32) -> Option<u8> {
        let top = address >> 24;
        if top == 0x0 || top == 0x8 {
            Some(self.rom[(address & 0xffff) as usize % ROM_SIZE])
        } else if top == 0xf {
            Some(self.ram[(address & 0x0fff) as usize % RAM_SIZE])
        } else {
            self.peripherals.read_u8(address)
        }
    }

    pub(crate) fn write_u8(&mut self, bus: &mut dyn Bus, address: u32, value: u8) {
        let address = address & 0x00ff_ffff;
        let top = address >> 24;
        if top == 0xf {
            self.ram[(address & 0x0fff) as usize % RAM_SIZE] = value;
        } else if !self.peripherals.write_u8(address, value) {
            bus.write_u8(address, value);
        }
    }

    pub(crate) fn write_u16(&mut self, bus: &mut dyn Bus, address: u32, value: u16) {
        let address = address & 0x00ff_ffff;
        let top = address >> 24;
        if top == 0xf {
            write_be16(&mut self.ram, (address & 0x0fff) as usize, value);
        } else if !self.peripherals.write_u16(address, value) {
            bus.write_u16(address, value);
        }
    }

    pub(crate) fn write_u32(&mut self, bus: &mut dyn Bus, address: u32, value: u32) {
        let address = address & 0x00ff_ffff;
        let top = address >> 24;
        if top == 0xf {
            write_be32(&mut self.ram, (address & 0x0fff) as usize, value);
        } else {
            bus.write_u32(address, value);
        }
    }

    pub(crate) fn setup_delay_slot(&mut self, target: u32) {
        self.delay_slot = DelaySlot { active: true, target };
    }

    /// Captures registers, RAM and peripheral state for a save state
    ///. The ROM image itself isn't saved since it
    /// doesn't change during execution; its FNV-1a hash is kept instead
    /// so `validate_state` can confirm a loaded state was produced by
    /// the same ROM.
    pub fn save_state(&self) -> Sh1State {
        Sh1State {
            r: self.r,
            pc: self.pc,
            pr: self.pr,
            mac: self.mac,
            sr: self.sr,
            gbr: self.gbr,
            vbr: self.vbr,
            delay_slot: self.delay_slot,
            cycles_executed: self.cycles_executed,
            total_cycles: self.total_cycles,
            ram: self.ram.clone(),
            rom_hash: self.rom_hash,
            sleep: self.sleep,
            nmi_latched: self.nmi_latched,
            peripherals: self.peripherals.clone(),
        }
    }

    /// Checks RAM size and, unless `skip_rom_checks` is set, that the
    /// saved state's ROM fingerprint matches the ROM currently loaded.
    pub fn validate_state(&self, state: &Sh1State, skip_rom_checks: bool) -> Result<()> {
        if state.ram.len() != RAM_SIZE {
            return Err(crate::core::error::SaveStateError::RangeCheck(format!(
                "SH-1 RAM size mismatch: expected {}, got {}",
                RAM_SIZE,
                state.ram.len()
            ))
            .into());
        }
        if !skip_rom_checks && state.rom_hash != self.rom_hash {
            return Err(crate::core::error::SaveStateError::RomHashMismatch {
                component: "sh1",
                expected: self.rom_hash,
                got: state.rom_hash,
            }
            .into());
        }
        Ok(())
    }

    pub fn load_state(&mut self, state: &Sh1State) {
        self.r = state.r;
        self.pc = state.pc;
        self.pr = state.pr;
        self.mac = state.mac;
        self.sr = state.sr;
        self.gbr = state.gbr;
        self.vbr = state.vbr;
        self.delay_slot = state.delay_slot;
        self.cycles_executed = state.cycles_executed;
        self.total_cycles = state.total_cycles;
        self.ram.copy_from_slice(&state.ram);
        self.sleep = state.sleep;
        self.nmi_latched = state.nmi_latched;
        self.peripherals = state.peripherals.clone();
    }
}

impl Default for Sh1 {
    fn default() -> Self {
        Self::new()
    }
}

/// Saveable snapshot of [`Sh1`]. Carries the ROM's
/// FNV-1a hash rather than the ROM image itself.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Sh1State {
    pub r: [u32; 16],
    pub pc: u32,
    pub pr: u32,
    pub mac: RegMac,
    pub sr: RegSr,
    pub gbr: u32,
    pub vbr: u32,
    pub delay_slot: DelaySlot,
    pub cycles_executed: u64,
    pub total_cycles: u64,
    pub ram: Vec<u8>,
    pub rom_hash: u64,
    pub sleep: bool,
    pub nmi_latched: bool,
    pub peripherals: peripherals::Peripherals,
}

fn read_be16(buf: &[u8], offset: usize) -> u16 {
    let a = buf[offset % buf.len().max(1)] as u16;
    let b = buf[(offset + 1) % buf.len().max(1)] as u16;
    (a << 8) | b
}

fn read_be32(buf: &[u8], offset: usize) -> u32 {
    let hi = read_be16(buf, offset) as u32;
    let lo = read_be16(buf, offset + 2) as u32;
    (hi << 16) | lo
}

fn write_be16(buf: &mut [u8], offset: usize, value: u16) {
    let len = buf.len().max(1);
    buf[offset % len] = (value >> 8) as u8;
    buf[(offset + 1) % len] = value as u8;
}

fn write_be32(buf: &mut [u8], offset: usize, value: u32) {
    write_be16(buf, offset, (value >> 16) as u16);
    write_be16(buf, offset + 2, value as u16);
}

/// Dependency-free 64-bit FNV-1a.
pub fn fnv1a_64(data: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;
    data.iter().fold(OFFSET_BASIS, |hash, &byte| (hash ^ byte as u64).wrapping_mul(PRIME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bus::FlatBus;

    fn reset_rom() -> Vec<u8> {
        let mut rom = vec![0u8; ROM_SIZE];
        // PC = 0, R15 = 0x2000 after reset.
        rom[0..4].copy_from_slice(&[0x00, 0x00, 0x00, 0x04]);
        rom[4..8].copy_from_slice(&[0x00, 0x00, 0x20, 0x00]);
        rom
    }

    #[test]
    fn reset_then_step_nop_advances_pc_by_two() {
        let mut sh1 = Sh1::new();
        sh1.load_rom(&reset_rom()).unwrap();
        sh1.hard_reset();
        assert_eq!(sh1.pc, 0);
        assert_eq!(sh1.r[15], 0x0000_2000);

        let mut bus = FlatBus::new(0x1000);
        let mut serial = ();
        // ROM at address 0 is 0x0000 (NOP in this crate's opcode table).
        sh1.step(&mut bus, &mut serial);
        assert_eq!(sh1.pc, 2);
    }

    #[test]
    fn interrupt_priority_accepts_higher_level_on_non_delay_boundary() {
        let mut sh1 = Sh1::new();
        sh1.load_rom(&reset_rom()).unwrap();
        sh1.hard_reset();
        sh1.sr.i_level = 4;
        sh1.vbr = 0x1000;

        sh1.peripherals.intc.configure_level(peripherals::intc::InterruptSource::Irq6, 5);
        sh1.peripherals.intc.raise(peripherals::intc::InterruptSource::Irq6);

        let mut bus = FlatBus::new(0x2000);
        let vector = sh1.peripherals.intc.vector_for(peripherals::intc::InterruptSource::Irq6);
        bus.write_u32(0x1000 + 4 * vector as u32, 0xdead_beef);

        sh1.step(&mut bus, &mut ());
        assert_eq!(sh1.pc, 0xdead_beef);
        assert_eq!(sh1.sr.i_level, 5);
    }

    #[test]
    fn delay_slot_defers_interrupt_acceptance() {
        let mut sh1 = Sh1::new();
        sh1.load_rom(&reset_rom()).unwrap();
        sh1.hard_reset();
        sh1.delay_slot = DelaySlot { active: true, target: 0x40 };
        sh1.peripherals.intc.configure_level(peripherals::intc::InterruptSource::Irq6, 1);
        sh1.peripherals.intc.raise(peripherals::intc::InterruptSource::Irq6);
        assert!(!sh1.interrupt_pending());
    }

    #[test]
    fn fnv1a_is_deterministic() {
        assert_eq!(fnv1a_64(b"saturn"), fnv1a_64(b"saturn"));
        assert_ne!(fnv1a_64(b"saturn"), fnv1a_64(b"satorn"));
    }
}
