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

//! Control-register transfer (`LDC`/`STC`/`LDS`/`STS`), `TAS.B` and
//! miscellaneous status instructions.

use crate::core::bus::Bus;
use crate::core::sh1::decode::DecodedArgs;
use crate::core::sh1::{RegMac, RegSr, Sh1};

pub fn sleep(sh1: &mut Sh1) -> u64 {
    sh1.sleep = true;
    3
}

pub fn clrt(sh1: &mut Sh1) -> u64 {
    sh1.sr.t = false;
    1
}

pub fn sett(sh1: &mut Sh1) -> u64 {
    sh1.sr.t = true;
    1
}

pub fn clrmac(sh1: &mut Sh1) -> u64 {
    sh1.mac = RegMac::default();
    1
}

pub fn ldcgbr(sh1: &mut Sh1, args: DecodedArgs) -> u64 {
    sh1.gbr = sh1.r[args.m as usize];
    1
}

pub fn ldcsr(sh1: &mut Sh1, args: DecodedArgs) -> u64 {
    sh1.sr = RegSr::from_bits(sh1.r[args.m as usize]);
    1
}

pub fn ldcvbr(sh1: &mut Sh1, args: DecodedArgs) -> u64 {
    sh1.vbr = sh1.r[args.m as usize];
    1
}

pub fn ldsmach(sh1: &mut Sh1, args: DecodedArgs) -> u64 {
    sh1.mac.mach = sh1.r[args.m as usize];
    1
}

pub fn ldsmacl(sh1: &mut Sh1, args: DecodedArgs) -> u64 {
    sh1.mac.macl = sh1.r[args.m as usize];
    1
}

pub fn ldspr(sh1: &mut Sh1, args: DecodedArgs) -> u64 {
    sh1.pr = sh1.r[args.m as usize];
    1
}

pub fn stcgbr(sh1: &mut Sh1, args: DecodedArgs) -> u64 {
    sh1.r[args.n as usize] = sh1.gbr;
    1
}

pub fn stcsr(sh1: &mut Sh1, args: DecodedArgs) -> u64 {
    sh1.r[args.n as usize] = sh1.sr.to_bits();
    1
}

pub fn stcvbr(sh1: &mut Sh1, args: DecodedArgs) -> u64 {
    sh1.r[args.n as usize] = sh1.vbr;
    1
}

pub fn stsmach(sh1: &mut Sh1, args: DecodedArgs) -> u64 {
    sh1.r[args.n as usize] = sh1.mac.mach;
    1
}

pub fn stsmacl(sh1: &mut Sh1, args: DecodedArgs) -> u64 {
    sh1.r[args.n as usize] = sh1.mac.macl;
    1
}

pub fn stspr(sh1: &mut Sh1, args: DecodedArgs) -> u64 {
    sh1.r[args.n as usize] = sh1.pr;
    1
}

pub fn ldcmgbr(sh1: &mut Sh1, bus: &mut dyn Bus, args: DecodedArgs) -> u64 {
    let addr = sh1.r[args.m as usize];
    sh1.gbr = sh1.read_u32(bus, addr);
    sh1.r[args.m as usize] = addr.wrapping_add(4);
    3
}

pub fn ldcmsr(sh1: &mut Sh1, bus: &mut dyn Bus, args: DecodedArgs) -> u64 {
    let addr = sh1.r[args.m as usize];
    let bits = sh1.read_u32(bus, addr);
    sh1.sr = RegSr::from_bits(bits);
    sh1.r[args.m as usize] = addr.wrapping_add(4);
    3
}

pub fn ldcmvbr(sh1: &mut Sh1, bus: &mut dyn Bus, args: DecodedArgs) -> u64 {
    let addr = sh1.r[args.m as usize];
    sh1.vbr = sh1.read_u32(bus, addr);
    sh1.r[args.m as usize] = addr.wrapping_add(4);
    3
}

pub fn ldsmmach(sh1: &mut Sh1, bus: &mut dyn Bus, args: DecodedArgs) -> u64 {
    let addr = sh1.r[args.m as usize];
    sh1.mac.mach = sh1.read_u32(bus, addr);
    sh1.r[args.m as usize] = addr.wrapping_add(4);
    1
}

pub fn ldsmmacl(sh1: &mut Sh1, bus: &mut dyn Bus, args: DecodedArgs) -> u64 {
    let addr = sh1.r[args.m as usize];
    sh1.mac.macl = sh1.read_u32(bus, addr);
    sh1.r[args.m as usize] = addr.wrapping_add(4);
    1
}

pub fn ldsmpr(sh1: &mut Sh1, bus: &mut dyn Bus, args: DecodedArgs) -> u64 {
    let addr = sh1.r[args.m as usize];
    sh1.pr = sh1.read_u32(bus, addr);
    sh1.r[args.m as usize] = addr.wrapping_add(4);
    2
}

pub fn stcmgbr(sh1: &mut Sh1, bus: &mut dyn Bus, args: DecodedArgs) -> u64 {
    let addr = sh1.r[args.n as usize].wrapping_sub(4);
    sh1.write_u32(bus, addr, sh1.gbr);
    sh1.r[args.n as usize] = addr;
    2
}

pub fn stcmsr(sh1: &mut Sh1, bus: &mut dyn Bus, args: DecodedArgs) -> u64 {
    let addr = sh1.r[args.n as usize].wrapping_sub(4);
    sh1.write_u32(bus, addr, sh1.sr.to_bits());
    sh1.r[args.n as usize] = addr;
    2
}

pub fn stcmvbr(sh1: &mut Sh1, bus: &mut dyn Bus, args: DecodedArgs) -> u64 {
    let addr = sh1.r[args.n as usize].wrapping_sub(4);
    sh1.write_u32(bus, addr, sh1.vbr);
    sh1.r[args.n as usize] = addr;
    2
}

pub fn stsmmach(sh1: &mut Sh1, bus: &mut dyn Bus, args: DecodedArgs) -> u64 {
    let addr = sh1.r[args.n as usize].wrapping_sub(4);
    sh1.write_u32(bus, addr, sh1.mac.mach);
    sh1.r[args.n as usize] = addr;
    1
}

pub fn stsmmacl(sh1: &mut Sh1, bus: &mut dyn Bus, args: DecodedArgs) -> u64 {
    let addr = sh1.r[args.n as usize].wrapping_sub(4);
    sh1.write_u32(bus, addr, sh1.mac.macl);
    sh1.r[args.n as usize] = addr;
    1
}

pub fn stsmpr(sh1: &mut Sh1, bus: &mut dyn Bus, args: DecodedArgs) -> u64 {
    let addr = sh1.r[args.n as usize].wrapping_sub(4);
    sh1.write_u32(bus, addr, sh1.pr);
    sh1.r[args.n as usize] = addr;
    1
}

/// `TAS.B @Rn`: reads the byte, sets `T` if it was zero, then
/// unconditionally writes back `0x80` (the real ISA's read-modify-write
/// is indivisible on hardware; this core has no concurrent bus access
/// to race against, so a plain read-then-write is equivalent).
pub fn tas(sh1: &mut Sh1, bus: &mut dyn Bus, args: DecodedArgs) -> u64 {
    let addr = sh1.r[args.n as usize];
    let value = sh1.read_u8(bus, addr);
    sh1.sr.t = value == 0;
    sh1.write_u8(bus, addr, 0x80);
    4
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bus::FlatBus;

    #[test]
    fn sleep_sets_asleep_flag() {
        let mut sh1 = Sh1::new();
        sleep(&mut sh1);
        assert!(sh1.is_asleep());
    }

    #[test]
    fn tas_sets_t_on_zero_byte_and_writes_0x80() {
        let mut sh1 = Sh1::new();
        let mut bus = FlatBus::new(0x100);
        sh1.r[1] = 0x10;
        let args = DecodedArgs { n: 1, m: 0, imm8: 0 };
        tas(&mut sh1, &mut bus, args);
        assert!(sh1.sr.t);
        assert_eq!(bus.read_u8(0x10), 0x80);
    }

    #[test]
    fn stcmsr_predecrements_then_stores() {
        let mut sh1 = Sh1::new();
        let mut bus = FlatBus::new(0x100);
        sh1.r[2] = 0x20;
        sh1.sr.t = true;
        let args = DecodedArgs { n: 2, m: 0, imm8: 0 };
        stcmsr(&mut sh1, &mut bus, args);
        assert_eq!(sh1.r[2], 0x1c);
        assert_eq!(bus.read_u32(0x1c), sh1.sr.to_bits());
    }
}
