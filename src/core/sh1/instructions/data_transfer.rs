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

//! MOV family and register-extraction instructions.
//!
//! The displacement forms (`@(disp,Rm)`, `@(disp,GBR)`, `@(disp,PC)`)
//! don't carry a separate register field for the 12-bit real-hardware
//! encodings that need one; this crate's 8-bit operand only has room
//! for one register plus a displacement, so the long-form displacement
//! MOVs below fold onto the same `disp`/`Rm`/R0 shape as the byte/word
//! forms rather than hardware's wider `disp,Rm,Rn` layout.

use super::sign_extend;
use crate::core::bus::Bus;
use crate::core::sh1::decode::DecodedArgs;
use crate::core::sh1::Sh1;

pub fn mov(sh1: &mut Sh1, args: DecodedArgs) -> u64 {
    sh1.r[args.n as usize] = sh1.r[args.m as usize];
    1
}

pub fn movbl(sh1: &mut Sh1, bus: &mut dyn Bus, args: DecodedArgs) -> u64 {
    let addr = sh1.r[args.m as usize];
    let value = sh1.read_u8(bus, addr);
    sh1.r[args.n as usize] = sign_extend(value as u32, 8) as u32;
    1
}

pub fn movwl(sh1: &mut Sh1, bus: &mut dyn Bus, args: DecodedArgs) -> u64 {
    let addr = sh1.r[args.m as usize];
    let value = sh1.read_u16(bus, addr);
    sh1.r[args.n as usize] = sign_extend(value as u32, 16) as u32;
    1
}

pub fn movll(sh1: &mut Sh1, bus: &mut dyn Bus, args: DecodedArgs) -> u64 {
    let addr = sh1.r[args.m as usize];
    sh1.r[args.n as usize] = sh1.read_u32(bus, addr);
    1
}

pub fn movbl0(sh1: &mut Sh1, bus: &mut dyn Bus, args: DecodedArgs) -> u64 {
    let addr = sh1.r[args.m as usize].wrapping_add(sh1.r[0]);
    let value = sh1.read_u8(bus, addr);
    sh1.r[args.n as usize] = sign_extend(value as u32, 8) as u32;
    1
}

pub fn movwl0(sh1: &mut Sh1, bus: &mut dyn Bus, args: DecodedArgs) -> u64 {
    let addr = sh1.r[args.m as usize].wrapping_add(sh1.r[0]);
    let value = sh1.read_u16(bus, addr);
    sh1.r[args.n as usize] = sign_extend(value as u32, 16) as u32;
    1
}

pub fn movll0(sh1: &mut Sh1, bus: &mut dyn Bus, args: DecodedArgs) -> u64 {
    let addr = sh1.r[args.m as usize].wrapping_add(sh1.r[0]);
    sh1.r[args.n as usize] = sh1.read_u32(bus, addr);
    1
}

/// `MOV.B @(disp,Rm),R0`: `n` carries the 4-bit displacement, `m` the
/// base register; the loaded value always lands in R0.
pub fn movbl4(sh1: &mut Sh1, bus: &mut dyn Bus, args: DecodedArgs) -> u64 {
    let addr = sh1.r[args.m as usize].wrapping_add(args.n as u32);
    let value = sh1.read_u8(bus, addr);
    sh1.r[0] = sign_extend(value as u32, 8) as u32;
    1
}

pub fn movwl4(sh1: &mut Sh1, bus: &mut dyn Bus, args: DecodedArgs) -> u64 {
    let addr = sh1.r[args.m as usize].wrapping_add((args.n as u32) * 2);
    let value = sh1.read_u16(bus, addr);
    sh1.r[0] = sign_extend(value as u32, 16) as u32;
    1
}

pub fn movll4(sh1: &mut Sh1, bus: &mut dyn Bus, args: DecodedArgs) -> u64 {
    let addr = sh1.r[args.m as usize].wrapping_add((args.n as u32) * 4);
    sh1.r[0] = sh1.read_u32(bus, addr);
    1
}

pub fn movblg(sh1: &mut Sh1, bus: &mut dyn Bus, args: DecodedArgs) -> u64 {
    let addr = sh1.gbr.wrapping_add(args.imm8 as u32);
    let value = sh1.read_u8(bus, addr);
    sh1.r[0] = sign_extend(value as u32, 8) as u32;
    1
}

pub fn movwlg(sh1: &mut Sh1, bus: &mut dyn Bus, args: DecodedArgs) -> u64 {
    let addr = sh1.gbr.wrapping_add((args.imm8 as u32) * 2);
    let value = sh1.read_u16(bus, addr);
    sh1.r[0] = sign_extend(value as u32, 16) as u32;
    1
}

pub fn movllg(sh1: &mut Sh1, bus: &mut dyn Bus, args: DecodedArgs) -> u64 {
    let addr = sh1.gbr.wrapping_add((args.imm8 as u32) * 4);
    sh1.r[0] = sh1.read_u32(bus, addr);
    1
}

pub fn movbm(sh1: &mut Sh1, bus: &mut dyn Bus, args: DecodedArgs) -> u64 {
    let addr = sh1.r[args.n as usize].wrapping_sub(1);
    sh1.write_u8(bus, addr, sh1.r[args.m as usize] as u8);
    sh1.r[args.n as usize] = addr;
    1
}

pub fn movwm(sh1: &mut Sh1, bus: &mut dyn Bus, args: DecodedArgs) -> u64 {
    let addr = sh1.r[args.n as usize].wrapping_sub(2);
    sh1.write_u16(bus, addr, sh1.r[args.m as usize] as u16);
    sh1.r[args.n as usize] = addr;
    1
}

pub fn movlm(sh1: &mut Sh1, bus: &mut dyn Bus, args: DecodedArgs) -> u64 {
    let addr = sh1.r[args.n as usize].wrapping_sub(4);
    sh1.write_u32(bus, addr, sh1.r[args.m as usize]);
    sh1.r[args.n as usize] = addr;
    1
}

pub fn movbp(sh1: &mut Sh1, bus: &mut dyn Bus, args: DecodedArgs) -> u64 {
    let addr = sh1.r[args.m as usize];
    let value = sh1.read_u8(bus, addr);
    sh1.r[args.n as usize] = sign_extend(value as u32, 8) as u32;
    if args.n != args.m {
        sh1.r[args.m as usize] = addr.wrapping_add(1);
    }
    1
}

pub fn movwp(sh1: &mut Sh1, bus: &mut dyn Bus, args: DecodedArgs) -> u64 {
    let addr = sh1.r[args.m as usize];
    let value = sh1.read_u16(bus, addr);
    sh1.r[args.n as usize] = sign_extend(value as u32, 16) as u32;
    if args.n != args.m {
        sh1.r[args.m as usize] = addr.wrapping_add(2);
    }
    1
}

pub fn movlp(sh1: &mut Sh1, bus: &mut dyn Bus, args: DecodedArgs) -> u64 {
    let addr = sh1.r[args.m as usize];
    sh1.r[args.n as usize] = sh1.read_u32(bus, addr);
    if args.n != args.m {
        sh1.r[args.m as usize] = addr.wrapping_add(4);
    }
    1
}

pub fn movbs(sh1: &mut Sh1, bus: &mut dyn Bus, args: DecodedArgs) -> u64 {
    let addr = sh1.r[args.n as usize];
    sh1.write_u8(bus, addr, sh1.r[args.m as usize] as u8);
    1
}

pub fn movws(sh1: &mut Sh1, bus: &mut dyn Bus, args: DecodedArgs) -> u64 {
    let addr = sh1.r[args.n as usize];
    sh1.write_u16(bus, addr, sh1.r[args.m as usize] as u16);
    1
}

pub fn movls(sh1: &mut Sh1, bus: &mut dyn Bus, args: DecodedArgs) -> u64 {
    let addr = sh1.r[args.n as usize];
    sh1.write_u32(bus, addr, sh1.r[args.m as usize]);
    1
}

pub fn movbs0(sh1: &mut Sh1, bus: &mut dyn Bus, args: DecodedArgs) -> u64 {
    let addr = sh1.r[args.n as usize].wrapping_add(sh1.r[0]);
    sh1.write_u8(bus, addr, sh1.r[args.m as usize] as u8);
    1
}

pub fn movws0(sh1: &mut Sh1, bus: &mut dyn Bus, args: DecodedArgs) -> u64 {
    let addr = sh1.r[args.n as usize].wrapping_add(sh1.r[0]);
    sh1.write_u16(bus, addr, sh1.r[args.m as usize] as u16);
    1
}

pub fn movls0(sh1: &mut Sh1, bus: &mut dyn Bus, args: DecodedArgs) -> u64 {
    let addr = sh1.r[args.n as usize].wrapping_add(sh1.r[0]);
    sh1.write_u32(bus, addr, sh1.r[args.m as usize]);
    1
}

pub fn movbs4(sh1: &mut Sh1, bus: &mut dyn Bus, args: DecodedArgs) -> u64 {
    let addr = sh1.r[args.m as usize].wrapping_add(args.n as u32);
    sh1.write_u8(bus, addr, sh1.r[0] as u8);
    1
}

pub fn movws4(sh1: &mut Sh1, bus: &mut dyn Bus, args: DecodedArgs) -> u64 {
    let addr = sh1.r[args.m as usize].wrapping_add((args.n as u32) * 2);
    sh1.write_u16(bus, addr, sh1.r[0] as u16);
    1
}

pub fn movls4(sh1: &mut Sh1, bus: &mut dyn Bus, args: DecodedArgs) -> u64 {
    let addr = sh1.r[args.m as usize].wrapping_add((args.n as u32) * 4);
    sh1.write_u32(bus, addr, sh1.r[0]);
    1
}

pub fn movbsg(sh1: &mut Sh1, bus: &mut dyn Bus, args: DecodedArgs) -> u64 {
    let addr = sh1.gbr.wrapping_add(args.imm8 as u32);
    sh1.write_u8(bus, addr, sh1.r[0] as u8);
    1
}

pub fn movwsg(sh1: &mut Sh1, bus: &mut dyn Bus, args: DecodedArgs) -> u64 {
    let addr = sh1.gbr.wrapping_add((args.imm8 as u32) * 2);
    sh1.write_u16(bus, addr, sh1.r[0] as u16);
    1
}

pub fn movlsg(sh1: &mut Sh1, bus: &mut dyn Bus, args: DecodedArgs) -> u64 {
    let addr = sh1.gbr.wrapping_add((args.imm8 as u32) * 4);
    sh1.write_u32(bus, addr, sh1.r[0]);
    1
}

pub fn movi(sh1: &mut Sh1, args: DecodedArgs) -> u64 {
    sh1.r[args.n as usize] = sign_extend(args.imm8 as u32, 8) as u32;
    1
}

pub fn movwi(sh1: &mut Sh1, bus: &mut dyn Bus, args: DecodedArgs) -> u64 {
    let addr = sh1.pc.wrapping_add((args.imm8 as u32) * 2);
    let value = sh1.read_u16(bus, addr);
    sh1.r[args.n as usize] = sign_extend(value as u32, 16) as u32;
    1
}

pub fn movli(sh1: &mut Sh1, bus: &mut dyn Bus, args: DecodedArgs) -> u64 {
    let addr = (sh1.pc & !3).wrapping_add((args.imm8 as u32) * 4);
    sh1.r[args.n as usize] = sh1.read_u32(bus, addr);
    1
}

pub fn mova(sh1: &mut Sh1, args: DecodedArgs) -> u64 {
    sh1.r[0] = (sh1.pc & !3).wrapping_add((args.imm8 as u32) * 4);
    1
}

pub fn movt(sh1: &mut Sh1, args: DecodedArgs) -> u64 {
    sh1.r[args.n as usize] = sh1.sr.t as u32;
    1
}

pub fn extsb(sh1: &mut Sh1, args: DecodedArgs) -> u64 {
    sh1.r[args.n as usize] = sign_extend(sh1.r[args.m as usize] & 0xff, 8) as u32;
    1
}

pub fn extsw(sh1: &mut Sh1, args: DecodedArgs) -> u64 {
    sh1.r[args.n as usize] = sign_extend(sh1.r[args.m as usize] & 0xffff, 16) as u32;
    1
}

pub fn extub(sh1: &mut Sh1, args: DecodedArgs) -> u64 {
    sh1.r[args.n as usize] = sh1.r[args.m as usize] & 0xff;
    1
}

pub fn extuw(sh1: &mut Sh1, args: DecodedArgs) -> u64 {
    sh1.r[args.n as usize] = sh1.r[args.m as usize] & 0xffff;
    1
}

pub fn swapb(sh1: &mut Sh1, args: DecodedArgs) -> u64 {
    let value = sh1.r[args.m as usize];
    sh1.r[args.n as usize] = (value & 0xffff_0000) | ((value & 0xff) << 8) | ((value >> 8) & 0xff);
    1
}

pub fn swapw(sh1: &mut Sh1, args: DecodedArgs) -> u64 {
    let value = sh1.r[args.m as usize];
    sh1.r[args.n as usize] = (value << 16) | (value >> 16);
    1
}

pub fn xtrct(sh1: &mut Sh1, args: DecodedArgs) -> u64 {
    let rn = sh1.r[args.n as usize];
    let rm = sh1.r[args.m as usize];
    sh1.r[args.n as usize] = (rn >> 16) | (rm << 16);
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bus::FlatBus;

    #[test]
    fn movi_sign_extends_negative_immediate() {
        let mut sh1 = Sh1::new();
        let args = DecodedArgs {
            n: 3,
            m: 0,
            imm8: 0xff,
        };
        movi(&mut sh1, args);
        assert_eq!(sh1.r[3], 0xffff_ffff);
    }

    #[test]
    fn movlp_post_increments_pointer_register() {
        let mut sh1 = Sh1::new();
        let mut bus = FlatBus::new(0x100);
        sh1.r[1] = 0x10;
        bus.write_u32(0x10, 0xcafe_babe);
        let args = DecodedArgs {
            n: 2,
            m: 1,
            imm8: 0,
        };
        movlp(&mut sh1, &mut bus, args);
        assert_eq!(sh1.r[2], 0xcafe_babe);
        assert_eq!(sh1.r[1], 0x14);
    }

    #[test]
    fn swapw_swaps_halfwords() {
        let mut sh1 = Sh1::new();
        sh1.r[1] = 0x1234_5678;
        let args = DecodedArgs {
            n: 2,
            m: 1,
            imm8: 0,
        };
        swapw(&mut sh1, args);
        assert_eq!(sh1.r[2], 0x5678_1234);
    }
}
