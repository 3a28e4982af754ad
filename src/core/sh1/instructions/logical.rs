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

//! Bitwise AND/OR/XOR/TST, register and GBR-indexed memory forms.

use crate::core::bus::Bus;
use crate::core::sh1::decode::DecodedArgs;
use crate::core::sh1::Sh1;

pub fn and(sh1: &mut Sh1, args: DecodedArgs) -> u64 {
    sh1.r[args.n as usize] &= sh1.r[args.m as usize];
    1
}

pub fn andi(sh1: &mut Sh1, args: DecodedArgs) -> u64 {
    sh1.r[0] &= args.imm8 as u32;
    1
}

pub fn andm(sh1: &mut Sh1, bus: &mut dyn Bus, args: DecodedArgs) -> u64 {
    let addr = sh1.gbr.wrapping_add(sh1.r[0]);
    let value = sh1.read_u8(bus, addr) & args.imm8;
    sh1.write_u8(bus, addr, value);
    3
}

pub fn not(sh1: &mut Sh1, args: DecodedArgs) -> u64 {
    sh1.r[args.n as usize] = !sh1.r[args.m as usize];
    1
}

pub fn or(sh1: &mut Sh1, args: DecodedArgs) -> u64 {
    sh1.r[args.n as usize] |= sh1.r[args.m as usize];
    1
}

pub fn ori(sh1: &mut Sh1, args: DecodedArgs) -> u64 {
    sh1.r[0] |= args.imm8 as u32;
    1
}

pub fn orm(sh1: &mut Sh1, bus: &mut dyn Bus, args: DecodedArgs) -> u64 {
    let addr = sh1.gbr.wrapping_add(sh1.r[0]);
    let value = sh1.read_u8(bus, addr) | args.imm8;
    sh1.write_u8(bus, addr, value);
    3
}

pub fn xor(sh1: &mut Sh1, args: DecodedArgs) -> u64 {
    sh1.r[args.n as usize] ^= sh1.r[args.m as usize];
    1
}

pub fn xori(sh1: &mut Sh1, args: DecodedArgs) -> u64 {
    sh1.r[0] ^= args.imm8 as u32;
    1
}

pub fn xorm(sh1: &mut Sh1, bus: &mut dyn Bus, args: DecodedArgs) -> u64 {
    let addr = sh1.gbr.wrapping_add(sh1.r[0]);
    let value = sh1.read_u8(bus, addr) ^ args.imm8;
    sh1.write_u8(bus, addr, value);
    3
}

pub fn tst(sh1: &mut Sh1, args: DecodedArgs) -> u64 {
    sh1.sr.t = sh1.r[args.n as usize] & sh1.r[args.m as usize] == 0;
    1
}

pub fn tsti(sh1: &mut Sh1, args: DecodedArgs) -> u64 {
    sh1.sr.t = sh1.r[0] & args.imm8 as u32 == 0;
    1
}

pub fn tstm(sh1: &mut Sh1, bus: &mut dyn Bus, args: DecodedArgs) -> u64 {
    let addr = sh1.gbr.wrapping_add(sh1.r[0]);
    let value = sh1.read_u8(bus, addr);
    sh1.sr.t = value & args.imm8 == 0;
    3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tst_sets_t_when_disjoint() {
        let mut sh1 = Sh1::new();
        sh1.r[1] = 0x0f0;
        sh1.r[2] = 0x00f;
        let args = DecodedArgs { n: 1, m: 2, imm8: 0 };
        tst(&mut sh1, args);
        assert!(sh1.sr.t);
    }

    #[test]
    fn not_inverts_all_bits() {
        let mut sh1 = Sh1::new();
        sh1.r[1] = 0;
        let args = DecodedArgs { n: 2, m: 1, imm8: 0 };
        not(&mut sh1, args);
        assert_eq!(sh1.r[2], 0xffff_ffff);
    }
}
