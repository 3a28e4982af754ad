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

//! Branch, subroutine and exception-entry/exit instructions.
//!
//! Every instruction here changes control flow, so none of them may
//! legally appear in another branch's delay slot; each checks
//! `in_delay_slot` first and raises a slot-illegal-instruction
//! exception instead of acting if it does.

use super::{take_exception, VEC_SLOT_ILLEGAL_INSTRUCTION, VEC_TRAPA_BASE};
use crate::core::bus::Bus;
use crate::core::sh1::decode::DecodedArgs;
use crate::core::sh1::Sh1;

fn displacement_target(sh1: &Sh1, args: DecodedArgs) -> u32 {
    let disp = super::sign_extend(args.imm8 as u32, 8);
    sh1.pc.wrapping_add(2).wrapping_add((disp * 2) as u32)
}

fn guard_delay_slot(sh1: &mut Sh1, bus: &mut dyn Bus, in_delay_slot: bool) -> Option<u64> {
    if in_delay_slot {
        take_exception(sh1, bus, VEC_SLOT_ILLEGAL_INSTRUCTION);
        Some(5)
    } else {
        None
    }
}

/// `BF`: branches immediately (no delay slot) when `T` is clear.
pub fn bf(sh1: &mut Sh1, args: DecodedArgs, in_delay_slot: bool, bus: &mut dyn Bus) -> u64 {
    if let Some(cost) = guard_delay_slot(sh1, bus, in_delay_slot) {
        return cost;
    }
    if !sh1.sr.t {
        sh1.pc = displacement_target(sh1, args);
        3
    } else {
        1
    }
}

/// `BT`: branches immediately (no delay slot) when `T` is set.
pub fn bt(sh1: &mut Sh1, args: DecodedArgs, in_delay_slot: bool, bus: &mut dyn Bus) -> u64 {
    if let Some(cost) = guard_delay_slot(sh1, bus, in_delay_slot) {
        return cost;
    }
    if sh1.sr.t {
        sh1.pc = displacement_target(sh1, args);
        3
    } else {
        1
    }
}

pub fn bfs(sh1: &mut Sh1, args: DecodedArgs, in_delay_slot: bool, bus: &mut dyn Bus) -> u64 {
    if let Some(cost) = guard_delay_slot(sh1, bus, in_delay_slot) {
        return cost;
    }
    if !sh1.sr.t {
        let target = displacement_target(sh1, args);
        sh1.setup_delay_slot(target);
    }
    1
}

pub fn bts(sh1: &mut Sh1, args: DecodedArgs, in_delay_slot: bool, bus: &mut dyn Bus) -> u64 {
    if let Some(cost) = guard_delay_slot(sh1, bus, in_delay_slot) {
        return cost;
    }
    if sh1.sr.t {
        let target = displacement_target(sh1, args);
        sh1.setup_delay_slot(target);
    }
    1
}

pub fn bra(sh1: &mut Sh1, args: DecodedArgs, in_delay_slot: bool, bus: &mut dyn Bus) -> u64 {
    if let Some(cost) = guard_delay_slot(sh1, bus, in_delay_slot) {
        return cost;
    }
    let target = displacement_target(sh1, args);
    sh1.setup_delay_slot(target);
    1
}

pub fn bsr(sh1: &mut Sh1, args: DecodedArgs, in_delay_slot: bool, bus: &mut dyn Bus) -> u64 {
    if let Some(cost) = guard_delay_slot(sh1, bus, in_delay_slot) {
        return cost;
    }
    let target = displacement_target(sh1, args);
    sh1.pr = sh1.pc.wrapping_add(2);
    sh1.setup_delay_slot(target);
    1
}

pub fn jmp(sh1: &mut Sh1, args: DecodedArgs, in_delay_slot: bool, bus: &mut dyn Bus) -> u64 {
    if let Some(cost) = guard_delay_slot(sh1, bus, in_delay_slot) {
        return cost;
    }
    let target = sh1.r[args.n as usize];
    sh1.setup_delay_slot(target);
    1
}

pub fn jsr(sh1: &mut Sh1, args: DecodedArgs, in_delay_slot: bool, bus: &mut dyn Bus) -> u64 {
    if let Some(cost) = guard_delay_slot(sh1, bus, in_delay_slot) {
        return cost;
    }
    let target = sh1.r[args.n as usize];
    sh1.pr = sh1.pc.wrapping_add(2);
    sh1.setup_delay_slot(target);
    1
}

/// `TRAPA #imm`: software exception, not a delayed instruction. The
/// trap vector is `VEC_TRAPA_BASE + imm`, following the common SH
/// convention of reserving the upper vector range for traps.
pub fn trapa(sh1: &mut Sh1, bus: &mut dyn Bus, args: DecodedArgs, in_delay_slot: bool) -> u64 {
    if let Some(cost) = guard_delay_slot(sh1, bus, in_delay_slot) {
        return cost;
    }
    take_exception(sh1, bus, VEC_TRAPA_BASE.wrapping_add(args.imm8));
    8
}

/// `RTE`: delayed return from exception. `SR` is restored immediately
/// (the delay slot still runs under the old interrupt mask per the
/// real ISA), `PC` redirection is deferred to the delay slot like any
/// other delayed branch.
pub fn rte(sh1: &mut Sh1, bus: &mut dyn Bus, in_delay_slot: bool) -> u64 {
    if let Some(cost) = guard_delay_slot(sh1, bus, in_delay_slot) {
        return cost;
    }
    let target = sh1.pop(bus);
    let sr_bits = sh1.pop(bus);
    sh1.sr = crate::core::sh1::RegSr::from_bits(sr_bits);
    sh1.setup_delay_slot(target);
    4
}

pub fn rts(sh1: &mut Sh1, in_delay_slot: bool, bus: &mut dyn Bus) -> u64 {
    if let Some(cost) = guard_delay_slot(sh1, bus, in_delay_slot) {
        return cost;
    }
    let target = sh1.pr;
    sh1.setup_delay_slot(target);
    2
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bus::FlatBus;

    #[test]
    fn bra_defers_branch_to_delay_slot() {
        let mut sh1 = Sh1::new();
        sh1.pc = 0x100;
        let mut bus = FlatBus::new(0x1000);
        let args = DecodedArgs { n: 0, m: 0, imm8: 4 };
        bra(&mut sh1, args, false, &mut bus);
        assert!(sh1.in_delay_slot());
    }

    #[test]
    fn branch_in_delay_slot_raises_slot_illegal() {
        let mut sh1 = Sh1::new();
        sh1.vbr = 0x1000;
        sh1.r[15] = 0x800;
        let mut bus = FlatBus::new(0x4000);
        bus.write_u32(0x1000 + 4 * VEC_SLOT_ILLEGAL_INSTRUCTION as u32, 0xbaad_f00d);
        let args = DecodedArgs { n: 0, m: 0, imm8: 4 };
        bra(&mut sh1, args, true, &mut bus);
        assert_eq!(sh1.pc, 0xbaad_f00d);
    }

    #[test]
    fn jsr_sets_pr_to_post_delay_slot_address() {
        let mut sh1 = Sh1::new();
        sh1.pc = 0x200;
        sh1.r[4] = 0x9000;
        let mut bus = FlatBus::new(0x1000);
        let args = DecodedArgs { n: 4, m: 0, imm8: 0 };
        jsr(&mut sh1, args, false, &mut bus);
        assert_eq!(sh1.pr, 0x202);
        assert!(sh1.in_delay_slot());
    }
}
