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

//! Instruction bodies, grouped by category.

mod arithmetic;
mod branch;
mod data_transfer;
mod logical;
mod shift;
mod system;

use super::decode::{DecodedArgs, Mnemonic};
use super::Sh1;
use crate::core::bus::{Bus, SerialCallbacks};

/// General illegal-instruction exception vector; slot-illegal uses a
/// separate vector since it's raised only when a branch lands in a
/// delay slot.
pub const VEC_ILLEGAL_INSTRUCTION: u8 = 4;
pub const VEC_SLOT_ILLEGAL_INSTRUCTION: u8 = 6;
pub const VEC_TRAPA_BASE: u8 = 0x20;

pub(super) fn sign_extend(value: u32, bits: u32) -> i32 {
    let shift = 32 - bits;
    ((value << shift) as i32) >> shift
}

/// Dispatches one decoded instruction and returns its cycle cost.
pub fn execute(
    sh1: &mut Sh1,
    bus: &mut dyn Bus,
    serial: &mut dyn SerialCallbacks,
    mnemonic: Mnemonic,
    args: DecodedArgs,
    in_delay_slot: bool,
) -> u64 {
    use Mnemonic::*;

    match mnemonic {
        Illegal => {
            take_exception(sh1, bus, VEC_ILLEGAL_INSTRUCTION);
            5
        }

        Nop => 1,
        Sleep => system::sleep(sh1),
        Clrt => system::clrt(sh1),
        Sett => system::sett(sh1),
        Clrmac => system::clrmac(sh1),

        Mov => data_transfer::mov(sh1, args),
        Movbl => data_transfer::movbl(sh1, bus, args),
        Movwl => data_transfer::movwl(sh1, bus, args),
        Movll => data_transfer::movll(sh1, bus, args),
        Movbl0 => data_transfer::movbl0(sh1, bus, args),
        Movwl0 => data_transfer::movwl0(sh1, bus, args),
        Movll0 => data_transfer::movll0(sh1, bus, args),
        Movbl4 => data_transfer::movbl4(sh1, bus, args),
        Movwl4 => data_transfer::movwl4(sh1, bus, args),
        Movll4 => data_transfer::movll4(sh1, bus, args),
        Movblg => data_transfer::movblg(sh1, bus, args),
        Movwlg => data_transfer::movwlg(sh1, bus, args),
        Movllg => data_transfer::movllg(sh1, bus, args),
        Movbm => data_transfer::movbm(sh1, bus, args),
        Movwm => data_transfer::movwm(sh1, bus, args),
        Movlm => data_transfer::movlm(sh1, bus, args),
        Movbp => data_transfer::movbp(sh1, bus, args),
        Movwp => data_transfer::movwp(sh1, bus, args),
        Movlp => data_transfer::movlp(sh1, bus, args),
        Movbs => data_transfer::movbs(sh1, bus, args),
        Movws => data_transfer::movws(sh1, bus, args),
        Movls => data_transfer::movls(sh1, bus, args),
        Movbs0 => data_transfer::movbs0(sh1, bus, args),
        Movws0 => data_transfer::movws0(sh1, bus, args),
        Movls0 => data_transfer::movls0(sh1, bus, args),
        Movbs4 => data_transfer::movbs4(sh1, bus, args),
        Movws4 => data_transfer::movws4(sh1, bus, args),
        Movls4 => data_transfer::movls4(sh1, bus, args),
        Movbsg => data_transfer::movbsg(sh1, bus, args),
        Movwsg => data_transfer::movwsg(sh1, bus, args),
        Movlsg => data_transfer::movlsg(sh1, bus, args),
        Movi => data_transfer::movi(sh1, args),
        Movwi => data_transfer::movwi(sh1, bus, args),
        Movli => data_transfer::movli(sh1, bus, args),
        Mova => data_transfer::mova(sh1, args),
        Movt => data_transfer::movt(sh1, args),
        Extsb => data_transfer::extsb(sh1, args),
        Extsw => data_transfer::extsw(sh1, args),
        Extub => data_transfer::extub(sh1, args),
        Extuw => data_transfer::extuw(sh1, args),
        Swapb => data_transfer::swapb(sh1, args),
        Swapw => data_transfer::swapw(sh1, args),
        Xtrct => data_transfer::xtrct(sh1, args),

        Ldcgbr => system::ldcgbr(sh1, args),
        Ldcsr => system::ldcsr(sh1, args),
        Ldcvbr => system::ldcvbr(sh1, args),
        Ldsmach => system::ldsmach(sh1, args),
        Ldsmacl => system::ldsmacl(sh1, args),
        Ldspr => system::ldspr(sh1, args),
        Stcgbr => system::stcgbr(sh1, args),
        Stcsr => system::stcsr(sh1, args),
        Stcvbr => system::stcvbr(sh1, args),
        Stsmach => system::stsmach(sh1, args),
        Stsmacl => system::stsmacl(sh1, args),
        Stspr => system::stspr(sh1, args),
        Ldcmgbr => system::ldcmgbr(sh1, bus, args),
        Ldcmsr => system::ldcmsr(sh1, bus, args),
        Ldcmvbr => system::ldcmvbr(sh1, bus, args),
        Ldsmmach => system::ldsmmach(sh1, bus, args),
        Ldsmmacl => system::ldsmmacl(sh1, bus, args),
        Ldsmpr => system::ldsmpr(sh1, bus, args),
        Stcmgbr => system::stcmgbr(sh1, bus, args),
        Stcmsr => system::stcmsr(sh1, bus, args),
        Stcmvbr => system::stcmvbr(sh1, bus, args),
        Stsmmach => system::stsmmach(sh1, bus, args),
        Stsmmacl => system::stsmmacl(sh1, bus, args),
        Stsmpr => system::stsmpr(sh1, bus, args),
        Tas => system::tas(sh1, bus, args),

        Add => arithmetic::add(sh1, args),
        Addi => arithmetic::addi(sh1, args),
        Addc => arithmetic::addc(sh1, args),
        Addv => arithmetic::addv(sh1, args),
        Neg => arithmetic::neg(sh1, args),
        Negc => arithmetic::negc(sh1, args),
        Sub => arithmetic::sub(sh1, args),
        Subc => arithmetic::subc(sh1, args),
        Subv => arithmetic::subv(sh1, args),
        Macw => arithmetic::macw(sh1, bus, args),
        Macl => arithmetic::macl(sh1, bus, args),
        Muls => arithmetic::muls(sh1, args),
        Mulu => arithmetic::mulu(sh1, args),
        Div0s => arithmetic::div0s(sh1, args),
        Div0u => arithmetic::div0u(sh1),
        Div1 => arithmetic::div1(sh1, args),
        Cmpim => arithmetic::cmpim(sh1, args),
        Cmpeq => arithmetic::cmpeq(sh1, args),
        Cmpge => arithmetic::cmpge(sh1, args),
        Cmpgt => arithmetic::cmpgt(sh1, args),
        Cmphi => arithmetic::cmphi(sh1, args),
        Cmphs => arithmetic::cmphs(sh1, args),
        Cmppl => arithmetic::cmppl(sh1, args),
        Cmppz => arithmetic::cmppz(sh1, args),
        Cmpstr => arithmetic::cmpstr(sh1, args),

        And => logical::and(sh1, args),
        Andi => logical::andi(sh1, args),
        Andm => logical::andm(sh1, bus, args),
        Not => logical::not(sh1, args),
        Or => logical::or(sh1, args),
        Ori => logical::ori(sh1, args),
        Orm => logical::orm(sh1, bus, args),
        Xor => logical::xor(sh1, args),
        Xori => logical::xori(sh1, args),
        Xorm => logical::xorm(sh1, bus, args),
        Tst => logical::tst(sh1, args),
        Tsti => logical::tsti(sh1, args),
        Tstm => logical::tstm(sh1, bus, args),

        Rotcl => shift::rotcl(sh1, args),
        Rotcr => shift::rotcr(sh1, args),
        Rotl => shift::rotl(sh1, args),
        Rotr => shift::rotr(sh1, args),
        Shal => shift::shal(sh1, args),
        Shar => shift::shar(sh1, args),
        Shll => shift::shll(sh1, args),
        Shll2 => shift::shll2(sh1, args),
        Shll8 => shift::shll8(sh1, args),
        Shll16 => shift::shll16(sh1, args),
        Shlr => shift::shlr(sh1, args),
        Shlr2 => shift::shlr2(sh1, args),
        Shlr8 => shift::shlr8(sh1, args),
        Shlr16 => shift::shlr16(sh1, args),

        Bf => branch::bf(sh1, args, in_delay_slot, bus),
        Bfs => branch::bfs(sh1, args, in_delay_slot, bus),
        Bt => branch::bt(sh1, args, in_delay_slot, bus),
        Bts => branch::bts(sh1, args, in_delay_slot, bus),
        Bra => branch::bra(sh1, args, in_delay_slot, bus),
        Bsr => branch::bsr(sh1, args, in_delay_slot, bus),
        Jmp => branch::jmp(sh1, args, in_delay_slot, bus),
        Jsr => branch::jsr(sh1, args, in_delay_slot, bus),
        Trapa => branch::trapa(sh1, bus, args, in_delay_slot),
        Rte => branch::rte(sh1, bus, in_delay_slot),
        Rts => branch::rts(sh1, in_delay_slot, bus),
    }
}

/// Takes an exception at `vector`: pushes SR and PC, loads PC from the
/// vector table.
pub(super) fn take_exception(sh1: &mut Sh1, bus: &mut dyn Bus, vector: u8) {
    sh1.push(bus, sh1.sr.to_bits());
    sh1.push(bus, sh1.pc);
    sh1.pc = sh1.read_u32(bus, sh1.vbr.wrapping_add(4 * vector as u32));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bus::FlatBus;
    use crate::core::sh1::decode::decode;

    #[test]
    fn illegal_opcode_takes_illegal_instruction_vector() {
        let mut sh1 = Sh1::new();
        sh1.vbr = 0x1000;
        sh1.r[15] = 0x800;
        let mut bus = FlatBus::new(0x4000);
        bus.write_u32(0x1000 + 4 * VEC_ILLEGAL_INSTRUCTION as u32, 0x1234_5678);

        let (mnemonic, args) = decode(0xff00);
        execute(&mut sh1, &mut bus, &mut (), mnemonic, args, false);
        assert_eq!(sh1.pc, 0x1234_5678);
    }
}
