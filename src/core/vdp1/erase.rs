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

//! Cycle-budgeted framebuffer erase: clearing the
//! non-displayed framebuffer to `erase_value` over `erase_rect`,
//! spending at most one pixel of budget per cycle so a large erase
//! rectangle can span multiple calls.

use super::{Vdp1, FB_WIDTH};

/// Advances the pending erase for `vdp1` by up to `budget` pixels.
/// Returns `true` once the erase rectangle has been fully cleared
/// (or if no erase was pending). Remaining work resumes on the next
/// call with whatever budget is left.
pub fn advance_erase(vdp1: &mut Vdp1, budget: u32) -> bool {
    let Some(remaining) = vdp1.erase_cycles_remaining else {
        return true;
    };

    let total = vdp1.erase_pixel_count();
    if total == 0 {
        vdp1.erase_cycles_remaining = None;
        return true;
    }

    let done_so_far = total - remaining;
    let to_process = budget.min(remaining);
    let value = vdp1.erase_value;
    let rect = vdp1.erase_rect;
    let fb = vdp1.draw_framebuffer_mut();

    let width = (rect.x1 - rect.x0 + 1).max(0) as u32;
    for offset in done_so_far..done_so_far + to_process {
        if width == 0 {
            break;
        }
        let dx = (offset % width) as i32;
        let dy = (offset / width) as i32;
        let x = rect.x0 + dx;
        let y = rect.y0 + dy;
        if x < 0 || y < 0 || x as usize >= FB_WIDTH {
            continue;
        }
        let idx = y as usize * FB_WIDTH + x as usize;
        if let Some(pixel) = fb.get_mut(idx) {
            *pixel = value;
        }
    }

    let new_remaining = remaining - to_process;
    if new_remaining == 0 {
        vdp1.erase_cycles_remaining = None;
        true
    } else {
        vdp1.erase_cycles_remaining = Some(new_remaining);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::vdp1::Rect;

    #[test]
    fn erase_completes_within_budget() {
        let mut vdp1 = Vdp1::new();
        vdp1.draw_framebuffer_mut().iter_mut().for_each(|p| *p = 0xffff);
        vdp1.erase_rect = Rect { x0: 0, y0: 0, x1: 9, y1: 9 };
        vdp1.erase_value = 0;
        vdp1.fbcr.fce = true;
        vdp1.on_vblank_out(&mut ());

        let finished = advance_erase(&mut vdp1, 1000);
        assert!(finished);
        for y in 0..10 {
            for x in 0..10 {
                assert_eq!(vdp1.draw_framebuffer()[y * FB_WIDTH + x], 0);
            }
        }
    }

    #[test]
    fn erase_resumes_across_multiple_budget_limited_calls() {
        let mut vdp1 = Vdp1::new();
        vdp1.draw_framebuffer_mut().iter_mut().for_each(|p| *p = 0xffff);
        vdp1.erase_rect = Rect { x0: 0, y0: 0, x1: 9, y1: 9 };
        vdp1.erase_value = 0;
        vdp1.fbcr.fce = true;
        vdp1.on_vblank_out(&mut ());

        assert!(!advance_erase(&mut vdp1, 50));
        assert!(advance_erase(&mut vdp1, 50));
        for y in 0..10 {
            for x in 0..10 {
                assert_eq!(vdp1.draw_framebuffer()[y * FB_WIDTH + x], 0);
            }
        }
    }

    #[test]
    fn no_pending_erase_is_immediately_done() {
        let mut vdp1 = Vdp1::new();
        assert!(advance_erase(&mut vdp1, 10));
    }
}
