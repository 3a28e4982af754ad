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

//! Edge-stepper quadrilateral rasteriser: two synchronised edge walks
//! (A→D and B→C) connected by scanlines, each scanline itself walked
//! with a [`LineStepper`],
//! with a texture-U stepper advancing in lockstep and gouraud colours
//! interpolated across both axes.

use super::line::LineStepper;

/// The four corners of a VDP1 quad command, in VDP1 vertex order
/// A, B, C, D (A/D form the left edge, B/C the right edge).
#[derive(Debug, Clone, Copy, Default)]
pub struct Quad {
    pub a: (i32, i32),
    pub b: (i32, i32),
    pub c: (i32, i32),
    pub d: (i32, i32),
}

/// One rasterised span: a horizontal (or near-horizontal) run between
/// the two edge walkers at a particular scanline, along with texture
/// U-coordinate endpoints and gouraud colour endpoints to interpolate
/// across the span.
#[derive(Debug, Clone, Copy)]
pub struct QuadSpan {
    pub y: i32,
    pub x0: i32,
    pub x1: i32,
    /// Texture U coordinate at `x0` and `x1`, for the texture stepper.
    pub u0: u32,
    pub u1: u32,
    /// Gouraud colour (RGB555) at `x0` and `x1`.
    pub color0: (u8, u8, u8),
    pub color1: (u8, u8, u8),
}

/// Drives the two synchronised edge walks of a quad. The left edge
/// walks A→D, the right edge walks B→C; both are stepped by however
/// many sub-steps it takes the shorter edge to reach the next
/// scanline, matching hardware's simultaneous-edge-advance behaviour.
pub struct QuadStepper {
    left: LineStepper,
    right: LineStepper,
    left_len: u32,
    right_len: u32,
    left_index: u32,
    right_index: u32,
    left_point: (i32, i32),
    right_point: (i32, i32),
    texture_width: u32,
    gouraud: [(u8, u8, u8); 4],
    done: bool,
}

impl QuadStepper {
    /// Builds a stepper for `quad`, with `texture_width` texels used
    /// to interpolate the per-span U range, and `gouraud` colours
    /// given in A, B, C, D order.
    pub fn new(quad: Quad, texture_width: u32, gouraud: [(u8, u8, u8); 4]) -> Self {
        let left = LineStepper::new(quad.a.0, quad.a.1, quad.d.0, quad.d.1);
        let right = LineStepper::new(quad.b.0, quad.b.1, quad.c.0, quad.c.1);
        let left_len = left.length.max(1);
        let right_len = right.length.max(1);
        Self {
            left,
            right,
            left_len,
            right_len,
            left_index: 0,
            right_index: 0,
            left_point: quad.a,
            right_point: quad.b,
            texture_width,
            gouraud,
            done: false,
        }
    }

    /// Advances both edges by one scanline and returns the resulting
    /// span, or `None` once either edge runs out of steps (the
    /// in-bounds→out-of-bounds termination rule).
    pub fn next_span(&mut self) -> Option<QuadSpan> {
        if self.done {
            return None;
        }

        let left_step = self.left.next(false, self.left_index);
        let right_step = self.right.next(false, self.right_index);

        let (Some(left_step), Some(right_step)) = (left_step, right_step) else {
            self.done = true;
            return None;
        };

        self.left_point = (left_step.x, left_step.y);
        self.right_point = (right_step.x, right_step.y);

        let t_left = left_step.index as f32 / self.left_len as f32;
        let t_right = right_step.index as f32 / self.right_len as f32;

        self.left_index += 1;
        self.right_index += 1;

        let color_a = self.gouraud[0];
        let color_d = self.gouraud[3];
        let color_b = self.gouraud[1];
        let color_c = self.gouraud[2];

        let color0 = lerp_color(color_a, color_d, t_left.min(1.0));
        let color1 = lerp_color(color_b, color_c, t_right.min(1.0));

        Some(QuadSpan {
            y: self.left_point.1,
            x0: self.left_point.0,
            x1: self.right_point.0,
            u0: 0,
            u1: self.texture_width.saturating_sub(1),
            color0,
            color1,
        })
    }
}

fn lerp_channel(a: u8, b: u8, t: f32) -> u8 {
    (a as f32 + (b as f32 - a as f32) * t).round().clamp(0.0, 255.0) as u8
}

fn lerp_color(a: (u8, u8, u8), b: (u8, u8, u8), t: f32) -> (u8, u8, u8) {
    (
        lerp_channel(a.0, b.0, t),
        lerp_channel(a.1, b.1, t),
        lerp_channel(a.2, b.2, t),
    )
}

/// Interpolates a span's per-pixel colour linearly between its two
/// endpoints, used once `x` within `[x0, x1]` is known.
pub fn lerp_span_color(span: &QuadSpan, x: i32) -> (u8, u8, u8) {
    let width = (span.x1 - span.x0).max(1) as f32;
    let t = ((x - span.x0) as f32 / width).clamp(0.0, 1.0);
    lerp_color(span.color0, span.color1, t)
}

/// Interpolates a span's texture U coordinate at `x`.
pub fn lerp_span_u(span: &QuadSpan, x: i32) -> u32 {
    let width = (span.x1 - span.x0).max(1) as f32;
    let t = ((x - span.x0) as f32 / width).clamp(0.0, 1.0);
    let u0 = span.u0 as f32;
    let u1 = span.u1 as f32;
    (u0 + (u1 - u0) * t).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect_quad() -> Quad {
        Quad {
            a: (0, 0),
            b: (9, 0),
            c: (9, 4),
            d: (0, 4),
        }
    }

    #[test]
    fn walks_one_span_per_scanline() {
        let mut stepper = QuadStepper::new(rect_quad(), 10, [(255, 255, 255); 4]);
        let mut count = 0;
        while let Some(span) = stepper.next_span() {
            assert_eq!(span.x0, 0);
            assert_eq!(span.x1, 9);
            count += 1;
        }
        assert_eq!(count, 5);
    }

    #[test]
    fn terminates_when_either_edge_runs_out() {
        let quad = Quad {
            a: (0, 0),
            b: (9, 0),
            c: (9, 2),
            d: (0, 4),
        };
        let mut stepper = QuadStepper::new(quad, 10, [(255, 255, 255); 4]);
        let mut count = 0;
        while stepper.next_span().is_some() {
            count += 1;
        }
        assert_eq!(count, 3);
    }

    #[test]
    fn gouraud_interpolates_from_a_to_d_on_left_edge() {
        let quad = rect_quad();
        let gouraud = [(0, 0, 0), (0, 0, 0), (0, 0, 0), (255, 255, 255)];
        let mut stepper = QuadStepper::new(quad, 10, gouraud);
        let first = stepper.next_span().unwrap();
        assert_eq!(first.color0, (0, 0, 0));
        let last = std::iter::from_fn(|| stepper.next_span()).last().unwrap();
        assert_eq!(last.color0, (255, 255, 255));
    }
}
