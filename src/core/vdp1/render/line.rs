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

//! Bresenham line stepper.

use crate::core::vdp1::Rect;

/// Walks a line from `(x0, y0)` to `(x1, y1)` one pixel at a time,
/// reporting an optional anti-alias neighbour at each step and the
/// total step count so callers can interpolate gouraud shading across
/// the line's length.
pub struct LineStepper {
    x: i32,
    y: i32,
    x1: i32,
    y1: i32,
    dx: i32,
    dy: i32,
    sx: i32,
    sy: i32,
    err: i32,
    steep: bool,
    done: bool,
    /// Total number of steps, used to normalise gouraud interpolation.
    pub length: u32,
}

/// One step of the Bresenham walk.
#[derive(Debug, Clone, Copy)]
pub struct LineStep {
    pub x: i32,
    pub y: i32,
    /// An adjacent pixel to blend for anti-aliasing, if enabled.
    pub aa_neighbor: Option<(i32, i32)>,
    /// 0-based index of this step along the line, for interpolation.
    pub index: u32,
}

impl LineStepper {
    pub fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        let dx = (x1 - x0).abs();
        let dy = (y1 - y0).abs();
        let sx = if x1 >= x0 { 1 } else { -1 };
        let sy = if y1 >= y0 { 1 } else { -1 };
        let steep = dy > dx;
        let length = dx.max(dy) as u32;
        Self {
            x: x0,
            y: y0,
            x1,
            y1,
            dx,
            dy,
            sx,
            sy,
            err: dx - dy,
            steep,
            done: false,
            length,
        }
    }

    /// Fast rejection: true if the entire line lies outside `clip`, so
    /// the caller can skip stepping it altogether.
    pub fn system_clip_reject(x0: i32, y0: i32, x1: i32, y1: i32, clip: &Rect) -> bool {
        let (min_x, max_x) = (x0.min(x1), x0.max(x1));
        let (min_y, max_y) = (y0.min(y1), y0.max(y1));
        max_x < clip.x0 || min_x > clip.x1 || max_y < clip.y0 || min_y > clip.y1
    }

    /// Advances and returns the next step, with `anti_alias` selecting
    /// whether a neighbour pixel is reported.
    pub fn next(&mut self, anti_alias: bool, index: u32) -> Option<LineStep> {
        if self.done {
            return None;
        }
        let step = LineStep {
            x: self.x,
            y: self.y,
            aa_neighbor: if anti_alias {
                Some(if self.steep {
                    (self.x + self.sx, self.y)
                } else {
                    (self.x, self.y + self.sy)
                })
            } else {
                None
            },
            index,
        };

        if self.x == self.x1 && self.y == self.y1 {
            self.done = true;
            return Some(step);
        }

        let e2 = 2 * self.err;
        if e2 > -self.dy {
            self.err -= self.dy;
            self.x += self.sx;
        }
        if e2 < self.dx {
            self.err += self.dx;
            self.y += self.sy;
        }

        Some(step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_horizontal_line() {
        let mut stepper = LineStepper::new(0, 0, 4, 0);
        let mut points = Vec::new();
        let mut i = 0;
        while let Some(step) = stepper.next(false, i) {
            points.push((step.x, step.y));
            i += 1;
        }
        assert_eq!(points, vec![(0, 0), (1, 0), (2, 0), (3, 0), (4, 0)]);
    }

    #[test]
    fn walks_diagonal_line() {
        let mut stepper = LineStepper::new(0, 0, 3, 3);
        let mut points = Vec::new();
        let mut i = 0;
        while let Some(step) = stepper.next(false, i) {
            points.push((step.x, step.y));
            i += 1;
        }
        assert_eq!(points, vec![(0, 0), (1, 1), (2, 2), (3, 3)]);
    }

    #[test]
    fn degenerate_single_point_line_yields_one_step() {
        let mut stepper = LineStepper::new(5, 5, 5, 5);
        assert!(stepper.next(false, 0).is_some());
        assert!(stepper.next(false, 1).is_none());
    }

    #[test]
    fn system_clip_reject_detects_fully_outside_line() {
        let clip = Rect {
            x0: 0,
            y0: 0,
            x1: 320,
            y1: 224,
        };
        assert!(LineStepper::system_clip_reject(-100, -100, -50, -50, &clip));
        assert!(!LineStepper::system_clip_reject(10, 10, 400, 10, &clip));
    }
}
