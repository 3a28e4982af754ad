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

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use saturn_core::core::bus::FlatBus;
use saturn_core::core::sh1::{Sh1, ROM_SIZE};
use std::hint::black_box;

fn blank_rom() -> Vec<u8> {
    vec![0u8; ROM_SIZE]
}

fn sh1_step_benchmark(c: &mut Criterion) {
    c.bench_function("sh1_step_nop", |b| {
        let mut sh1 = Sh1::new();
        sh1.load_rom(&blank_rom()).unwrap();
        let mut bus = FlatBus::new(0x1_0000);
        let mut serial = ();
        sh1.hard_reset();

        b.iter(|| {
            black_box(sh1.step(&mut bus, &mut serial));
        });
    });
}

fn sh1_register_access_benchmark(c: &mut Criterion) {
    c.bench_function("sh1_register_read", |b| {
        let sh1 = Sh1::new();
        b.iter(|| {
            for i in 0..16 {
                black_box(sh1.r[i]);
            }
        });
    });

    c.bench_function("sh1_register_write", |b| {
        let mut sh1 = Sh1::new();
        b.iter(|| {
            for i in 0..16 {
                sh1.r[i] = black_box(i as u32 * 100);
            }
        });
    });
}

fn sh1_advance_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("sh1_advance");

    for cycles in [10u64, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::new("advance", cycles), cycles, |b, &cycles| {
            let mut sh1 = Sh1::new();
            sh1.load_rom(&blank_rom()).unwrap();
            let mut bus = FlatBus::new(0x1_0000);
            let mut serial = ();

            b.iter(|| {
                sh1.hard_reset();
                black_box(sh1.advance(black_box(cycles), &mut bus, &mut serial));
            });
        });
    }

    group.finish();
}

fn rom_hash_benchmark(c: &mut Criterion) {
    c.bench_function("sh1_load_rom_hash", |b| {
        let rom = blank_rom();
        let mut sh1 = Sh1::new();
        b.iter(|| {
            sh1.load_rom(black_box(&rom)).unwrap();
        });
    });
}

criterion_group!(
    benches,
    sh1_step_benchmark,
    sh1_register_access_benchmark,
    sh1_advance_benchmark,
    rom_hash_benchmark
);
criterion_main!(benches);
