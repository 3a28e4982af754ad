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

//! Minimal CLI harness: loads an SH-1 ROM, builds a `System` and runs
//! it for a fixed number of cycles, logging progress along the way.
//! This binary is a thin harness around the library, not the subject
//! of this crate's testable properties.

use std::path::PathBuf;

use clap::Parser;
use saturn_core::core::config::Configuration;
use saturn_core::core::system::System;

#[derive(Parser)]
#[command(name = "saturn-core")]
#[command(about = "Runs a Sega Saturn SH-1/VDP1/VDP2 core against an SH-1 ROM image")]
struct Args {
    /// Path to a 64 KiB SH-1 ROM image.
    sh1_rom: String,

    /// Optional TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of SH-1 cycles to run.
    #[arg(long, default_value_t = 1_000_000)]
    cycles: u64,
}

fn main() {
    env_logger::Builder::from_default_env().filter_level(log::LevelFilter::Info).init();

    let args = Args::parse();

    let config = Configuration::load(args.config.as_deref()).unwrap_or_else(|err| {
        log::error!("failed to load configuration: {err}");
        std::process::exit(1);
    });

    let mut system = System::new(config).unwrap_or_else(|err| {
        log::error!("failed to build system: {err}");
        std::process::exit(1);
    });

    let rom = std::fs::read(&args.sh1_rom).unwrap_or_else(|err| {
        log::error!("failed to read {}: {err}", args.sh1_rom);
        std::process::exit(1);
    });
    if let Err(err) = system.load_sh1_rom(&rom) {
        log::error!("failed to load SH-1 ROM: {err}");
        std::process::exit(1);
    }
    system.reset();

    let total_cycles = args.cycles;
    let log_interval = (total_cycles / 10).max(1);
    let mut callbacks = ();
    let mut serial = ();

    let mut executed = 0u64;
    while executed < total_cycles {
        let slice = log_interval.min(total_cycles - executed);
        system.advance(slice, &mut callbacks, &mut serial);
        executed += slice;
        log::info!("{executed}/{total_cycles} cycles ({}%)", executed * 100 / total_cycles);
    }

    log::info!(
        "done: sh1 total_cycles={} pc={:#010x} raster hcnt={} vcnt={} vdp2 deinterlace={}",
        system.sh1.total_cycles(),
        system.sh1.pc,
        system.raster.hcnt(),
        system.raster.vcnt(),
        system.vdp2.deinterlace(),
    );
}
