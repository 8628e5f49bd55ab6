// Copyright 2026 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fs;
use std::path::Path;

use clap::{Args, Subcommand};
use fwblob::capsule::validate_fmp_capsule;
use fwblob::errors::{DebugTrace, trace_error};
use snafu::Snafu;

#[derive(Args, Debug)]
pub struct CapsuleArgs {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check the layout of an FMP capsule and list its items.
    Check(CheckArgs),
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// Capsule file
    input: Box<Path>,
}

#[trace_error]
#[derive(Snafu, DebugTrace)]
#[snafu(module, context(suffix(false)))]
pub enum Error {
    #[snafu(display("Error from OS"), context(false))]
    System { error: std::io::Error },
    #[snafu(display("Invalid capsule"), context(false))]
    Capsule { source: fwblob::capsule::Error },
}

type Result<T> = std::result::Result<T, Error>;

pub fn exec(args: CapsuleArgs) -> Result<()> {
    match args.cmd {
        Command::Check(args) => check(args),
    }
}

fn check(args: CheckArgs) -> Result<()> {
    let data = fs::read(&args.input)?;
    let capsule = validate_fmp_capsule(&data)?;
    println!("capsule flags: {:#x}", capsule.header.flags);
    for (index, driver) in capsule.drivers.iter().enumerate() {
        println!("driver {index}: {:#x} bytes", driver.len());
    }
    for (index, payload) in capsule.payloads.iter().enumerate() {
        let hdr = &payload.header;
        println!(
            "payload {index}: v{} {} index {}, image {:#x} bytes, vendor code {:#x} bytes",
            hdr.version,
            hdr.update_image_type_id,
            hdr.update_image_index,
            payload.image.len(),
            payload.vendor_code.len()
        );
    }
    Ok(())
}
