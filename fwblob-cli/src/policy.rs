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
use fwblob::envelope::Unsigned;
use fwblob::errors::{DebugTrace, trace_error};
use fwblob::identity::StaticIdentity;
use fwblob::policy::builder::PolicyBuilder;
use fwblob::policy::target::{PolicyTarget, extract_target, verify_target};
use fwblob::policy::{check_content, extract_string, extract_u64};
use snafu::{ResultExt, Snafu};

#[derive(Args, Debug)]
pub struct PolicyArgs {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the header and every rule.
    Dump(DumpArgs),
    /// Print one value.
    Get(GetArgs),
    /// Encode a device-targeted policy.
    Create(CreateArgs),
    /// Check that a policy targets a device.
    Verify(VerifyArgs),
}

#[derive(Args, Debug)]
struct DumpArgs {
    /// Policy content without its signature envelope
    input: Box<Path>,
}

#[derive(Args, Debug)]
struct GetArgs {
    /// Policy content without its signature envelope
    input: Box<Path>,

    /// Rule name, e.g. Target\Manufacturer
    name: String,

    /// Read the value as a qword instead of a string
    #[arg(long)]
    qword: bool,
}

#[derive(Args, Debug)]
struct CreateArgs {
    /// manufacturer=..,product=..,serial_number=..,[oem1=..,oem2=..,]nonce=..,policy=..
    #[arg(long)]
    target: String,

    /// Output file
    #[arg(short, long)]
    output: Box<Path>,
}

#[derive(Args, Debug)]
struct VerifyArgs {
    /// Policy content without its signature envelope
    input: Box<Path>,

    /// manufacturer=..,product=..,serial_number=..[,oem1=..,oem2=..]
    #[arg(long)]
    identity: String,

    /// Nonce the device expects
    #[arg(long)]
    nonce: String,
}

#[trace_error]
#[derive(Snafu, DebugTrace)]
#[snafu(module, context(suffix(false)))]
pub enum Error {
    #[snafu(display("Error from OS"), context(false))]
    System { error: std::io::Error },
    #[snafu(display("Failed to parse {arg}"))]
    ParseArg {
        arg: String,
        error: serde_aco::Error,
    },
    #[snafu(display("Invalid policy"), context(false))]
    Policy { source: fwblob::policy::Error },
}

type Result<T> = std::result::Result<T, Error>;

pub fn exec(args: PolicyArgs) -> Result<()> {
    match args.cmd {
        Command::Dump(args) => dump(args),
        Command::Get(args) => get(args),
        Command::Create(args) => create(args),
        Command::Verify(args) => verify(args),
    }
}

fn dump(args: DumpArgs) -> Result<()> {
    let content = fs::read(&args.input)?;
    let view = check_content(&content)?;
    let hdr = &view.header;
    println!("format version: {}", hdr.format_version);
    println!("policy version: {}", hdr.policy_version);
    println!("publisher: {}", hdr.publisher);
    println!("rules: {}", view.rules.len());
    println!("value table: {:#x} bytes at {:#x}", view.value_table.len(), view.value_table_offset);
    for (index, entry) in view.entries().enumerate() {
        let entry = entry?;
        println!(
            "[{index}] {}\\{} = {}",
            entry.subkey, entry.value_name, entry.value
        );
    }
    Ok(())
}

fn get(args: GetArgs) -> Result<()> {
    let content = fs::read(&args.input)?;
    if args.qword {
        let val = extract_u64(&Unsigned, &content, &args.name)?;
        println!("{val:#x}");
    } else {
        let val = extract_string(&Unsigned, &content, &args.name)?;
        println!("{val}");
    }
    Ok(())
}

fn parse_target_arg(arg: &str) -> Result<PolicyTarget> {
    serde_aco::from_arg(arg).context(error::ParseArg { arg })
}

fn parse_identity_arg(arg: &str) -> Result<StaticIdentity> {
    serde_aco::from_arg(arg).context(error::ParseArg { arg })
}

fn parse_nonce_arg(arg: &str) -> Result<u64> {
    serde_aco::from_arg(arg).context(error::ParseArg { arg })
}

fn create(args: CreateArgs) -> Result<()> {
    let target = parse_target_arg(&args.target)?;
    let content = PolicyBuilder::from_target(&target)?.build()?;
    fs::write(&args.output, &content)?;
    log::info!("wrote {:#x} bytes to {}", content.len(), args.output.display());
    Ok(())
}

fn verify(args: VerifyArgs) -> Result<()> {
    let identity = parse_identity_arg(&args.identity)?;
    let nonce = parse_nonce_arg(&args.nonce)?;
    let content = fs::read(&args.input)?;
    let target = extract_target(&Unsigned, &content)?;
    verify_target(&target, &identity, nonce)?;
    println!("policy {:#x} targets this device", target.policy);
    Ok(())
}

#[cfg(test)]
#[path = "policy_test.rs"]
mod tests;
