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
use fwblob::errors::{DebugTrace, trace_error};
use fwblob::identity::StaticIdentity;
use fwblob::packet::identity::{IdentityAction, decode_identity_packet};
use fwblob::packet::processor::PacketProcessor;
use fwblob::packet::{DecodedPacket, PacketKind, decode_packet};
use snafu::{ResultExt, Snafu};

#[derive(Args, Debug)]
pub struct PacketArgs {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check a packet and print its targets and payload size.
    Decode(DecodeArgs),
}

#[derive(Args, Debug)]
struct DecodeArgs {
    /// Packet file
    input: Box<Path>,

    /// Packet kind: identity, permission, or settings
    #[arg(short, long, default_value = "settings")]
    kind: String,

    /// Also check the targets against this device identity:
    /// manufacturer=..,product=..,serial_number=..
    #[arg(long)]
    identity: Option<String>,
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
    #[snafu(display("Invalid packet"), context(false))]
    Packet { source: fwblob::packet::Error },
}

type Result<T> = std::result::Result<T, Error>;

pub fn exec(args: PacketArgs) -> Result<()> {
    match args.cmd {
        Command::Decode(args) => decode(args),
    }
}

fn print_packet(packet: &DecodedPacket) {
    println!("kind: {}", packet.kind.as_str());
    println!("session: {:#x}", packet.session_id());
    for (field, target) in packet.targets() {
        if target.is_empty() {
            println!("{}: *", field.as_str());
        } else {
            println!("{}: {target}", field.as_str());
        }
    }
    println!("payload: {:#x} bytes", packet.payload.len());
    println!("signature: {:#x} bytes", packet.signature.len());
}

fn parse_kind_arg(arg: &str) -> Result<PacketKind> {
    serde_aco::from_arg(arg).context(error::ParseArg { arg })
}

fn parse_identity_arg(arg: &str) -> Result<StaticIdentity> {
    serde_aco::from_arg(arg).context(error::ParseArg { arg })
}

fn decode(args: DecodeArgs) -> Result<()> {
    let kind = parse_kind_arg(&args.kind)?;
    let data = fs::read(&args.input)?;

    if kind == PacketKind::Identity {
        let packet = decode_identity_packet(&data)?;
        print_packet(&packet.packet);
        match packet.action {
            IdentityAction::Enroll { certificate } => {
                println!("enroll {:?}: {:#x} bytes", packet.role, certificate.len())
            }
            IdentityAction::Unenroll => println!("unenroll {:?}", packet.role),
        }
    } else {
        print_packet(&decode_packet(&data, kind)?);
    }

    let Some(identity) = args.identity else {
        return Ok(());
    };
    let identity = parse_identity_arg(&identity)?;
    let mut processor = PacketProcessor::new(kind);
    processor.set_data(&data)?;
    let result = processor.process(&identity);
    println!("{} state: {:?}", processor.kind().as_str(), processor.state());
    result?;
    Ok(())
}

#[cfg(test)]
#[path = "packet_test.rs"]
mod tests;
