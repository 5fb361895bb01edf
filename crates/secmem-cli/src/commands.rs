// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Subcommand execution.

use std::io::Write;

use anyhow::{Result, bail};
use tracing::debug;
use zeroize::Zeroizing;

use secmem_registry::ProcessView;
use secmem_wire::{Client, OpTag, PolicyRecord, Reply, Request, Transport, hex_dump};

use crate::Command;

/// Bytes given on the command line as hex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexBytes(pub Zeroizing<Vec<u8>>);

pub fn parse_hex(text: &str) -> Result<HexBytes, String> {
    let digits = text.strip_prefix("0x").unwrap_or(text);
    if digits.is_empty() || digits.len() % 2 != 0 {
        return Err(format!("'{text}' is not an even number of hex digits"));
    }

    let mut bytes = Zeroizing::new(Vec::with_capacity(digits.len() / 2));
    for pair in digits.as_bytes().chunks(2) {
        let pair = core::str::from_utf8(pair).map_err(|error| error.to_string())?;
        let byte =
            u8::from_str_radix(pair, 16).map_err(|_| format!("'{pair}' is not a hex byte"))?;
        bytes.push(byte);
    }

    Ok(HexBytes(bytes))
}

/// The request a subcommand sends, if it talks to the daemon at all.
pub fn request_for(command: Command) -> Option<Request> {
    Some(match command {
        Command::Load {
            pid,
            size,
            policies,
        } => Request::Load {
            pid,
            arena_size: size,
            policies: policies.into_iter().map(PolicyRecord::new).collect(),
        },
        Command::Unload { pid } => Request::Unload { pid },
        Command::Alloc {
            pid,
            size,
            policy_id,
        } => Request::Alloc {
            pid,
            size,
            policy_id,
        },
        Command::Dealloc { pid, addr } => Request::Dealloc { pid, addr },
        Command::Read { pid, addr, len } => Request::Read { pid, addr, len },
        Command::Write { pid, addr, data } => Request::Write {
            pid,
            addr,
            data: data.0,
        },
        Command::View { pid } => Request::View { pid },
        Command::Nil => Request::Nil,
        Command::Terminate => Request::Terminate,
        Command::Drain { .. } => return None,
    })
}

/// Sends one request, prints the reply, and reports whether it was
/// acknowledged.
pub fn run<T: Transport, W: Write>(
    client: &Client<T>,
    command: Command,
    out: &mut W,
) -> Result<bool> {
    let Some(request) = request_for(command) else {
        bail!("drain does not talk to the daemon");
    };
    debug!("{}", request.to_record()?);

    let Some(reply) = client.call(&request)? else {
        writeln!(out, "Terminate sent")?;
        return Ok(true);
    };

    writeln!(out, "{}", reply.to_record())?;
    if reply.is_ack() {
        print_payload(&reply, out)?;
    }

    Ok(reply.is_ack())
}

fn print_payload<W: Write>(reply: &Reply, out: &mut W) -> Result<()> {
    match reply.tag.op {
        OpTag::Read => write!(out, "{}", hex_dump(&reply.payload))?,
        OpTag::View => match ProcessView::decode(&reply.payload) {
            Some(view) => write!(out, "{view}")?,
            None => writeln!(out, "view truncated ({} bytes)", reply.payload.len())?,
        },
        _ => {}
    }
    Ok(())
}

#[cfg(target_os = "linux")]
pub fn drain(transport: secmem_wire::SysvDuplex, remove: bool) -> Result<std::process::ExitCode> {
    let requests = transport.outbound().drain()?;
    let replies = transport.inbound().drain()?;
    println!("Dropped {requests} request(s) and {replies} reply(ies)");

    if remove {
        transport.remove()?;
        println!("Queues removed");
    }
    Ok(std::process::ExitCode::SUCCESS)
}
