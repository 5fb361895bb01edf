// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! One-line operator descriptions of records.
//!
//! Payload bytes are never rendered here; use [`hex_dump`] explicitly
//! where showing them is intended.

use core::fmt;

use crate::record::Record;
use crate::tag::{OpTag, Status, Tag};

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Ok(tag) = self.tag() else {
            return write!(f, "Unknown message type {:#x}", self.tag);
        };

        describe(f, tag, self)?;

        if !self.payload.is_empty() {
            write!(f, " [{} bytes]", self.payload.len())?;
        }
        Ok(())
    }
}

fn describe(f: &mut fmt::Formatter<'_>, tag: Tag, r: &Record) -> fmt::Result {
    let (pid, f2, f3) = (r.pid, r.field2, r.field3);

    match tag.status {
        Status::Request => match tag.op {
            OpTag::Nil => write!(f, "Nil"),
            OpTag::Load => write!(
                f,
                "Loading {f3} policies for pid {pid} with {f2:#x} bytes of secure memory"
            ),
            OpTag::Unload => write!(f, "Unloading pid {pid}"),
            OpTag::Alloc => write!(f, "Allocating {f2:#x} bytes from pid {pid} under policy {f3}"),
            OpTag::Dealloc => write!(f, "Deallocating from pid {pid} @ {f2:#x}"),
            OpTag::Read => write!(
                f,
                "Reading {:#x} bytes from pid {pid} @ {f2:#x}",
                r.data_len()
            ),
            OpTag::Write => write!(
                f,
                "Writing {:#x} bytes to pid {pid} @ {f2:#x}",
                r.data_len()
            ),
            OpTag::View => write!(f, "Viewing pid {pid}"),
            OpTag::Terminate => write!(f, "Terminate"),
        },
        status => {
            match tag.op {
                OpTag::Nil => write!(f, "Nil")?,
                OpTag::Load => write!(f, "Load of pid {pid}")?,
                OpTag::Unload => write!(f, "Unload of pid {pid}")?,
                OpTag::Alloc if status == Status::Ack => {
                    write!(f, "Allocated from pid {pid} @ address {f2:#x}")?
                }
                OpTag::Alloc => write!(f, "Allocation of {f2:#x} bytes from pid {pid}")?,
                OpTag::Dealloc => write!(f, "Deallocation from pid {pid} @ {f2:#x}")?,
                OpTag::Read if status == Status::Ack => write!(
                    f,
                    "Read of {:#x} bytes from pid {pid} @ {f2:#x}",
                    r.data_len()
                )?,
                OpTag::Read => write!(f, "Read from pid {pid} @ {f2:#x}")?,
                OpTag::Write => write!(f, "Write to pid {pid} @ {f2:#x}")?,
                OpTag::View => write!(f, "View of pid {pid}")?,
                OpTag::Terminate => write!(f, "Terminate")?,
            }
            match status {
                Status::Nak => write!(f, " NAK"),
                _ => write!(f, " ACK"),
            }
        }
    }
}

/// Sixteen bytes per line, offset-prefixed.
pub fn hex_dump(bytes: &[u8]) -> String {
    let mut out = String::new();

    for (line, chunk) in bytes.chunks(16).enumerate() {
        out.push_str(&format!("{:08x} ", line * 16));
        for byte in chunk {
            out.push_str(&format!(" {byte:02x}"));
        }
        out.push('\n');
    }

    out
}
