// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Point-in-time snapshots of a process context.
//!
//! A [`ProcessView`] renders two ways: an operator table via `Display`,
//! and a separator-delimited byte form for the wire ([`ProcessView::encode`]).
//!
//! # Wire form
//!
//! Fields end with [`FIELD_SEPARATOR`]; each segment record ends with
//! [`RECORD_SEPARATOR`], as does the whole view. Numbers are decimal.
//!
//! ```text
//! pid FS arena_size FS used_bytes FS locked FS policy_count FS
//!   { regex FS ref_count FS } * policy_count
//!   { used FS offset FS last FS size FS regex FS state RS } * segments
//! RS
//! ```

use core::fmt;

use secmem_policy::StateId;

use crate::Pid;

/// ASCII FS, terminates every field.
pub const FIELD_SEPARATOR: u8 = 0x1C;
/// ASCII RS, terminates every segment record and the view.
pub const RECORD_SEPARATOR: u8 = 0x1E;

/// One loaded policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyView {
    pub regex: String,
    pub ref_count: usize,
}

/// One segment of the arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentView {
    pub offset: usize,
    /// Offset of the segment's last byte.
    pub last: usize,
    pub size: usize,
    pub used: bool,
    /// Regex of the bound policy, if any.
    pub policy: Option<String>,
    /// Current state of the bound machine, if any.
    pub state: Option<StateId>,
}

/// Snapshot of a process context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessView {
    pub pid: Pid,
    pub arena_size: usize,
    pub used_bytes: usize,
    pub locked: bool,
    pub policies: Vec<PolicyView>,
    pub segments: Vec<SegmentView>,
}

struct Writer(Vec<u8>);

impl Writer {
    fn field(&mut self, value: impl fmt::Display) {
        self.0.extend_from_slice(value.to_string().as_bytes());
        self.0.push(FIELD_SEPARATOR);
    }

    fn end_record(&mut self) {
        self.0.push(RECORD_SEPARATOR);
    }
}

impl ProcessView {
    /// Encodes the view in its separator-delimited wire form.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Writer(Vec::new());

        out.field(self.pid);
        out.field(self.arena_size);
        out.field(self.used_bytes);
        out.field(u8::from(self.locked));
        out.field(self.policies.len());

        for policy in &self.policies {
            out.field(&policy.regex);
            out.field(policy.ref_count);
        }

        for segment in &self.segments {
            out.field(u8::from(segment.used));
            out.field(segment.offset);
            out.field(segment.last);
            out.field(segment.size);
            out.field(segment.policy.as_deref().unwrap_or(""));
            out.0.extend_from_slice(
                segment
                    .state
                    .map(|state| state.to_string())
                    .unwrap_or_default()
                    .as_bytes(),
            );
            out.end_record();
        }

        out.end_record();
        out.0
    }

    /// Parses the wire form produced by [`encode`](Self::encode).
    ///
    /// Returns `None` on malformed or truncated input. Every arena has at
    /// least one segment, so a valid view ends with two record separators.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        let body = bytes.strip_suffix(&[RECORD_SEPARATOR, RECORD_SEPARATOR])?;
        let text = core::str::from_utf8(body).ok()?;

        let mut records = text.split(char::from(RECORD_SEPARATOR));
        let head = records.next()?;

        let mut fields = head.split(char::from(FIELD_SEPARATOR));
        let pid = fields.next()?.parse().ok()?;
        let arena_size = fields.next()?.parse().ok()?;
        let used_bytes = fields.next()?.parse().ok()?;
        let locked = fields.next()? == "1";
        let policy_count: usize = fields.next()?.parse().ok()?;

        let mut policies = Vec::with_capacity(policy_count);
        for _ in 0..policy_count {
            policies.push(PolicyView {
                regex: fields.next()?.to_owned(),
                ref_count: fields.next()?.parse().ok()?,
            });
        }

        // The first segment record shares the head's chunk.
        let first: Vec<&str> = fields.collect();
        let mut segments = vec![Self::segment(&first)?];

        for record in records {
            let fields: Vec<&str> = record.split(char::from(FIELD_SEPARATOR)).collect();
            segments.push(Self::segment(&fields)?);
        }

        Some(Self {
            pid,
            arena_size,
            used_bytes,
            locked,
            policies,
            segments,
        })
    }

    fn segment(fields: &[&str]) -> Option<SegmentView> {
        let [used, offset, last, size, policy, state] = fields else {
            return None;
        };

        Some(SegmentView {
            offset: offset.parse().ok()?,
            last: last.parse().ok()?,
            size: size.parse().ok()?,
            used: *used == "1",
            policy: (!policy.is_empty()).then(|| (*policy).to_owned()),
            state: if state.is_empty() {
                None
            } else {
                Some(state.parse().ok()?)
            },
        })
    }
}

impl fmt::Display for ProcessView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "PID:\t{}", self.pid)?;
        writeln!(f, "\tTotal Size: {:#x}", self.arena_size)?;
        writeln!(f, "\tUsed: {:#x}", self.used_bytes)?;
        writeln!(f, "\tLocked: {}", if self.locked { "yes" } else { "no" })?;

        for (id, policy) in self.policies.iter().enumerate() {
            writeln!(f, "\tPolicy: {id}")?;
            writeln!(f, "\t\tRegex: {}", policy.regex)?;
            writeln!(f, "\t\tRef Count: {}", policy.ref_count)?;
        }

        writeln!(f, "\tMemory:")?;
        writeln!(f, "\tstart\tend\tsize\tused\tregex\tstate")?;
        for segment in &self.segments {
            write!(
                f,
                "\t{:#x}\t{:#x}\t{:#x}\t{}\t{}\t",
                segment.offset,
                segment.last,
                segment.size,
                if segment.used { 'X' } else { ' ' },
                segment.policy.as_deref().unwrap_or(""),
            )?;
            match segment.state {
                Some(state) => writeln!(f, "{state}")?,
                None => writeln!(f)?,
            }
        }

        Ok(())
    }
}
