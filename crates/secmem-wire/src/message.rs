// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Typed requests and replies over [`Record`].
//!
//! | op        | pid | field2     | field3       | data_len    | payload         |
//! |-----------|-----|------------|--------------|-------------|-----------------|
//! | nil       |  -  |  -         |  -           |  -          |  -              |
//! | load      | pid | arena size | policy count | body        | packed policies |
//! | unload    | pid |  -         |  -           |  -          |  -              |
//! | alloc     | pid | size       | policy id    |  -          |  -              |
//! | dealloc   | pid | address    |  -           |  -          |  -              |
//! | read      | pid | address    |  -           | length      |  -              |
//! | write     | pid | address    |  -           | body        | data            |
//! | view      | pid |  -         |  -           |  -          |  -              |
//! | terminate |  -  |  -         |  -           |  -          |  -              |
//!
//! Replies echo the request header with ACK or NAK set. An alloc ACK
//! carries the allocated offset in field2; read and view ACKs carry data.
//! A NAK never carries a payload.

use zeroize::Zeroizing;

use crate::error::WireError;
use crate::policy::{PolicyRecord, pack_policies, unpack_policies};
use crate::record::{MAX_PAYLOAD, Record};
use crate::tag::{OpTag, Status, Tag};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Nil,
    Load {
        pid: u32,
        arena_size: u32,
        policies: Vec<PolicyRecord>,
    },
    Unload {
        pid: u32,
    },
    Alloc {
        pid: u32,
        size: u32,
        policy_id: u32,
    },
    Dealloc {
        pid: u32,
        addr: u32,
    },
    Read {
        pid: u32,
        addr: u32,
        len: u32,
    },
    Write {
        pid: u32,
        addr: u32,
        data: Zeroizing<Vec<u8>>,
    },
    View {
        pid: u32,
    },
    Terminate,
}

fn fit(field: &'static str, value: usize) -> Result<u32, WireError> {
    u32::try_from(value).map_err(|_| WireError::FieldOverflow { field, value })
}

fn no_payload(op: OpTag, record: &Record) -> Result<(), WireError> {
    match record.payload.len() {
        0 => Ok(()),
        len => Err(WireError::UnexpectedPayload {
            op: op.name(),
            len,
        }),
    }
}

impl Request {
    pub fn op(&self) -> OpTag {
        match self {
            Self::Nil => OpTag::Nil,
            Self::Load { .. } => OpTag::Load,
            Self::Unload { .. } => OpTag::Unload,
            Self::Alloc { .. } => OpTag::Alloc,
            Self::Dealloc { .. } => OpTag::Dealloc,
            Self::Read { .. } => OpTag::Read,
            Self::Write { .. } => OpTag::Write,
            Self::View { .. } => OpTag::View,
            Self::Terminate => OpTag::Terminate,
        }
    }

    /// Target process; 0 for operations that address none.
    pub fn pid(&self) -> u32 {
        match *self {
            Self::Nil | Self::Terminate => 0,
            Self::Load { pid, .. }
            | Self::Unload { pid }
            | Self::Alloc { pid, .. }
            | Self::Dealloc { pid, .. }
            | Self::Read { pid, .. }
            | Self::Write { pid, .. }
            | Self::View { pid } => pid,
        }
    }

    /// `(pid, field2, field3)` as carried in the header.
    fn header(&self) -> Result<(u32, u32, u32), WireError> {
        Ok(match self {
            Self::Nil | Self::Terminate => (0, 0, 0),
            Self::Load {
                pid,
                arena_size,
                policies,
            } => (*pid, *arena_size, fit("policy count", policies.len())?),
            Self::Unload { pid } | Self::View { pid } => (*pid, 0, 0),
            Self::Alloc {
                pid,
                size,
                policy_id,
            } => (*pid, *size, *policy_id),
            Self::Dealloc { pid, addr }
            | Self::Read { pid, addr, .. }
            | Self::Write { pid, addr, .. } => (*pid, *addr, 0),
        })
    }

    pub fn to_record(&self) -> Result<Record, WireError> {
        let (pid, field2, field3) = self.header()?;
        let record = Record::new(Tag::request(self.op()).to_u32(), pid, field2, field3);

        let payload = match self {
            Self::Load { policies, .. } => pack_policies(policies)?,
            Self::Write { data, .. } => {
                if data.len() > MAX_PAYLOAD {
                    return Err(WireError::PayloadTooLarge {
                        len: data.len(),
                        limit: MAX_PAYLOAD,
                    });
                }
                data.to_vec()
            }
            Self::Read { len, .. } => return Ok(record.with_requested_len(*len)),
            _ => return Ok(record),
        };

        Ok(record.with_payload(payload))
    }

    /// Interprets `record` as a request. Replies, unknown tags, and
    /// payloads on operations that take none are rejected.
    pub fn from_record(record: &Record) -> Result<Self, WireError> {
        let tag = record.tag()?;
        if tag.is_reply() {
            return Err(WireError::UnexpectedReply(record.tag));
        }

        let pid = record.pid;
        let request = match tag.op {
            OpTag::Load => {
                let policies = unpack_policies(&record.payload, record.field3 as usize)?;
                return Ok(Self::Load {
                    pid,
                    arena_size: record.field2,
                    policies,
                });
            }
            OpTag::Write => {
                return Ok(Self::Write {
                    pid,
                    addr: record.field2,
                    data: record.payload.clone(),
                });
            }
            // Filler bytes after a read header are tolerated and dropped.
            OpTag::Read => {
                return Ok(Self::Read {
                    pid,
                    addr: record.field2,
                    len: fit("read length", record.data_len())?,
                });
            }
            OpTag::Nil => Self::Nil,
            OpTag::Unload => Self::Unload { pid },
            OpTag::Alloc => Self::Alloc {
                pid,
                size: record.field2,
                policy_id: record.field3,
            },
            OpTag::Dealloc => Self::Dealloc {
                pid,
                addr: record.field2,
            },
            OpTag::View => Self::View { pid },
            OpTag::Terminate => Self::Terminate,
        };

        no_payload(tag.op, record)?;
        Ok(request)
    }
}

/// A daemon reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub tag: Tag,
    pub pid: u32,
    pub field2: u32,
    pub field3: u32,
    pub payload: Zeroizing<Vec<u8>>,
}

impl Reply {
    fn echo(request: &Request, status: Status) -> Self {
        // Fields that overflowed would never have been decoded off the wire.
        let (pid, field2, field3) = request.header().unwrap_or((request.pid(), 0, 0));
        Self {
            tag: Tag {
                op: request.op(),
                status,
            },
            pid,
            field2,
            field3,
            payload: Zeroizing::new(Vec::new()),
        }
    }

    /// Success, echoing the request header.
    pub fn ack(request: &Request) -> Self {
        Self::echo(request, Status::Ack)
    }

    /// Failure, echoing the request header. Never carries a payload.
    pub fn nak(request: &Request) -> Self {
        Self::echo(request, Status::Nak)
    }

    pub fn with_field2(mut self, field2: u32) -> Self {
        self.field2 = field2;
        self
    }

    /// Attaches `payload` to an ACK.
    pub fn with_payload(mut self, payload: Zeroizing<Vec<u8>>) -> Result<Self, WireError> {
        if payload.len() > MAX_PAYLOAD {
            return Err(WireError::PayloadTooLarge {
                len: payload.len(),
                limit: MAX_PAYLOAD,
            });
        }
        if self.tag.status == Status::Nak {
            return Err(WireError::UnexpectedPayload {
                op: self.tag.op.name(),
                len: payload.len(),
            });
        }
        self.payload = payload;
        Ok(self)
    }

    pub fn is_ack(&self) -> bool {
        self.tag.status == Status::Ack
    }

    pub fn to_record(&self) -> Record {
        Record {
            tag: self.tag.to_u32(),
            pid: self.pid,
            field2: self.field2,
            field3: self.field3,
            requested_len: 0,
            payload: self.payload.clone(),
        }
    }

    pub fn from_record(record: Record) -> Result<Self, WireError> {
        let tag = record.tag()?;
        if !tag.is_reply() {
            return Err(WireError::UnexpectedRequest(record.tag));
        }
        if tag.status == Status::Nak && record.data_len() > 0 {
            return Err(WireError::UnexpectedPayload {
                op: tag.op.name(),
                len: record.data_len(),
            });
        }

        Ok(Self {
            tag,
            pid: record.pid,
            field2: record.field2,
            field3: record.field3,
            payload: record.payload,
        })
    }
}
