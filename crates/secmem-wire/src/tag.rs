// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Operation tags and reply modifiers.

use crate::error::WireError;

/// OR-ed onto an operation tag in a successful reply.
pub const ACK: u32 = 0x10;
/// OR-ed onto an operation tag in a failed reply.
pub const NAK: u32 = 0x20;

const MODIFIERS: u32 = ACK | NAK;

/// The operation a record requests or answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum OpTag {
    Nil = 0,
    Load = 1,
    Unload = 2,
    Alloc = 3,
    Dealloc = 4,
    Read = 5,
    Write = 6,
    View = 7,
    Terminate = 8,
}

impl OpTag {
    pub const ALL: [OpTag; 9] = [
        OpTag::Nil,
        OpTag::Load,
        OpTag::Unload,
        OpTag::Alloc,
        OpTag::Dealloc,
        OpTag::Read,
        OpTag::Write,
        OpTag::View,
        OpTag::Terminate,
    ];

    pub const fn as_u32(self) -> u32 {
        self as u32
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Load => "load",
            Self::Unload => "unload",
            Self::Alloc => "alloc",
            Self::Dealloc => "dealloc",
            Self::Read => "read",
            Self::Write => "write",
            Self::View => "view",
            Self::Terminate => "terminate",
        }
    }
}

impl TryFrom<u32> for OpTag {
    type Error = WireError;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_u32() == raw)
            .ok_or(WireError::UnknownTag(raw))
    }
}

/// Request or reply outcome carried by a tag's modifier bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Request,
    Ack,
    Nak,
}

/// A decoded tag: operation plus modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag {
    pub op: OpTag,
    pub status: Status,
}

impl Tag {
    pub const fn request(op: OpTag) -> Self {
        Self {
            op,
            status: Status::Request,
        }
    }

    pub const fn ack(op: OpTag) -> Self {
        Self {
            op,
            status: Status::Ack,
        }
    }

    pub const fn nak(op: OpTag) -> Self {
        Self {
            op,
            status: Status::Nak,
        }
    }

    pub const fn to_u32(self) -> u32 {
        let modifier = match self.status {
            Status::Request => 0,
            Status::Ack => ACK,
            Status::Nak => NAK,
        };
        self.op.as_u32() | modifier
    }

    /// Fails on unknown operations and on tags carrying both modifiers.
    pub fn from_u32(raw: u32) -> Result<Self, WireError> {
        let status = match raw & MODIFIERS {
            0 => Status::Request,
            ACK => Status::Ack,
            NAK => Status::Nak,
            _ => return Err(WireError::UnknownTag(raw)),
        };

        Ok(Self {
            op: OpTag::try_from(strip_modifiers(raw))?,
            status,
        })
    }

    pub const fn is_reply(self) -> bool {
        !matches!(self.status, Status::Request)
    }
}

/// The operation bits of a raw tag.
pub const fn strip_modifiers(raw: u32) -> u32 {
    raw & !MODIFIERS
}
