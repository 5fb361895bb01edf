// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Request dispatcher.
//!
//! Every request is checked against [`DispatchLimits`] before it reaches the
//! registry; a request that fails a check mutates nothing. Any failure is
//! answered with a NAK echoing the request header.

use thiserror::Error;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use secmem_registry::{ErrorKind, Registry, RegistryError, RegistryOptions};
use secmem_wire::{MAX_PAYLOAD, OpTag, Record, Reply, Request, WireError};

use crate::config::DispatchLimits;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("pid {pid} outside 1..={max}")]
    PidOutOfRange { pid: u32, max: u32 },

    #[error("arena size {size:#x} outside 1..={max:#x}")]
    ArenaSizeOutOfRange { size: u32, max: u32 },

    #[error("load carries no policies")]
    NoPolicies,

    #[error("allocation of {size:#x} bytes outside 1..={arena_size:#x}")]
    AllocSizeOutOfRange { size: u32, arena_size: usize },

    #[error("address {addr:#x} outside arena of {arena_size:#x} bytes")]
    AddressOutOfRange { addr: u32, arena_size: usize },

    #[error("zero-length access")]
    EmptyAccess,

    #[error("read of {len} bytes exceeds reply capacity {limit}")]
    ReadTooLarge { len: u32, limit: usize },

    #[error("WireError: {0}")]
    Wire(#[from] WireError),

    #[error("RegistryError: {0}")]
    Registry(#[from] RegistryError),
}

impl DispatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Registry(error) => error.kind(),
            _ => ErrorKind::Malformed,
        }
    }
}

/// What the serve loop should do after one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Send this encoded reply.
    Reply(Record),
    /// Stop serving; nothing is sent.
    Terminate,
}

#[derive(Debug)]
pub struct Dispatcher {
    registry: Registry,
    limits: DispatchLimits,
}

impl Dispatcher {
    pub fn new(limits: DispatchLimits) -> Self {
        Self {
            registry: Registry::with_options(RegistryOptions {
                lock_memory: limits.lock_memory,
            }),
            limits,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn limits(&self) -> DispatchLimits {
        self.limits
    }

    /// Decodes one raw message and produces the reply to send.
    ///
    /// Messages too short to carry a header are answered with a nil NAK.
    pub fn handle(&self, bytes: &[u8]) -> Outcome {
        let record = match Record::decode(bytes) {
            Ok(record) => record,
            Err(error) => {
                warn!(%error, len = bytes.len(), "malformed record");
                let header = Record::decode_header(bytes)
                    .unwrap_or_else(|_| Record::new(OpTag::Nil.as_u32(), 0, 0, 0));
                return Outcome::Reply(header.nak());
            }
        };

        info!("{record}");

        let request = match Request::from_record(&record) {
            Ok(request) => request,
            Err(error) => {
                warn!(%error, tag = record.tag, pid = record.pid, "rejected record");
                return Outcome::Reply(record.nak());
            }
        };

        if request.op() == OpTag::Terminate {
            return Outcome::Terminate;
        }

        let reply = match self.dispatch(&request) {
            Ok(reply) => reply,
            Err(error) => {
                match error.kind() {
                    ErrorKind::PolicyViolation | ErrorKind::Cleanup | ErrorKind::Internal => {
                        warn!(pid = request.pid(), op = request.op().name(), %error, "request failed")
                    }
                    _ => debug!(pid = request.pid(), op = request.op().name(), %error, "request failed"),
                }
                Reply::nak(&request)
            }
        };

        let record = reply.to_record();
        info!("{record}");
        Outcome::Reply(record)
    }

    /// Validates and executes one request.
    pub fn dispatch(&self, request: &Request) -> Result<Reply, DispatchError> {
        match request {
            Request::Nil | Request::Terminate => Ok(Reply::ack(request)),

            Request::Load {
                pid,
                arena_size,
                policies,
            } => {
                self.check_pid(*pid)?;
                if *arena_size == 0 || *arena_size > self.limits.max_arena {
                    return Err(DispatchError::ArenaSizeOutOfRange {
                        size: *arena_size,
                        max: self.limits.max_arena,
                    });
                }
                if policies.is_empty() {
                    return Err(DispatchError::NoPolicies);
                }

                let expressions: Vec<&[u8]> =
                    policies.iter().map(|policy| policy.regex.as_slice()).collect();
                self.registry
                    .load(*pid, *arena_size as usize, &expressions)?;
                Ok(Reply::ack(request))
            }

            Request::Unload { pid } => {
                self.check_pid(*pid)?;
                self.registry.unload(*pid)?;
                Ok(Reply::ack(request))
            }

            Request::Alloc {
                pid,
                size,
                policy_id,
            } => {
                self.check_pid(*pid)?;
                let arena_size = self.registry.arena_size(*pid)?;
                if *size == 0 || *size as usize > arena_size {
                    return Err(DispatchError::AllocSizeOutOfRange {
                        size: *size,
                        arena_size,
                    });
                }

                let offset = self
                    .registry
                    .alloc(*pid, *size as usize, *policy_id as usize)?;
                let offset = u32::try_from(offset).map_err(|_| WireError::FieldOverflow {
                    field: "offset",
                    value: offset,
                })?;
                Ok(Reply::ack(request).with_field2(offset))
            }

            Request::Dealloc { pid, addr } => {
                self.check_address(*pid, *addr)?;
                self.registry.dealloc(*pid, *addr as usize)?;
                Ok(Reply::ack(request))
            }

            Request::Read { pid, addr, len } => {
                self.check_address(*pid, *addr)?;
                if *len == 0 {
                    return Err(DispatchError::EmptyAccess);
                }
                if *len as usize > MAX_PAYLOAD {
                    return Err(DispatchError::ReadTooLarge {
                        len: *len,
                        limit: MAX_PAYLOAD,
                    });
                }

                let data = self.registry.read(*pid, *addr as usize, *len as usize)?;
                Ok(Reply::ack(request).with_payload(data)?)
            }

            Request::Write { pid, addr, data } => {
                self.check_address(*pid, *addr)?;
                if data.is_empty() {
                    return Err(DispatchError::EmptyAccess);
                }

                self.registry.write(*pid, *addr as usize, data)?;
                Ok(Reply::ack(request))
            }

            Request::View { pid } => {
                self.check_pid(*pid)?;
                let mut encoded = self.registry.view(*pid)?.encode();
                encoded.truncate(MAX_PAYLOAD);
                Ok(Reply::ack(request).with_payload(Zeroizing::new(encoded))?)
            }
        }
    }

    fn check_pid(&self, pid: u32) -> Result<(), DispatchError> {
        if pid == 0 || pid > self.limits.max_pid {
            return Err(DispatchError::PidOutOfRange {
                pid,
                max: self.limits.max_pid,
            });
        }
        Ok(())
    }

    fn check_address(&self, pid: u32, addr: u32) -> Result<(), DispatchError> {
        self.check_pid(pid)?;

        let arena_size = self.registry.arena_size(pid)?;
        if addr as usize >= arena_size {
            return Err(DispatchError::AddressOutOfRange { addr, arena_size });
        }
        Ok(())
    }
}
