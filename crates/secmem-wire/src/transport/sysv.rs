// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! System V message queue transport.
//!
//! Every message is sent with message type 1 and received with type 0
//! (first in queue). Oversized messages are truncated on receipt rather
//! than left blocking the queue; the record decoder then rejects them.

use zeroize::{Zeroize, Zeroizing};

use super::Transport;
use crate::error::TransportError;
use crate::record::MAX_RECORD_LEN;

const MESSAGE_TYPE: libc::c_long = 1;
const PERMISSIONS: libc::c_int = 0o644;

#[repr(C)]
struct MessageBuffer {
    mtype: libc::c_long,
    mtext: [u8; MAX_RECORD_LEN],
}

impl MessageBuffer {
    fn boxed() -> Box<Self> {
        Box::new(Self {
            mtype: 0,
            mtext: [0; MAX_RECORD_LEN],
        })
    }
}

impl Drop for MessageBuffer {
    fn drop(&mut self) {
        self.mtext.zeroize();
    }
}

/// One System V message queue, created on first open.
#[derive(Debug)]
pub struct SysvQueue {
    key: libc::key_t,
    id: libc::c_int,
}

impl SysvQueue {
    pub fn open(key: libc::key_t) -> Result<Self, TransportError> {
        // SAFETY: msgget takes no pointers.
        let id = unsafe { libc::msgget(key, libc::IPC_CREAT | PERMISSIONS) };
        if id < 0 {
            return Err(TransportError::last_os("msgget"));
        }

        Ok(Self { key, id })
    }

    pub fn key(&self) -> libc::key_t {
        self.key
    }

    pub fn id(&self) -> libc::c_int {
        self.id
    }

    pub fn send(&self, bytes: &[u8]) -> Result<(), TransportError> {
        if bytes.len() > MAX_RECORD_LEN {
            return Err(TransportError::Oversized {
                len: bytes.len(),
                limit: MAX_RECORD_LEN,
            });
        }

        let mut buffer = MessageBuffer::boxed();
        buffer.mtype = MESSAGE_TYPE;
        buffer.mtext[..bytes.len()].copy_from_slice(bytes);

        // SAFETY: buffer is a live msgbuf-layout struct whose text holds at
        // least bytes.len() bytes.
        let rc = unsafe {
            libc::msgsnd(
                self.id,
                (&*buffer as *const MessageBuffer).cast(),
                bytes.len(),
                0,
            )
        };
        if rc < 0 {
            return Err(TransportError::last_os("msgsnd"));
        }

        Ok(())
    }

    /// Receives one message, blocking unless `nowait`. Returns `None` when
    /// `nowait` is set and the queue is empty.
    pub fn recv_with(&self, nowait: bool) -> Result<Option<Zeroizing<Vec<u8>>>, TransportError> {
        let mut buffer = MessageBuffer::boxed();
        let flags = libc::MSG_NOERROR | if nowait { libc::IPC_NOWAIT } else { 0 };

        // SAFETY: buffer is a live msgbuf-layout struct with MAX_RECORD_LEN
        // bytes of text.
        let received = unsafe {
            libc::msgrcv(
                self.id,
                (&mut *buffer as *mut MessageBuffer).cast(),
                MAX_RECORD_LEN,
                0,
                flags,
            )
        };

        if received < 0 {
            let error = TransportError::last_os("msgrcv");
            if nowait
                && matches!(&error, TransportError::Os { source, .. } if source.raw_os_error() == Some(libc::ENOMSG))
            {
                return Ok(None);
            }
            return Err(error);
        }

        Ok(Some(Zeroizing::new(
            buffer.mtext[..received as usize].to_vec(),
        )))
    }

    /// Discards every queued message. Returns how many were dropped.
    pub fn drain(&self) -> Result<usize, TransportError> {
        let mut dropped = 0;
        while self.recv_with(true)?.is_some() {
            dropped += 1;
        }
        Ok(dropped)
    }

    /// Removes the queue from the system.
    pub fn remove(self) -> Result<(), TransportError> {
        // SAFETY: IPC_RMID ignores the buffer argument.
        let rc = unsafe { libc::msgctl(self.id, libc::IPC_RMID, core::ptr::null_mut()) };
        if rc < 0 {
            return Err(TransportError::last_os("msgctl"));
        }
        Ok(())
    }
}

impl Transport for SysvQueue {
    fn recv(&self) -> Result<Zeroizing<Vec<u8>>, TransportError> {
        self.recv_with(false)?.ok_or(TransportError::Disconnected)
    }

    fn send(&self, bytes: &[u8]) -> Result<(), TransportError> {
        SysvQueue::send(self, bytes)
    }
}

/// A request queue and a reply queue seen from one side.
#[derive(Debug)]
pub struct SysvDuplex {
    inbound: SysvQueue,
    outbound: SysvQueue,
}

impl SysvDuplex {
    /// Daemon side: receives on `request_key`, replies on `reply_key`.
    pub fn server(request_key: libc::key_t, reply_key: libc::key_t) -> Result<Self, TransportError> {
        Ok(Self {
            inbound: SysvQueue::open(request_key)?,
            outbound: SysvQueue::open(reply_key)?,
        })
    }

    /// Client side: sends on `request_key`, receives on `reply_key`.
    pub fn client(request_key: libc::key_t, reply_key: libc::key_t) -> Result<Self, TransportError> {
        Ok(Self {
            inbound: SysvQueue::open(reply_key)?,
            outbound: SysvQueue::open(request_key)?,
        })
    }

    pub fn inbound(&self) -> &SysvQueue {
        &self.inbound
    }

    pub fn outbound(&self) -> &SysvQueue {
        &self.outbound
    }

    /// Removes both queues from the system.
    pub fn remove(self) -> Result<(), TransportError> {
        let inbound = self.inbound.remove();
        let outbound = self.outbound.remove();
        inbound.and(outbound)
    }
}

impl Transport for SysvDuplex {
    fn recv(&self) -> Result<Zeroizing<Vec<u8>>, TransportError> {
        self.inbound.recv()
    }

    fn send(&self, bytes: &[u8]) -> Result<(), TransportError> {
        self.outbound.send(bytes)
    }
}
