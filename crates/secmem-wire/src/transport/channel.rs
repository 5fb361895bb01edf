// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! In-process transport over crossbeam channels.

use crossbeam_channel::{Receiver, Sender, TryRecvError, unbounded};
use zeroize::Zeroizing;

use super::Transport;
use crate::error::TransportError;
use crate::record::MAX_RECORD_LEN;

type Message = Zeroizing<Vec<u8>>;

/// One end of a connected pair.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    tx: Sender<Message>,
    rx: Receiver<Message>,
}

impl ChannelTransport {
    /// Two connected ends: what one sends the other receives.
    pub fn pair() -> (Self, Self) {
        let (a_tx, b_rx) = unbounded();
        let (b_tx, a_rx) = unbounded();

        (Self { tx: a_tx, rx: a_rx }, Self { tx: b_tx, rx: b_rx })
    }

    /// Non-blocking receive; `None` when nothing is queued.
    pub fn try_recv(&self) -> Result<Option<Message>, TransportError> {
        match self.rx.try_recv() {
            Ok(message) => Ok(Some(message)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(TransportError::Disconnected),
        }
    }
}

impl Transport for ChannelTransport {
    fn recv(&self) -> Result<Message, TransportError> {
        self.rx.recv().map_err(|_| TransportError::Disconnected)
    }

    fn send(&self, bytes: &[u8]) -> Result<(), TransportError> {
        if bytes.len() > MAX_RECORD_LEN {
            return Err(TransportError::Oversized {
                len: bytes.len(),
                limit: MAX_RECORD_LEN,
            });
        }

        self.tx
            .send(Zeroizing::new(bytes.to_vec()))
            .map_err(|_| TransportError::Disconnected)
    }
}
