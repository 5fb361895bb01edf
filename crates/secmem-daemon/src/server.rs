// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! The serve loop: receive, dispatch, reply, until told to stop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use tracing::{info, warn};

use secmem_wire::{ExchangeError, Record, Transport, TransportError};

use crate::dispatch::{Dispatcher, Outcome};

/// Pause after a failed receive so a broken queue does not spin.
const ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Counters reported when the loop exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServeStats {
    pub received: usize,
    pub replied: usize,
    pub transport_errors: usize,
}

/// Why the loop exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Terminated,
    Signalled,
    Disconnected,
}

pub struct Server<T> {
    transport: T,
    dispatcher: Dispatcher,
}

impl<T: Transport> Server<T> {
    pub fn new(transport: T, dispatcher: Dispatcher) -> Self {
        Self {
            transport,
            dispatcher,
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Serves until a terminate request arrives, `stop` is raised, or the
    /// transport disconnects.
    ///
    /// `stop` is polled between messages and whenever a receive is
    /// interrupted.
    pub fn run(&self, stop: &AtomicBool) -> (StopReason, ServeStats) {
        let mut stats = ServeStats::default();

        let reason = loop {
            if stop.load(Ordering::Acquire) {
                break StopReason::Signalled;
            }

            let bytes = match self.transport.recv() {
                Ok(bytes) => bytes,
                Err(TransportError::Interrupted) => continue,
                Err(TransportError::Disconnected) => break StopReason::Disconnected,
                Err(error) => {
                    stats.transport_errors += 1;
                    warn!(%error, "receive failed");
                    thread::sleep(ERROR_BACKOFF);
                    continue;
                }
            };
            stats.received += 1;

            let record = match self.dispatcher.handle(&bytes) {
                Outcome::Reply(record) => record,
                Outcome::Terminate => break StopReason::Terminated,
            };

            match self.reply(&record) {
                Ok(()) => stats.replied += 1,
                Err(error) => {
                    stats.transport_errors += 1;
                    warn!(%error, pid = record.pid, "reply not sent");
                }
            }
        };

        info!(?reason, ?stats, "serve loop stopped");
        (reason, stats)
    }

    fn reply(&self, record: &Record) -> Result<(), ExchangeError> {
        let encoded = record.encode()?;
        self.transport.send(&encoded)?;
        Ok(())
    }

    /// Stops serving and returns the dispatcher; dropping it zeroizes every
    /// arena.
    pub fn into_dispatcher(self) -> Dispatcher {
        self.dispatcher
    }
}
