// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Request/reply exchange over any [`Transport`].

use crate::error::ExchangeError;
use crate::message::{Reply, Request};
use crate::record::Record;
use crate::tag::OpTag;
use crate::transport::Transport;

#[derive(Debug)]
pub struct Client<T> {
    transport: T,
}

impl<T: Transport> Client<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Sends `request` without waiting for an answer.
    pub fn submit(&self, request: &Request) -> Result<(), ExchangeError> {
        self.submit_record(&request.to_record()?)
    }

    /// Sends a raw record, which need not be a well-formed request.
    pub fn submit_record(&self, record: &Record) -> Result<(), ExchangeError> {
        let bytes = record.encode()?;
        self.transport.send(&bytes)?;
        Ok(())
    }

    /// Waits for the next reply.
    pub fn receive(&self) -> Result<Reply, ExchangeError> {
        let bytes = self.transport.recv()?;
        Ok(Reply::from_record(Record::decode(&bytes)?)?)
    }

    /// Sends `request` and waits for its reply. Terminate is never
    /// answered, so it returns `None` as soon as it is sent.
    pub fn call(&self, request: &Request) -> Result<Option<Reply>, ExchangeError> {
        self.submit(request)?;

        if request.op() == OpTag::Terminate {
            return Ok(None);
        }
        self.receive().map(Some)
    }
}
