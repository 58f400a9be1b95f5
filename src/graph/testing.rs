//! Scripted transport for unit tests

use super::request::RequestDescriptor;
use super::{Transport, TransportError};
use std::cell::RefCell;
use std::collections::VecDeque;

/// Replays queued responses in order and records every request it sees
#[derive(Default)]
pub struct RecordingTransport {
    responses: RefCell<VecDeque<Result<String, TransportError>>>,
    requests: RefCell<Vec<RequestDescriptor>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, body: impl Into<String>) -> Self {
        self.responses.borrow_mut().push_back(Ok(body.into()));
        self
    }

    pub fn reject(self, status: u16, body: impl Into<String>) -> Self {
        self.responses
            .borrow_mut()
            .push_back(Err(TransportError::new(Some(status), body)));
        self
    }

    pub fn calls(&self) -> usize {
        self.requests.borrow().len()
    }

    pub fn requests(&self) -> Vec<RequestDescriptor> {
        self.requests.borrow().clone()
    }

    pub fn last_url(&self) -> Option<String> {
        self.requests.borrow().last().map(|r| r.url.clone())
    }
}

impl Transport for RecordingTransport {
    async fn send(&self, request: &RequestDescriptor) -> Result<String, TransportError> {
        self.requests.borrow_mut().push(request.clone());
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::new(None, "Invalid request")))
    }
}
