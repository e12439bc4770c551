use crate::error::Result;
use crate::gateway::{ForwardRequest, GatewayOutcome, MessagingGateway, OutboundMessage};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, Ordering};

/// Gateway that records every call and replays scripted outcomes.
///
/// Unscripted sends succeed with sequential message ids.
pub struct RecordingGateway {
    sent: Mutex<Vec<OutboundMessage>>,
    forwarded: Mutex<Vec<ForwardRequest>>,
    send_script: Mutex<VecDeque<Result<GatewayOutcome>>>,
    forward_script: Mutex<VecDeque<Result<GatewayOutcome>>>,
    next_message_id: AtomicI64,
}

impl Default for RecordingGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::starting_at(1000)
    }

    pub fn starting_at(first_message_id: i64) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            forwarded: Mutex::new(Vec::new()),
            send_script: Mutex::new(VecDeque::new()),
            forward_script: Mutex::new(VecDeque::new()),
            next_message_id: AtomicI64::new(first_message_id),
        }
    }

    /// Queue the result of the next unscripted `send_message`
    pub fn push_send(&self, outcome: Result<GatewayOutcome>) {
        self.send_script.lock().push_back(outcome);
    }

    pub fn push_forward(&self, outcome: Result<GatewayOutcome>) {
        self.forward_script.lock().push_back(outcome);
    }

    pub fn sent_messages(&self) -> Vec<OutboundMessage> {
        self.sent.lock().clone()
    }

    pub fn forwarded_messages(&self) -> Vec<ForwardRequest> {
        self.forwarded.lock().clone()
    }

    pub fn send_count(&self) -> usize {
        self.sent.lock().len()
    }

    fn next_delivery(&self) -> GatewayOutcome {
        GatewayOutcome::delivered(vec![self.next_message_id.fetch_add(1, Ordering::SeqCst)])
    }
}

#[async_trait]
impl MessagingGateway for RecordingGateway {
    async fn send_message(&self, message: OutboundMessage) -> Result<GatewayOutcome> {
        self.sent.lock().push(message);
        let scripted = self.send_script.lock().pop_front();
        scripted.unwrap_or_else(|| Ok(self.next_delivery()))
    }

    async fn forward_message(&self, request: ForwardRequest) -> Result<GatewayOutcome> {
        self.forwarded.lock().push(request);
        let scripted = self.forward_script.lock().pop_front();
        scripted.unwrap_or_else(|| Ok(self.next_delivery()))
    }
}
