use studio_bridge_protocol::{GuestMessage, OutboundFrame};
use tokio::sync::mpsc;

use crate::TransportError;

/// Outbound side of the channel to the host.
///
/// `post` runs while the session is locked, so it must return promptly and
/// must not call back into the bridge.
pub trait Transport: Send + Sync {
    fn post(&self, target_origin: &str, message: &GuestMessage) -> Result<(), TransportError>;
}

/// Hands outbound messages to an in-process receiver, e.g. the writer half
/// of [`framing::serve`](crate::framing::serve) or a test acting as host.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<OutboundFrame>,
}

impl ChannelTransport {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OutboundFrame>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Transport for ChannelTransport {
    fn post(&self, target_origin: &str, message: &GuestMessage) -> Result<(), TransportError> {
        self.tx
            .send(OutboundFrame {
                target_origin: target_origin.to_string(),
                data: message.clone(),
            })
            .map_err(|_| TransportError::Closed)
    }
}
