//! Wire protocol for the studio bridge.
//!
//! Messages travel as JSON objects tagged by a `type` field. The guest posts
//! [`GuestMessage`]s to its parent and receives [`HostMessage`]s back. When the
//! channel is a byte stream rather than a window, each message is wrapped in
//! an [`InboundFrame`] or [`OutboundFrame`] that carries the origin.

mod error;
mod frame;
mod guest;
mod host;

pub use error::DecodeError;
pub use frame::{InboundFrame, OutboundFrame};
pub use guest::{FunctionDeclaration, GuestMessage, ModelRequest};
pub use host::HostMessage;

/// Model requested by `init` when the guest does not name one.
pub const DEFAULT_MODEL: &str = "models/gemini-1-5-flash-002";
