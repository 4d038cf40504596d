//! Studio Bridge
//!
//! Guest-side half of the messaging bridge between a sandboxed application and
//! the host that brokers model calls. The guest can only post messages to the
//! host and react to what comes back; this crate owns the handshake that locks
//! the host origin, the correlation of `generate_content` calls with their
//! replies, and dispatch of host-initiated function calls and screenshot
//! requests.
//!
//! Embedders create a [`Bridge`] over a [`Transport`], call [`Bridge::init`]
//! once, and feed every message the host delivers into
//! [`Bridge::handle_inbound`]. For byte-stream channels, [`framing::serve`]
//! does the feeding.

mod bridge;
pub mod config;
mod correlation;
mod error;
pub mod framing;
mod functions;
mod options;
mod screenshot;
mod transport;

pub use bridge::Bridge;
pub use config::BridgeConfig;
pub use correlation::{Correlator, Pending};
pub use error::{BridgeError, ConfigError, Result, TransportError};
pub use functions::{FunctionCallback, FunctionDeclaration};
pub use options::{GenerateContentOptions, InitOptions};
pub use screenshot::ScreenshotProvider;
pub use transport::{ChannelTransport, Transport};

pub use studio_bridge_protocol as protocol;
