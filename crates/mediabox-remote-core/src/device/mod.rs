//! Device command channel.
//!
//! A [`CommandChannel`] holds at most one [`Session`] to the selected device,
//! opened over TCP or the short-range link depending on the stored target.

pub mod channel;
pub mod short_range;
pub mod tcp;
pub mod transport;

pub use channel::{ChannelState, CommandChannel, Delivery};
pub use short_range::{NoShortRangeAdapter, PeerInfo, ShortRangeAdapter};
pub use transport::{CommandStream, Session, TargetDescriptor, Transport, TransportKind};
