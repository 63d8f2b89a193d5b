#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Concrete brains that can occupy a seat.
//!
//! [`ChannelBrain`] bridges a seat to another thread through a pair of
//! channels. [`Autopilot`] answers every request itself, deterministically,
//! and is what headless matches and replay tests seat by default.

mod autopilot;
mod channel;

pub use autopilot::Autopilot;
pub use channel::{channel, ChannelBrain, ChannelPeer};
