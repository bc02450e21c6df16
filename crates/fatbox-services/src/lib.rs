//! Fatbox Services Layer
//!
//! This crate relays files to the external hosting services. The API crate
//! depends on the [`Forwarder`] trait and gets a [`HostingClient`] at startup;
//! tests can swap in their own forwarder or point the client at a stub server.

pub mod forwarder;
pub mod hosting;
pub mod retry;

pub use forwarder::{ForwardError, Forwarder};
pub use hosting::HostingClient;
pub use retry::RetryPolicy;
