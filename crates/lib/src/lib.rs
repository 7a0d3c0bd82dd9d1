//! sgwatch core library: filters AWS Config change events for security groups and emails
//! the owner named in the group's tags. Used by the `sgwatch` CLI and gateway.

pub mod config;
pub mod dispatch;
pub mod event;
pub mod gateway;
pub mod handler;
pub mod init;
pub mod mail;
pub mod policy;

pub use dispatch::{DispatchError, Sent};
pub use event::Envelope;
pub use handler::{Outcome, Relay};
pub use policy::{NotificationRequest, Skip};
