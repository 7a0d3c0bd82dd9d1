//! Gateway: HTTP endpoint that receives change events.
//!
//! `GET /` reports health; `POST /events` runs one event through the filter-and-notify
//! pipeline and answers with its completion payload.

mod server;

pub use server::{router, run_gateway, run_gateway_with_relay, GatewayState};
