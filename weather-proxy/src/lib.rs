//! HTTP front for the weather lookup proxy.
//!
//! The router lives in [`server`]; the `weather-proxy` binary wires it to
//! configuration and a TCP listener.

pub mod logging;
pub mod server;

pub use server::{router, serve};
