// lib.rs
#![warn(clippy::large_futures)]

pub use std::{net, pin::Pin, sync::Arc};

pub use tokio::time::{sleep, Duration};

mod boot;
pub use boot::*;

mod config;
pub use config::*;

mod state;
pub use state::*;

mod mqtt;
pub use mqtt::*;

mod pinger;
pub use pinger::*;

mod wifi;
pub use wifi::*;

pub const FW_VERSION: &str = env!("CARGO_PKG_VERSION");

// EOF
