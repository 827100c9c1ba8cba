//! Wire contract, upload client and configuration shared by the sheetdrop
//! frontends.

pub mod client;
pub mod config;
pub mod platform;
pub mod protocol;
