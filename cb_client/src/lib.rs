//! Internal modules for the Call Break client.
//!
//! This library provides command parsing and message rendering used by the
//! cb_client binary.

pub mod commands;
pub mod view;
