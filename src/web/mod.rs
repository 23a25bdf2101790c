//! HTTP command boundary.

pub mod api;
pub mod cooker_channel;
pub mod models;
