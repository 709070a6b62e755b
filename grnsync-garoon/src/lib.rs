//! Garoon (Cybozu groupware) schedule source for grnsync.

mod client;
pub mod decode;

pub use client::{GaroonClient, SCHEDULE_SERVICE_PATH, UTIL_SERVICE_PATH};
