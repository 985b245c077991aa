//! Load-generating client used to exercise the admission endpoint.
//!
//! Each [`WorkerManager`] drives one client id with a pool of [`Worker`]s.
//! A worker sends a request, waits a random pause, and repeats until it is
//! cancelled.

mod manager;
mod request;
#[cfg(test)]
mod stub;
mod worker;

pub use manager::WorkerManager;
pub use request::{ClientError, HttpClient};
pub use worker::{Worker, WorkerSettings, WorkerStats};
