//! Gatekeeper - Per-Client Rate Limiting Service
//!
//! This crate implements a fixed-window request-rate limiter keyed by client
//! id, an HTTP front end that asks it one yes/no question per request, and a
//! load-generating client that exercises the front end.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod ratelimit;
pub mod telemetry;
