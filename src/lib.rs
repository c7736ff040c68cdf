// src/lib.rs
pub mod config;
pub mod health;
pub mod metrics;
pub mod probes;
pub mod server;
