//! Shared library surface for the relay server and its tests.

pub mod api;
pub mod config;
pub mod state;
