//! TappTrak Server Library
//!
//! Visitor overstay monitoring for a residential gate: the periodic sweep,
//! mail notifications and a small JSON API over the same store.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod monitor;
pub mod routes;
pub mod services;
