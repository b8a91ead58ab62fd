//! Authentication gate and uptime monitor for the blog platform.
//!
//! The `web` and `services` modules host the bearer-token auth gate used by the
//! blog API, while `monitor` and `notifications` make up the polling uptime
//! supervisor that watches the deployed frontend and backend.

pub mod config;
pub mod db;
pub mod logging;
pub mod monitor;
pub mod notifications;
pub mod services;
pub mod shutdown;
pub mod version;
pub mod web;
