//! demo-server: the web front end of the demo engine.
//!
//! A form collects a customer brief, the configured [`demo_agents::Delegator`]
//! turns it into an agent output, and the [`store::DemoStore`] writes it under
//! the demo root, which is also served back at `/generated_demos`.

pub mod config;
pub mod server;
pub mod store;
pub mod web;
