pub mod acs;
pub mod cleanup;
pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod metrics;
pub mod store;
