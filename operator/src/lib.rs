pub mod config;
pub mod counters;
pub mod dispatch;
pub mod error;
pub mod generator;
pub mod handler;
pub mod metrics_provider;
pub mod service;
pub mod state;
