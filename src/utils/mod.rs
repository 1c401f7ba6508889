// Utility functions module
pub mod age_gate;
pub mod config;
pub mod config_store;
