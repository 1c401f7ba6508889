// Slash and prefix commands
pub mod config;
pub mod help;
pub mod register;
pub mod verify;
