// Bot features
pub mod guild_settings;
pub mod verify;
