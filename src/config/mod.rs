/// Database configuration and connection management
pub mod database;

/// Default menu and content seeding from config.toml
pub mod seed;

/// Runtime settings from environment variables
pub mod settings;
