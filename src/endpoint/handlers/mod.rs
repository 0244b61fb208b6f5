pub mod config;
pub mod health;

pub use config::handle_config;
pub use health::health_check;
