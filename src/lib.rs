pub mod application;
pub mod config;
pub mod http;

pub use application::WebApplication;
pub use config::AppConfig;
