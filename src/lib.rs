pub mod annotate;
pub mod backend;
pub mod cache;
pub mod config;
pub mod fingerprint;
pub mod models;
pub mod prompts;
pub mod segment;
pub mod validator;

pub use annotate::Annotator;
pub use config::AppConfig;
