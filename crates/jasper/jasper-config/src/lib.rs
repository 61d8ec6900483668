#![forbid(unsafe_code)]

pub mod config;

pub use config::{ConfigError, FeedSection, GeneratorSection, JasperConfig};
