pub mod compression;
pub mod config;
pub mod convert;
pub mod progress;
