pub mod config;
pub mod constants;
pub mod engine;
pub mod files;
pub mod render;
