pub mod config;
pub mod env_file;
pub mod pipeline;
pub mod splice;
pub mod template;
pub mod tools;
pub mod utils;
pub mod versions;
