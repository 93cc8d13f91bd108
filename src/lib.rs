pub mod cli;
pub mod config;
pub mod device;
pub mod error;
pub mod job;
pub mod logging;
pub mod template;
pub mod types;
pub mod util;
