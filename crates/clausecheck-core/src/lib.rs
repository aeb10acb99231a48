pub mod config;
pub mod present;
pub mod session;
pub mod submit;
pub mod types;
pub mod wizard;

pub use types::*;
