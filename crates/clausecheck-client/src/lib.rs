pub mod http;

pub use http::HttpSubmitter;
