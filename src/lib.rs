pub mod classification;
pub mod client;
pub mod config;
pub mod dto;
pub mod error;
pub mod export;
pub mod parser;
pub mod reassemble;
pub mod record;
pub mod request;
pub mod response;
pub mod session;
pub mod util;
