pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod html;
pub mod interfaces;
pub mod logging;
pub mod runtime_paths;
pub mod storage;
pub mod terminal;
pub mod widgets;

pub type Result<T> = std::result::Result<T, error::ClientDeskError>;

pub const BUILD_REV: &str = env!("CLIENTDESK_BUILD_REV");
