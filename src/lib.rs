pub mod auth;
pub mod common;
pub mod downloader;
pub mod manifest;
pub mod resolver;
