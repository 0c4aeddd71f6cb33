//! Image host outbound adapters.
//!
//! This module provides a thin HTTP implementation of the `ImageUploader`
//! port for unsigned-preset upload endpoints.

mod dto;
mod http_uploader;

pub use http_uploader::HttpImageUploader;
