//! Kandan-Common: shared error types and small utilities.
//!
//! This crate provides functionality used across kandan:
//!
//! - **Error Handling**: the unified [`Error`] type and [`Result`] alias
//! - **Path Utilities**: video-file detection by extension
//!
//! # Examples
//!
//! ```
//! use kandan_common::{Error, Result};
//! use kandan_common::paths::is_video_file;
//! use std::path::Path;
//!
//! assert!(is_video_file(Path::new("episode01.mkv")));
//!
//! fn example() -> Result<()> {
//!     Err(Error::not_found("video", "ABCDEF"))
//! }
//! ```

pub mod error;
pub mod paths;

pub use error::{Error, Result};
