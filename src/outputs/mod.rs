//! Output generation for JSON and Markdown digests.
//!
//! # Submodules
//!
//! - [`json`]: Writes a [`crate::models::Digest`] for downstream collaborators
//! - [`markdown`]: Renders the digest as a reading list grouped by source and topic
//!
//! # Output Structure
//!
//! ```text
//! json_output_dir/
//! ├── 2025-05-06/
//! │   ├── morning.json
//! │   ├── afternoon.json
//! │   └── evening.json
//!
//! markdown_output_dir/
//! └── 2025-05-06_morning.md
//! ```

pub mod json;
pub mod markdown;
