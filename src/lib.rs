//! dlp-audit: DLP whitelist policy extraction and scan export.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod maillog;
pub mod pipeline;
pub mod policy;
pub mod report;
pub mod scan;
pub mod validate;
