//! llvm-archive-lib: Staged LLVM build pipeline
//!
//! This crate provides the pieces that turn an LLVM release branch into a
//! distributable zip archive:
//! - `platform`: OS/architecture detection and directory defaults
//! - `layout`: deterministic stage paths derived from version and platform
//! - `stage`: idempotency checks and cleanup-on-failure for stage state
//! - `exec`: external process execution against an explicit search path
//! - `tools`: git/cmake verification and the cmake bootstrap installers
//! - `fetch`, `build`, `archive`: the pipeline stages
//! - `pipeline`: sequencing and the error taxonomy

pub mod archive;
pub mod build;
pub mod consts;
pub mod error;
pub mod exec;
pub mod fetch;
pub mod layout;
pub mod pipeline;
pub mod platform;
pub mod request;
pub mod stage;
pub mod tools;
#[cfg(test)]
mod util;
