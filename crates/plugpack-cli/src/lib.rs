//! plugpack library - the packaging pipeline and CLI commands
//!
//! Exposed as a library so the pipeline can be driven with a stub packaging
//! step in tests.

pub mod archive;
pub mod commands;
pub mod common;
pub mod errors;
pub mod keys;
pub mod output;
pub mod pipeline;

pub use common::GlobalOpts;
pub use errors::PackError;
pub use pipeline::{check_plugin, pack_plugin, PackOptions, PackReport};
pub use plugpack_config as config_manager;
pub use plugpack_logger as logger;
