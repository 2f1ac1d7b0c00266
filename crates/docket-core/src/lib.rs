pub mod aggregate;
pub mod config;
pub mod document;
pub mod entity;
pub mod error;
pub mod id;
pub mod io;
pub mod paths;
pub mod process;
pub mod store;
pub mod template;
pub mod transition;
pub mod types;
pub mod vcs;
pub mod workspace;

pub use error::{DocketError, Result};
