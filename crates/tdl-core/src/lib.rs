pub mod config;
pub mod corpus;
pub mod create;
pub mod document;
pub mod error;
pub mod graph;
pub mod ident;
pub mod init;
pub mod io;
pub mod paths;
pub mod report;
pub mod scan;
pub mod templates;
pub mod trace;
pub mod types;

pub use error::{Result, TdlError};
