pub mod config;
pub mod id;
pub mod init;
pub mod new;
pub mod scan;
pub mod trace;
