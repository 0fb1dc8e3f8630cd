pub mod common;
pub mod completion;
pub mod config;
pub mod error;
pub mod session;
pub mod storage;
pub mod ui;
