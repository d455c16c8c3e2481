pub mod cli;
pub mod commands;
pub mod common;
pub mod config;
pub mod linkage;
pub mod store;
