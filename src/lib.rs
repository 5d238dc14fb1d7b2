//! Counting Engine: natural-language counting games for chat channels.

pub mod channels;
pub mod config;
pub mod engine;
pub mod error;
pub mod parser;
pub mod session;
pub mod store;
