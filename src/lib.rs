//! L1 Chat Library
//!
//! A terminal chat that answers questions about Ethereum, Bitcoin, BNB Smart
//! Chain, Tron, and Base with live market, gas, and governance data. Every
//! upstream call goes through a cached fallback chain, so answers always
//! render even when providers are down.

pub mod app;
pub mod cache;
pub mod chat;
pub mod cli;
pub mod config;
pub mod data;
pub mod format;
pub mod logging;
pub mod ui;
pub mod worker;
