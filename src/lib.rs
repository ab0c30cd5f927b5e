// src/lib.rs

pub mod config;
pub mod core;
pub mod corpus;
pub mod decision_log;
pub mod error;
pub mod interactive;
pub mod navigator;
pub mod persistence;
pub mod replay;
pub mod session;

pub use crate::core::{analyze, Analysis};
pub use crate::error::{Result, SpellerError};
