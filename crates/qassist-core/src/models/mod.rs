//! Data models for qassist.

pub mod config;
pub mod extraction;
