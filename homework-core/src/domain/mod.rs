//! Core domain types
//!
//! Homework records as reported by the review API and the fixed set of
//! review statuses the bot knows how to describe.

pub mod homework;
pub mod status;
