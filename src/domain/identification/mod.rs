//! Identification domain module

mod match_result;

pub use match_result::MatchResult;
