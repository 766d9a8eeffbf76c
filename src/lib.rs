// Themebuzz: keyword buzz vs. price for election theme stocks
//
// This is the library root. Each module corresponds to a stage of the
// analysis pipeline: corpus loading, keyword extraction, buzz aggregation
// and the price merge.

pub mod buzz;
pub mod config;
pub mod corpus;
pub mod db;
pub mod error;
pub mod keywords;
pub mod output;
pub mod status;
