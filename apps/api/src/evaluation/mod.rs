// Post-interview evaluation.
// Scores each answer, combines the aggregates with the finalized integrity
// score into an advance | maybe | reject decision and stores the result.

pub mod config;
pub mod evaluator;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod similarity;
pub mod text;
