pub mod context;
pub mod generation;
pub mod orchestrator;
pub mod org;
pub mod parse;
pub mod question_generator;
pub mod responses;
pub mod trends;
