pub mod benchmark;
pub mod cache;
pub mod scoring;
pub mod trend;
