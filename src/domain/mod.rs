pub mod models;
pub mod seed_bank;
pub mod shuffle;
pub mod titles;
