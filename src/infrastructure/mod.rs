pub mod diesel_repo;
pub mod memory;
pub mod models;
