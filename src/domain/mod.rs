pub mod cart;
pub mod errors;
pub mod ports;
pub mod pricing;
pub mod query;
