pub mod cart_service;
pub mod commands;
