pub mod cli;
pub mod config;
pub mod contracts;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod providers;
pub mod services;
