pub mod cache;
pub mod config;
pub mod errors;
pub mod executor;
pub mod gateway;
pub mod grammar;
pub mod harness;
pub mod model;
pub mod providers;
pub mod report;
