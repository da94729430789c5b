pub mod aggregate;
pub mod config;
pub mod cycle;
pub mod dataset;
pub mod fetch;
pub mod filter;
pub mod loader;
pub mod output;
pub mod parser;
pub mod views;
