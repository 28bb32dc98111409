pub mod cancel;
pub mod citizens;
pub mod config;
pub mod db;
pub mod display;
pub mod error;
pub mod filter;
pub mod officers;
pub mod schema;
pub mod stats;
pub mod store;

#[cfg(test)]
mod tests;
