pub mod bot;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod github;
pub mod render;
pub mod router;
pub mod session;
pub mod token_store;
pub mod types;

#[cfg(test)]
mod testing;

pub use bot::run;
