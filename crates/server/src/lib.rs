pub mod app;
pub mod config;
pub mod error;
pub mod protocol;
pub mod puzzles;
pub mod relay;
pub mod routes;
pub mod session;
pub mod store;
