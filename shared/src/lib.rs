pub mod auth;
pub mod config;
pub mod directory;
pub mod error;
pub mod filter;
pub mod mail;
pub mod models;
pub mod pagination;
pub mod store;


// Test utilities - publicly exposed with the test_utils feature
#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
