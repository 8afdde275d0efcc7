// Library exports for takeboard. Integration tests build the real router
// and state through these modules.

pub mod classifier;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod moderation;
pub mod notify;
pub mod presence;
pub mod review;
pub mod rewards;
pub mod routes;
pub mod scoring;
pub mod settings;
pub mod state;
pub mod time;
