pub mod acquisition;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod logging;
pub mod opensky;
pub mod scheduler;
pub mod store;
pub mod types;
