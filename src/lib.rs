pub mod config;
pub mod errors;
pub mod pi;
pub mod utils;
pub mod worker_pool;
