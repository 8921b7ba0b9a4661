pub mod converter;
pub mod download;
pub mod gateway;
pub mod llm;
pub mod staging;
pub mod worker_pool;
