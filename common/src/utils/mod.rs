pub mod config;
pub mod embedding;
pub mod ingest_limits;
