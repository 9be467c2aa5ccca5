pub mod corpus_loader;
pub mod data_gov_sg;
pub mod error;
pub mod onemap;
pub mod provider;
pub mod retry;
pub mod snapshot_cache;
