pub mod baseline;
pub mod classifier;
pub mod error;
pub mod heat_score;
