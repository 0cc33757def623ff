pub mod collection;
pub mod config;
pub mod credentials;
pub mod error;
pub mod llm;
pub mod options;
pub mod seed;
pub mod state;
pub mod taxonomy;
pub mod utils;
