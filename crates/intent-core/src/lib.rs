pub mod arguments;
pub mod audit;
pub mod bayes;
pub mod classifier;
pub mod command;
pub mod config;
pub mod embedding;
pub mod error;
pub mod exact;
pub mod io;
pub mod lifecycle;
pub mod paths;
pub mod resolve;
pub mod semantic;
pub mod state;
pub mod text;
pub mod types;

pub use classifier::{Alternative, ClassificationResult, InitOptions, IntentClassifier};
pub use error::{IntentError, Result};
