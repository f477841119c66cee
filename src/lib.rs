pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod readers;
pub mod stages;
pub mod utils;
pub mod writers;

pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use pipeline::{Pipeline, PipelineSummary};
