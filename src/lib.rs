pub mod analyzers;
pub mod config;
pub mod error;
pub mod fetch;
pub mod normalize;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod stats;

pub use analyzers::aqi::calculate_aqi;
pub use error::PipelineError;
