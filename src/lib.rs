pub mod cli;
pub mod error;
pub mod models;
pub mod sampler;
pub mod state;
pub mod tuner;

pub use error::{PortaError, Result};
pub use models::{BenchmarkSample, Category, Configuration, Parameter, ReferenceSet, SampleSet};
