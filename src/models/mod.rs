pub mod category;
pub mod configuration;
pub mod sample;

pub use category::Category;
pub use configuration::{Configuration, Parameter, SearchSpace};
pub use sample::{BenchmarkSample, ReferenceSet, SampleSet};
