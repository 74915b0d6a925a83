pub mod cache;
pub mod cli;
pub mod error;
pub mod git;
pub mod model;
pub mod progress;
pub mod trend;
pub mod util;
