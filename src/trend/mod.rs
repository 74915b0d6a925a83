pub mod columns;
pub mod count;
pub mod engine;
pub mod exec;
pub mod output;
pub mod select;
pub mod survey;

pub use columns::{Column, ColumnMapper};
pub use count::{count_lines, BlobLineCache};
pub use engine::{analyze, execute, Analysis, Plan, TrendConfig, TrendEngine};
pub use exec::{exec, list};
pub use output::{CollectOutput, Output, OutputFormat};
pub use select::{select_commits, SelectOptions, Selection};
pub use survey::{ranked_extensions, top_default_columns};
