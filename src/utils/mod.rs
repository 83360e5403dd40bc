pub mod constants;
mod errors;

pub use errors::{BrowseError, BrowseResult, ConfigError, QueryError};
