pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;

pub use config::RegisterConfig;
pub use error::{CleaningError, Result};
pub use pipeline::nls::{run_nls, NlsOptions};
pub use pipeline::processing::dates::{parse_date, DateClass};
pub use pipeline::processing::normalize::normalize_title;
pub use pipeline::register::run_register;
pub use pipeline::RunSummary;
