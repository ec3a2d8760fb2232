pub mod config;
pub mod executor;
pub mod lockdiff;
pub mod logging;
pub mod model;
pub mod source;
pub mod traits;

// Re-export common types for convenience
pub use config::*;
pub use executor::*;
pub use lockdiff::*;
pub use model::*;
pub use source::*;
pub use traits::*;
