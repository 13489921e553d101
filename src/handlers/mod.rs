pub mod error;
pub mod food;
pub mod health;
pub mod metrics;

pub use error::{ApiError, Operation};
pub use food::{FoodState, DELETED_MESSAGE};
pub use health::*;
pub use metrics::*;
