// Re-export all model types
pub use self::enums::*;
pub use self::errors::*;
pub use self::field::*;
pub use self::food::*;
pub use self::food_id::*;
pub use self::validation::*;

mod enums;
mod errors;
mod field;
mod food;
mod food_id;
mod validation;
