pub mod validation;

pub use validation::{required, ValidatedJson};
