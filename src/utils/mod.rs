pub mod error;

pub use error::{LabsmokeError, Result};
