//! Application layer: The pipeline stages and the prediction service.
//!
//! `pipeline` holds the stateless stage functions; `prediction` wires them
//! to a loaded, shared artifact context.

mod pipeline;
mod prediction;

pub use pipeline::{normalize, predict};
pub use prediction::{PredictionService, RangePolicy};
