//! Ports layer: Trait definitions at the model seams.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the pipeline and the fitted artifacts it applies.

mod artifact_store;
mod classifier;
mod scaler;

pub use artifact_store::{ArtifactStore, Artifacts};
pub use classifier::Classifier;
pub use scaler::Scaler;
