//! Classifier boundary: wire types and local normalization.

pub mod normalize;
pub mod types;

pub use normalize::{normalize, parse_model_output};
pub use types::{
    EntityRef, IntentEntities, IntentKind, NormalizedIntent, RawClassification, TaskEntities,
};
