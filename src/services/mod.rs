pub mod llm;
pub mod planner_api;
pub mod ports;

pub use llm::LlmClient;
pub use planner_api::PlannerApiClient;
pub use ports::{AudioClip, IntentClassifier, MutationApi, SnapshotSource, Transcriber};
