//! The dialogue kernel: a pure state machine plus the async driver that
//! executes its side effects.

pub mod controller;
pub mod event;
pub mod state;
pub mod telemetry;
pub mod transition;

pub use controller::{DialogueController, SessionId, TurnOutput};
pub use event::{DialogueEvent, SideEffect};
pub use state::{DialogueState, FieldChange, PendingPayload, PendingTask, Phase, TaskSlot};
pub use transition::{transition, Step, TurnContext};
