pub mod mutation;
pub mod types;

pub use mutation::{CollaboratorSnapshot, Mutation, MutationKind, NewProject, NewTask, ProjectFieldUpdate};
pub use types::{CollaboratorRecord, DomainSnapshot, ProjectMember, ProjectRecord, TaskRecord};
