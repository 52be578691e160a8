//! Business rules of the hackathon: who may do what, how users attach to
//! teams, and when a project submission counts as complete.

#[macro_use]
extern crate lazy_static;

pub mod error;
pub use error::{Ineligible, RuleError};
pub mod join_request;
pub use join_request::{Decision, JoinRequest, JoinStatus};
pub mod memory;
pub mod policy;
pub mod project;
pub use project::{PendingUpload, Project, ProjectFields, ProjectPatch, SubmissionStatus};
pub mod registration;
pub mod roles;
pub use roles::{Actor, Capabilities, Role, RoleFilter};
pub mod store;
pub use store::Store;
pub mod team;
pub use team::{Admission, Departure, TeamChanges, TeamDraft, TeamRoster, MAX_MEMBERS};
pub mod workflow;

pub type UserId = i32;
pub type TeamId = i32;
pub type ChallengeId = i32;
pub type RequestId = i32;
pub type ProjectId = i32;
pub type SkillId = i32;
