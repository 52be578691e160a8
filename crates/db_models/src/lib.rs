#[macro_use]
extern crate diesel;

mod challenge;
pub use challenge::*;
mod join_request;
pub use join_request::*;
mod project;
pub use project::*;
mod skill;
pub use skill::*;
mod team;
pub use team::*;
mod team_member;
pub use team_member::*;
mod token;
pub use token::*;
mod user;
pub use user::*;

pub mod schema;
