//! Repositories: one per aggregate, each over a shared connection.

pub mod poll;
pub mod poll_vote;
pub mod role;
pub mod user;

pub use poll::{OptionChanges, PollRepository};
pub use poll_vote::PollVoteRepository;
pub use role::RoleRepository;
pub use user::UserRepository;
