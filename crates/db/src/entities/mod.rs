//! Database entities.

pub mod poll;
pub mod poll_option;
pub mod poll_vote;
pub mod role;
pub mod user;

pub use poll::Entity as Poll;
pub use poll_option::Entity as PollOption;
pub use poll_vote::Entity as PollVote;
pub use role::Entity as Role;
pub use user::Entity as User;
