//! Business logic services.

#![allow(missing_docs)]

pub mod audience;
pub mod permission;
pub mod poll;
pub mod result;
pub mod role;
pub mod user;
pub mod vote;

pub use audience::{AudiencePolicy, OpenAudience};
pub use permission::{Actor, VoteAction, check_ownership, has_permission, require_admin};
pub use poll::{CreatePollInput, PollService, PollWithOptions, UpdatePollInput, validate_title};
pub use result::{OptionResult, PollResult, PollResultService, PollResultSummary};
pub use role::{DEFAULT_POLLING_USER_ROLE, RoleService};
pub use user::UserService;
pub use vote::{CreateVoteInput, VoteService};
