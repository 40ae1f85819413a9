//! Domain enums and row-independent value types.

pub mod post;
pub mod vote;

pub use post::PostKind;
pub use vote::{TargetType, VoteValue};
