//! Social graph and timeline services for chirp
//!
//! Four services over the storage traits: the follow graph, post
//! mutations (create, edit, like, save, delete), feed composition, and
//! profile reads. The store has no cross-document transactions, so every
//! dual-write here follows the same discipline: primary write first,
//! projection second, compensating undo if the projection fails.

pub mod feeds;
pub mod graph;
pub mod posts;
pub mod profiles;

pub use feeds::{FeedError, FeedPost, FeedService, PostAuthor, SavedFeed};
pub use graph::{FollowTransition, GraphError, GraphService};
pub use posts::{DeletePolicy, LikeOutcome, PostError, PostService, SaveOutcome, UpdateOutcome};
pub use profiles::{Profile, ProfileError, ProfileService, UserSummary};
