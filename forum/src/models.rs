pub mod forum;
pub mod id;
pub mod query;

pub use self::forum::*;
pub use self::id::{CommentId, Id, IdParseError, PostId, UserId};
pub use self::query::{Category, QueryState, SearchMode, MIN_SEARCH_LEN};
