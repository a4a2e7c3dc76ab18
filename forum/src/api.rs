pub mod forum;

pub use self::forum::{ForumApi, ForumClient};
