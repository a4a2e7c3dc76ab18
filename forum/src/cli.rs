use std::fmt;

use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;

use crate::models::{Category, PostId};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Forum API base URL, e.g. http://localhost:8000/api
    #[arg(long, env = "FORUM_URL", global = true)]
    pub url: Option<String>,

    /// Log verbosity
    #[arg(short, long, value_name = "LEVEL", default_value_t = LogLevel::Info, global = true)]
    pub log_level: LogLevel,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Sign in and remember the session
    Login {
        #[arg(short, long)]
        username: Option<String>,

        /// Prompted for when omitted
        #[arg(short, long, env = "FORUM_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Show the feed
    Feed {
        #[arg(short, long, default_value = "All")]
        category: Category,
    },

    /// Search posts by relevance (at least 3 characters)
    Search {
        text: String,

        #[arg(short, long, default_value = "All")]
        category: Category,
    },

    /// Interactive feed: type to search, `:cat <name>`, `:post <text>`, `:quit`
    Browse {
        #[arg(short, long, default_value = "All")]
        category: Category,
    },

    /// Publish a new post
    Post { content: String },

    /// Like someone else's post
    Like { id: PostId },

    /// Flag a post as misleading (moderators only)
    Flag { id: PostId },

    /// Show a post with its comments
    Comments { id: PostId },

    /// Comment on a post
    Comment { id: PostId, content: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Off,
}

impl From<LogLevel> for LevelFilter {
    fn from(log_level: LogLevel) -> Self {
        match log_level {
            LogLevel::Trace => LevelFilter::Trace,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Off => LevelFilter::Off,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Off => "off",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_command() {
        let args = Args::try_parse_from(["forum", "search", "rust async", "-c", "Tech"]).unwrap();
        match args.command {
            Commands::Search { text, category } => {
                assert_eq!(text, "rust async");
                assert_eq!(category, Category::Named("Tech".to_string()));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_post_id() {
        let args = Args::try_parse_from(["forum", "like", "42"]).unwrap();
        assert!(matches!(args.command, Commands::Like { id } if id == PostId::new(42)));

        assert!(Args::try_parse_from(["forum", "like", "zero"]).is_err());
        assert!(Args::try_parse_from(["forum", "like", "0"]).is_err());
    }

    #[test]
    fn test_category_defaults_to_all() {
        let args = Args::try_parse_from(["forum", "feed"]).unwrap();
        assert!(matches!(args.command, Commands::Feed { category: Category::All }));
    }
}
