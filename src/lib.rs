//! # imgtag - tag-indexed image library
//!
//! Associates image file names with tags, answers set queries over tags,
//! and resolves file names to paths on disk, repairing stale locations and
//! pruning files that have disappeared.
//!
//! ## Features
//!
//! - **SQLite index**: files, tags and associations with cascade on delete
//! - **Lookup cache**: TTL-bounded memoization with explicit invalidation
//! - **Self-healing paths**: stale hints trigger a rescan of the image root;
//!   files that cannot be found are removed from the index
//! - **Tag queries**: intersection over included tags, difference over excluded ones
//!
//! ## Quick Start
//!
//! ```no_run
//! use imgtag::config::Config;
//! use imgtag::TagIndex;
//!
//! # fn main() -> anyhow::Result<()> {
//! let cwd = std::env::current_dir()?;
//! let settings = Config::load(&cwd).settings(&cwd)?;
//! let index = TagIndex::open(&settings)?;
//!
//! index.add_tag("cat.jpg", "animal")?;
//! for name in index.search("animal -blurry")? {
//!     match index.resolve_path(&name)? {
//!         Some(path) => println!("{}", path.display()),
//!         None => println!("{name} is gone"),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod index;
pub mod query;
pub mod resolve;
pub mod source;
pub mod store;

pub use cache::{CacheOp, CachedValue, LookupCache};
pub use config::{Config, ConfigError, Settings};
pub use index::{IndexError, TagIndex};
pub use query::{normalize_tag, shuffled, TagQuery};
pub use resolve::PathResolver;
pub use source::{FileSource, LocalFileSource};
pub use store::{Store, StoreError, TagCount};
