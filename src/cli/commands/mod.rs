//! CLI command handlers
//!
//! Each submodule handles a group of related subcommands.

mod admin;
mod query;
mod resolve;
mod tagging;

pub(crate) use admin::{cmd_cleanup, cmd_list_tags, cmd_reset};
pub(crate) use query::cmd_query;
pub(crate) use resolve::{cmd_delete, cmd_resolve};
pub(crate) use tagging::{cmd_tag, cmd_tags, cmd_untag};
