use std::io::Write;

use anyhow::{Context, Result};

use super::{print_json, CommandRunner};
use crate::cli;
use crate::context;
use crate::storage::Storage;

impl CommandRunner for cli::SetCmd {
    fn run<S: Storage, W: Write>(
        &self,
        _ctx: &context::Context,
        storage: &S,
        out: &mut W,
    ) -> Result<()> {
        match self {
            cli::SetCmd::List { user_id } => {
                let sets = match user_id {
                    Some(user_id) => storage
                        .list_sets_by_user(*user_id)
                        .with_context(|| format!("listing sets of user {user_id}"))?,
                    None => storage.list_sets().context("listing sets")?,
                };
                print_json(out, &sets)
            }
            cli::SetCmd::Show { id } => {
                let set = storage
                    .find_set(*id)
                    .with_context(|| format!("loading set {id}"))?
                    .with_context(|| format!("set {id} not found"))?;
                print_json(out, &set)
            }
            cli::SetCmd::Delete { id } => {
                if !storage.delete_set(*id).context("deleting set")? {
                    anyhow::bail!("set {id} not found");
                }
                log::info!("🗑️ Deleted set {} and its cards", id);
                writeln!(out, "deleted")?;
                Ok(())
            }
        }
    }
}
