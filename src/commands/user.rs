use std::io::Write;

use anyhow::{Context, Result};

use super::{print_json, CommandRunner};
use crate::auth::hash_password;
use crate::cli;
use crate::context;
use crate::model::{clean_name, validate_email, validate_password};
use crate::storage::{Storage, UserDraft};

impl CommandRunner for cli::UserCmd {
    fn run<S: Storage, W: Write>(
        &self,
        ctx: &context::Context,
        storage: &S,
        out: &mut W,
    ) -> Result<()> {
        match self {
            cli::UserCmd::List => {
                let users = storage.list_users().context("listing users")?;
                print_json(out, &users)
            }
            cli::UserCmd::Show { email } => {
                let user = storage
                    .find_by_email(email)
                    .with_context(|| format!("looking up user {email}"))?;
                print_json(out, &user)
            }
            cli::UserCmd::Exists { email } => {
                let exists = storage
                    .exists_by_email(email)
                    .with_context(|| format!("checking user {email}"))?;
                writeln!(out, "{exists}")?;
                Ok(())
            }
            cli::UserCmd::Create {
                email,
                password,
                name,
            } => {
                let email = validate_email(email)?;
                validate_password(password)?;
                let hash = hash_password(password, ctx.bcrypt_cost)?;
                let user = storage
                    .save_user(&UserDraft::new(email, hash).with_name(clean_name(name.clone())))
                    .context("creating user")?;
                log::info!("👤 Created user {} ({})", user.id, user.email);
                print_json(out, &user)
            }
            cli::UserCmd::Delete { id } => {
                if storage.delete_user(*id).context("deleting user")? {
                    log::info!("🗑️ Deleted user {}", id);
                    writeln!(out, "deleted")?;
                } else {
                    anyhow::bail!("user {id} not found");
                }
                Ok(())
            }
        }
    }
}
