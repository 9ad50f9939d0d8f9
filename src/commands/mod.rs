use std::io::Write;

use crate::cli::Command;
use crate::context;
use crate::storage::Storage;

pub mod set;
pub mod user;

pub trait CommandRunner {
    fn run<S: Storage, W: Write>(
        &self,
        ctx: &context::Context,
        storage: &S,
        out: &mut W,
    ) -> anyhow::Result<()>;
}

impl Command {
    pub fn run<S: Storage>(&self, ctx: &context::Context, storage: &S) -> anyhow::Result<()> {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        match self {
            Command::User { cmd } => cmd.run(ctx, storage, &mut out),
            Command::Set { cmd } => cmd.run(ctx, storage, &mut out),
        }
    }
}

fn print_json<W: Write, T: serde::Serialize + ?Sized>(out: &mut W, value: &T) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}
