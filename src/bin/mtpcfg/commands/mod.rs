mod info;
mod merge;

use info::run_info;
use merge::run_merge;

use anyhow::Result;

use crate::cli::Command;
use crate::display::Context;

pub fn dispatch(command: Command, ctx: Context) -> Result<()> {
    match command {
        Command::Info(args) => run_info(args, ctx),
        Command::Merge(args) => run_merge(args, ctx),
    }
}
