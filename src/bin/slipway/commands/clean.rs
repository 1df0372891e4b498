//! `slipway clean` command

use anyhow::Result;

use slipway::ops::clean;

use crate::cli::CleanArgs;

pub fn execute(args: CleanArgs) -> Result<()> {
    let cfg = super::load_configuration(args.manifest_path.as_deref())?;

    clean(&cfg)?;
    eprintln!("     Removed build outputs for `{}`", cfg.output_name);

    Ok(())
}
