//! `install`: install the commit-message hooks and mark the repo ready.
//!
//! Idempotent; re-running once installed is a no-op.

use anyhow::Result;

use crate::hooks;
use crate::store;
use crate::ui;
use crate::vcs::Vcs;

pub fn run() -> Result<()> {
    let vcs = Vcs::new()?;
    let root = store::store_root()?;

    if store::is_installed(&root) {
        ui::info("already installed");
        return Ok(());
    }

    hooks::install(&vcs, vcs.git_dir())?;
    store::mark_installed(&root)?;

    ui::success("installed hooks; create your first stack with `new <name>`");
    Ok(())
}
