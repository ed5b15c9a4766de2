//! `uninstall`: remove the commit-message hooks.
//!
//! Stack metadata under `.git/stack/` is left in place; only the hooks and
//! the install marker are removed.

use anyhow::Result;

use crate::hooks;
use crate::store;
use crate::ui;
use crate::vcs::Vcs;

pub fn run() -> Result<()> {
    let vcs = Vcs::new()?;
    let root = store::store_root()?;

    hooks::uninstall(vcs.git_dir())?;
    store::mark_uninstalled(&root)?;

    ui::success("uninstalled hooks");
    Ok(())
}
