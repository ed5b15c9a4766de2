//! `switch <name>`: check out an existing stack's TOP branch.

use anyhow::Result;

use crate::navigation;
use crate::store;
use crate::ui;
use crate::vcs::Vcs;

pub fn run(name: &str) -> Result<()> {
    let vcs = Vcs::new()?;
    let root = store::store_root()?;
    navigation::switch_stack(&vcs, &root, name)?;
    ui::success(&format!("switched to stack '{name}'"));
    Ok(())
}
