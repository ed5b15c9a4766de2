//! `list`: names of all known stacks, with the current one marked.

use anyhow::Result;
use colored::Colorize;

use crate::store;

pub fn run() -> Result<()> {
    let root = store::store_root()?;
    let names = store::list_stack_names(&root)?;

    if names.is_empty() {
        println!("No stacks yet. Run '{}' to create one.", crate::ui::print_cmd(&format!("{} new <name>", crate::program_name::program_name())));
        return Ok(());
    }

    let current = store::read_current(&root)?;

    for name in &names {
        if current.as_deref() == Some(name.as_str()) {
            println!("{} {}", "*".green().bold(), name.bold());
        } else {
            println!("  {}", name);
        }
    }

    Ok(())
}
