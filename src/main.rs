use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use clap_complete::Shell;

mod branch_name;
mod commands;
mod config;
mod context;
mod error;
mod hooks;
mod host;
mod identity;
mod message;
mod mutate;
mod navigation;
mod operation_log;
pub mod platform;
pub mod program_name;
mod push;
mod refresh;
mod restack;
mod stack_context;
mod stack_viz;
mod store;
pub mod ui;
mod vcs;

#[derive(Parser)]
#[command(
    about = "A CLI for stacked pull requests",
    long_about = None,
    version,
    disable_help_subcommand = true,
    help_template = "\
{about}

{usage-heading} {usage}

Get Started:
  install     Install the commit-message hooks
  new         Create a stack rooted at HEAD
  status      Show the current stack

Navigate:
  up          Move toward the tip
  down        Move toward the base
  top         Jump to the tip

Sync:
  push        Create/update PRs for every active change
  refresh     Poll PR state and fold merged changes out
  restack     Rebase the stack onto its base

{all-args}
"
)]
struct Cli {
    /// Show git commands being executed
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Preview operations without executing them
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Install the commit-message hooks
    Install,

    /// Create a stack rooted at HEAD
    New {
        name: String,
        #[arg(long)]
        base: Option<String>,
    },

    /// Check out an existing stack's tip
    Switch { name: String },

    /// List all known stacks
    List,

    /// Show the stack's active changes
    Status {
        name: Option<String>,
        #[arg(long)]
        table: bool,
    },

    /// Show detailed per-change information
    Show { name: Option<String> },

    /// Move one change toward the tip
    Up,

    /// Move one change toward the base
    Down,

    /// Jump to the tip of the stack
    Top,

    /// Create or update PRs for every active change
    Push {
        #[arg(long)]
        dry_run: bool,
        #[arg(long)]
        force: bool,
    },

    /// Poll PR state and fold merged changes out of the stack
    Refresh,

    /// Rebase the stack onto its base (or a recovery step)
    Restack {
        #[arg(long)]
        fetch: bool,
        #[arg(long)]
        onto: Option<String>,
        #[arg(long)]
        recover: bool,
        #[arg(long)]
        retry: bool,
    },

    /// Fold staged changes into an earlier change via autosquash
    Fixup,

    /// Mark a change (or every active change) ready for review
    Ready {
        #[arg(long)]
        all: bool,
    },

    /// Mark a change (or every active change) as a draft
    Draft {
        #[arg(long)]
        all: bool,
    },

    /// Emit a shell completion script
    Completion { shell: Shell },

    /// View or edit configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Validate stack metadata against the repository
    Doctor {
        #[arg(long)]
        fix: bool,
    },

    /// Remove the commit-message hooks
    Uninstall,

    #[command(hide = true, name = "hook-prepare-commit-msg")]
    HookPrepareCommitMsg {
        message_file: String,
        source: Option<String>,
        #[allow(dead_code)]
        sha: Option<String>,
    },

    #[command(hide = true, name = "hook-commit-msg")]
    HookCommitMsg { message_file: String },

    #[command(hide = true, name = "hook-post-commit")]
    HookPostCommit,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show configuration from every layer
    Show,
    /// Get a single configuration value
    Get { key: String },
    /// Set a configuration value
    Set {
        key: String,
        value: String,
        #[arg(long)]
        local: bool,
    },
    /// Reset a configuration value to its default
    Unset {
        key: String,
        #[arg(long)]
        local: bool,
    },
}

fn install_signal_handler() {
    ctrlc::set_handler(|| {
        eprintln!("\n\nOperation interrupted. Run:");
        eprintln!("  {} restack --recover   to inspect a half-finished rebase", program_name::program_name());
        std::process::exit(130);
    })
    .expect("Error setting Ctrl-C handler");
}

#[tokio::main]
async fn main() {
    install_signal_handler();

    let prog_name = program_name::program_name();
    let matches = Cli::command().name(prog_name).get_matches();
    let cli = Cli::from_arg_matches(&matches).expect("Failed to parse arguments");

    context::ExecutionContext::init(cli.verbose, cli.dry_run);
    let ctx = context::ExecutionContext::new(cli.verbose, cli.dry_run);

    let command = match &cli.command {
        Some(cmd) => cmd,
        None => {
            eprintln!("No command provided. Run '{} --help' for usage.", prog_name);
            std::process::exit(1);
        }
    };

    let result = context::with_context(ctx, async {
        match command {
            Commands::Install => commands::install::run(),
            Commands::New { name, base } => commands::new::run(name, base.clone()),
            Commands::Switch { name } => commands::switch::run(name),
            Commands::List => commands::list::run(),
            Commands::Status { name, table } => commands::status::run(name.clone(), *table),
            Commands::Show { name } => commands::show::run(name.clone()),
            Commands::Up => commands::up::run(),
            Commands::Down => commands::down::run(),
            Commands::Top => commands::top::run(),
            Commands::Push { dry_run, force } => commands::push::run(*dry_run, *force),
            Commands::Refresh => commands::refresh::run().await,
            Commands::Restack { fetch, onto, recover, retry } => {
                commands::restack::run(*fetch, onto.clone(), *recover, *retry)
            }
            Commands::Fixup => commands::fixup::run(),
            Commands::Ready { all } => commands::ready::run(*all),
            Commands::Draft { all } => commands::draft::run(*all),
            Commands::Completion { shell } => commands::completion::run(*shell),
            Commands::Config { action } => match action {
                ConfigAction::Show => commands::config_cmd::show(),
                ConfigAction::Get { key } => commands::config_cmd::get(key),
                ConfigAction::Set { key, value, local } => commands::config_cmd::set(key, value, *local),
                ConfigAction::Unset { key, local } => commands::config_cmd::unset(key, *local),
            },
            Commands::Doctor { fix } => commands::doctor::run(*fix),
            Commands::Uninstall => commands::uninstall::run(),
            Commands::HookPrepareCommitMsg { message_file, source, .. } => {
                let vcs = vcs::Vcs::new()?;
                hooks::prepare_commit_msg(&vcs, std::path::Path::new(message_file), source.as_deref())
            }
            Commands::HookCommitMsg { message_file } => {
                let vcs = vcs::Vcs::new()?;
                hooks::commit_msg(&vcs, std::path::Path::new(message_file))
            }
            Commands::HookPostCommit => {
                // Never fails the commit: a cascade conflict here means the
                // stack needs a manual restack, not a rejected commit.
                let outcome: anyhow::Result<()> = (|| {
                    let vcs = vcs::Vcs::new()?;
                    hooks::post_commit(&vcs)
                })();
                if let Err(e) = outcome {
                    eprintln!("warning: stack update after commit failed: {:#}", e);
                    eprintln!("  run '{prog_name} restack' to reconcile manually");
                }
                Ok(())
            }
        }
    })
    .await;

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
