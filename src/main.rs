use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use colored::Colorize;
use dialog_graft::backup::{get_and_backup_workspace, BackupSink, FileBackup};
use dialog_graft::copy::{copy_dialog_branch, CopyRequest};
use dialog_graft::prune::{delete_branches_from_csv, PruneReport};
use dialog_graft::{
    diagram, entities, intents, Config, DirStore, InsertMode, MemoryStore, VocabCopy, VocabReport,
    WorkspaceStore,
};
use std::fs::File;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "dialog-graft")]
#[command(author, version, about = "Copy, prune and draw dialog branches; merge intents and entities")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Directory holding <workspace>.json exports (overrides config)
    #[arg(long, global = true)]
    workspace_dir: Option<PathBuf>,

    /// Show what each step is doing
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Copy a dialog branch (and whatever its jumps need) into another workspace
    CopyBranch {
        /// Source workspace id
        #[arg(long = "from")]
        source_workspace: String,

        /// Id or title of the branch to copy
        branch: String,

        /// Target workspace id
        #[arg(long = "to")]
        target_workspace: String,

        /// Id or title of the target anchor node, or "root"
        #[arg(long = "target", default_value = "root")]
        target_node: String,

        /// child, last_child or sibling (default from config)
        #[arg(long)]
        insert_as: Option<String>,

        /// Write the target workspace here before changing it
        #[arg(long)]
        backup: Option<PathBuf>,

        /// Show the resulting diagram without saving anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Delete the branches listed in a CSV file (columns: action,id)
    Prune {
        workspace: String,

        csv: PathBuf,

        #[arg(long)]
        backup: Option<PathBuf>,
    },

    /// Print a workspace's dialog as a tree
    Diagram { workspace: String },

    /// Save a copy of a workspace export
    Backup {
        workspace: String,

        /// File to write
        output: PathBuf,
    },

    /// Apply an intent CSV (columns: action,intent,example)
    LoadIntents {
        workspace: String,

        csv: PathBuf,

        /// Delete intents named in the file before adding
        #[arg(long)]
        clear_existing: bool,

        #[arg(long)]
        backup: Option<PathBuf>,
    },

    /// Merge one intent's examples into another workspace
    CopyIntent {
        intent: String,

        #[arg(long = "from")]
        source_workspace: String,

        #[arg(long = "to")]
        target_workspace: String,

        #[arg(long)]
        clear_existing: bool,

        #[arg(long)]
        backup: Option<PathBuf>,
    },

    /// Apply an entity CSV (columns: action,entity,value,synonym)
    LoadEntities {
        workspace: String,

        csv: PathBuf,

        /// Delete entities named in the file before adding
        #[arg(long)]
        clear_existing: bool,

        #[arg(long)]
        backup: Option<PathBuf>,
    },

    /// Merge one entity's values into another workspace
    CopyEntity {
        entity: String,

        #[arg(long = "from")]
        source_workspace: String,

        #[arg(long = "to")]
        target_workspace: String,

        #[arg(long)]
        clear_existing: bool,

        #[arg(long)]
        backup: Option<PathBuf>,
    },

    /// Generate shell completions
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();
    let config = Config::load();
    init_logging(cli.verbose, &config);

    match run(cli, &config) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}

/// RUST_LOG wins, then --verbose, then the config file
fn init_logging(verbose: bool, config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("info")
        } else {
            EnvFilter::new(&config.logging.filter)
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Runs one command; `Ok(false)` means it finished but some rows failed
fn run(cli: Cli, config: &Config) -> dialog_graft::Result<bool> {
    let store = DirStore::new(
        cli.workspace_dir
            .clone()
            .unwrap_or_else(|| config.store.workspace_dir.clone()),
    );

    match cli.command {
        Command::CopyBranch {
            source_workspace,
            branch,
            target_workspace,
            target_node,
            insert_as,
            backup,
            dry_run,
        } => {
            let mode = insert_as.unwrap_or_else(|| config.copy.default_insert_as.clone());
            let request = CopyRequest {
                source_workspace,
                branch,
                target_workspace,
                target_node,
                insert_as: InsertMode::parse(&mode, config.copy.lenient_insert_mode)?,
            };

            let outcome = if dry_run {
                let scratch = MemoryStore::new().with_workspace(
                    &request.target_workspace,
                    store.fetch_workspace(&request.target_workspace)?,
                );
                copy_dialog_branch(&store, &scratch, &request, None)?
            } else {
                let sink = backup.map(FileBackup::new);
                copy_dialog_branch(&store, &store, &request, sink_ref(&sink))?
            };

            let verb = if dry_run { "Would copy" } else { "Copied" };
            println!(
                "{} '{}' from {} into {} as {}",
                verb.green(),
                request.branch,
                request.source_workspace,
                request.target_workspace,
                request.insert_as
            );
            for id in &outcome.jumps.grafted {
                println!("   {} {} (jump target)", "Added".cyan(), id);
            }
            println!("\n{}", outcome.diagram);
            Ok(true)
        }

        Command::Prune {
            workspace,
            csv,
            backup,
        } => {
            let sink = backup.map(FileBackup::new);
            let report = delete_branches_from_csv(&store, &workspace, File::open(&csv)?, sink_ref(&sink))?;
            print_prune_report(&report);
            Ok(report.is_success())
        }

        Command::Diagram { workspace } => {
            println!("{}", diagram::generate_diagram(&store, &workspace)?);
            Ok(true)
        }

        Command::Backup { workspace, output } => {
            let sink = FileBackup::new(&output);
            get_and_backup_workspace(&store, &workspace, Some(&sink))?;
            println!("{} {}", "Saved".green(), output.display());
            Ok(true)
        }

        Command::LoadIntents {
            workspace,
            csv,
            clear_existing,
            backup,
        } => {
            let sink = backup.map(FileBackup::new);
            let report = intents::load_csv_as_intent_data(
                &store,
                &workspace,
                File::open(&csv)?,
                clear_existing,
                sink_ref(&sink),
            )?;
            print_vocab_report(&report);
            Ok(report.is_success())
        }

        Command::CopyIntent {
            intent,
            source_workspace,
            target_workspace,
            clear_existing,
            backup,
        } => {
            let request = VocabCopy {
                name: intent,
                source_workspace,
                target_workspace,
                clear_existing,
            };
            let sink = backup.map(FileBackup::new);
            let report = intents::copy_intent_data(&store, &store, &request, sink_ref(&sink))?;
            print_vocab_report(&report);
            Ok(report.is_success())
        }

        Command::LoadEntities {
            workspace,
            csv,
            clear_existing,
            backup,
        } => {
            let sink = backup.map(FileBackup::new);
            let report = entities::load_csv_as_entity_data(
                &store,
                &workspace,
                File::open(&csv)?,
                clear_existing,
                sink_ref(&sink),
            )?;
            print_vocab_report(&report);
            Ok(report.is_success())
        }

        Command::CopyEntity {
            entity,
            source_workspace,
            target_workspace,
            clear_existing,
            backup,
        } => {
            let request = VocabCopy {
                name: entity,
                source_workspace,
                target_workspace,
                clear_existing,
            };
            let sink = backup.map(FileBackup::new);
            let report = entities::copy_entity_data(&store, &store, &request, sink_ref(&sink))?;
            print_vocab_report(&report);
            Ok(report.is_success())
        }

        Command::Completion { shell } => {
            generate(shell, &mut Cli::command(), "dialog-graft", &mut std::io::stdout());
            Ok(true)
        }
    }
}

fn sink_ref(sink: &Option<FileBackup>) -> Option<&dyn BackupSink> {
    sink.as_ref().map(|s| s as &dyn BackupSink)
}

fn print_prune_report(report: &PruneReport) {
    for (identifier, id) in &report.removed {
        if identifier == id {
            println!("   {} {}", "Removed".green(), id);
        } else {
            println!("   {} {} ({})", "Removed".green(), identifier, id);
        }
    }
    for identifier in &report.not_found {
        println!("   {} {}", "Not found".yellow(), identifier);
    }
    for (identifier, reason) in &report.failed {
        println!("   {} {}: {}", "Failed".red(), identifier, reason);
    }
    println!(
        "\n{} removed, {} not found, {} failed",
        report.removed.len(),
        report.not_found.len(),
        report.failed.len()
    );
}

fn print_vocab_report(report: &VocabReport) {
    for name in &report.created {
        println!("   {} {}", "Created".green(), name);
    }
    for name in &report.updated {
        println!("   {} {}", "Updated".green(), name);
    }
    for name in &report.removed {
        println!("   {} {}", "Removed".green(), name);
    }
    for name in &report.missing {
        println!("   {} {}", "Not found".yellow(), name);
    }
    for (name, reason) in &report.failed {
        println!("   {} {}: {}", "Failed".red(), name, reason);
    }
    for row in &report.invalid {
        println!("   {} {}", "Invalid".red(), row);
    }
}
