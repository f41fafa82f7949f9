//! Synstore: versioned storage for synaptic site annotations.
//!
//! Synstore keeps synapse, presynaptic site and postsynaptic site
//! annotations in a hierarchical container (groups, attributes and typed
//! datasets). It reads every historical layout of the on-disk schema and
//! always writes the current one, so loading and saving a store migrates it.
//!
//! # Modules
//!
//! - [`model`]: In-memory annotations, the registry and coordinate handling
//! - [`container`]: The container adapter and its backends
//! - [`format`]: Schema version detection
//! - [`store`]: Loading and saving annotations
//! - [`id_service`]: Fresh id allocation
//! - [`inspect`]: Summary statistics
//! - [`error`]: Error types for synstore operations

pub mod container;
pub mod error;
pub mod format;
pub mod id_service;
pub mod inspect;
pub mod model;
pub mod store;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

pub use error::StoreError;
pub use store::AnnotationsStore;

/// The synstore CLI application.
#[derive(Parser)]
#[command(name = "synstore")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Show the schema version and annotation statistics of a container.
    Inspect(InspectArgs),
    /// Rewrite a container in the current file format.
    Migrate(MigrateArgs),
    /// Dump the annotations of a container as JSON.
    Export(ExportArgs),
    /// Replace the annotations of a container with those of a JSON file.
    Import(ImportArgs),
}

/// Options shared by every subcommand that opens a container.
#[derive(clap::Args)]
struct GroupArg {
    /// Group holding the annotation datasets.
    #[arg(long, env = "SYNSTORE_GROUP", default_value = store::DEFAULT_GROUP)]
    group: String,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Arguments for the inspect subcommand.
#[derive(clap::Args)]
struct InspectArgs {
    /// Container to inspect.
    input: PathBuf,

    #[command(flatten)]
    group: GroupArg,

    /// Output format for the report.
    #[arg(long, value_enum, default_value = "text")]
    output: OutputFormat,
}

/// Arguments for the migrate subcommand.
#[derive(clap::Args)]
struct MigrateArgs {
    /// Container to migrate in place.
    input: PathBuf,

    #[command(flatten)]
    group: GroupArg,
}

/// Arguments for the export subcommand.
#[derive(clap::Args)]
struct ExportArgs {
    /// Container to read.
    input: PathBuf,

    /// JSON file to write.
    output: PathBuf,

    #[command(flatten)]
    group: GroupArg,
}

/// Arguments for the import subcommand.
#[derive(clap::Args)]
struct ImportArgs {
    /// JSON file to read.
    input: PathBuf,

    /// Container to write, created if missing.
    output: PathBuf,

    #[command(flatten)]
    group: GroupArg,
}

/// Run the synstore CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), StoreError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Inspect(args)) => run_inspect(args),
        Some(Commands::Migrate(args)) => run_migrate(args),
        Some(Commands::Export(args)) => run_export(args),
        Some(Commands::Import(args)) => run_import(args),
        None => {
            println!("synstore {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Versioned storage for synaptic site annotations.");
            println!();
            println!("Run 'synstore --help' for usage information.");
            Ok(())
        }
    }
}

fn run_inspect(args: InspectArgs) -> Result<(), StoreError> {
    let store = AnnotationsStore::new(&args.input).with_group(args.group.group);
    let info = store.format_info()?;
    let annotations = store.read()?;
    let report = inspect::inspect_annotations(&annotations).with_format(&info);

    match args.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print!("{}", report),
    }
    Ok(())
}

fn run_migrate(args: MigrateArgs) -> Result<(), StoreError> {
    let store = AnnotationsStore::new(&args.input).with_group(args.group.group);
    let source = store.migrate()?;

    println!(
        "Migrated {} from file format {} to {}",
        args.input.display(),
        source,
        format::CURRENT_FILE_FORMAT
    );
    Ok(())
}

fn run_export(args: ExportArgs) -> Result<(), StoreError> {
    let store = AnnotationsStore::new(&args.input).with_group(args.group.group);
    let annotations = store.read()?;
    model::io_json::write_annotations_json(&args.output, &annotations)?;

    println!(
        "Exported {} annotations to {}",
        annotations.len(),
        args.output.display()
    );
    Ok(())
}

fn run_import(args: ImportArgs) -> Result<(), StoreError> {
    let annotations = model::io_json::read_annotations_json(&args.input)?;
    let store = AnnotationsStore::new(&args.output).with_group(args.group.group);
    store.write(&annotations)?;

    println!(
        "Imported {} annotations into {}",
        annotations.len(),
        args.output.display()
    );
    Ok(())
}
