//! opreg demo binary.
//!
//! Builds the process-wide registry from every submitted operation and then:
//! - `run` executes the testing scenario over the demo entities
//! - `tags` prints the tag each demo entity reports
//! - `list` prints the submitted descriptors and what was installed

use clap::{Parser, Subcommand, ValueEnum};
use opreg_demo::{Entity, roster, run_scenario};
use opreg_registry::{DuplicatePolicy, OperationRegistry, RegistryConfig, current_tag_of, descriptors, init_with};
use tracing::info;
use opreg_macros as _;
#[cfg(test)]
use {pretty_assertions as _, rstest as _};

#[derive(Parser, Debug)]
#[command(name = "opreg-demo")]
#[command(about = "Runs and inspects the opreg demo operations")]
#[command(version)]
struct Cli {
	/// Verbose logging
	#[arg(short, long, global = true)]
	verbose: bool,

	/// What to do when an operand is registered twice
	#[arg(long, value_enum, default_value_t = Duplicates::LastWins, global = true)]
	duplicates: Duplicates,

	/// Subcommand to execute (defaults to `run`).
	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
	/// Dispatch the testing scenario over every demo entity
	Run,
	/// Print the tag of every demo entity type
	Tags,
	/// Print submitted descriptors, installed slots and duplicates
	List,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Duplicates {
	Panic,
	FirstWins,
	LastWins,
}

impl From<Duplicates> for DuplicatePolicy {
	fn from(value: Duplicates) -> Self {
		match value {
			Duplicates::Panic => Self::Panic,
			Duplicates::FirstWins => Self::FirstWins,
			Duplicates::LastWins => Self::LastWins,
		}
	}
}

fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();

	let subscriber = tracing_subscriber::fmt()
		.with_max_level(if cli.verbose {
			tracing::Level::DEBUG
		} else {
			tracing::Level::INFO
		})
		.with_writer(std::io::stderr)
		.finish();
	tracing::subscriber::set_global_default(subscriber)?;

	let config = RegistryConfig::default().with_duplicate_policy(cli.duplicates.into());
	info!(policy = %config.duplicate_policy, "building operation registry");
	let registry = init_with(config)?;

	match cli.command.unwrap_or(Command::Run) {
		Command::Run => run(registry),
		Command::Tags => tags(),
		Command::List => list(registry),
	}

	Ok(())
}

fn run(registry: &OperationRegistry) {
	for result in run_scenario(registry) {
		match &result.value {
			Ok(value) => println!("{:<8} testing = {value}", result.entity),
			Err(err) => println!("{:<8} testing failed: {err}", result.entity),
		}
		match &result.description {
			Ok(description) => println!("{:<8} describe = {description}", result.entity),
			Err(err) => println!("{:<8} describe failed: {err}", result.entity),
		}
	}
}

fn tags() {
	for entity in roster() {
		let entity: &dyn Entity = &*entity;
		println!("{:<8} {}", entity.name(), current_tag_of(entity));
	}
}

fn list(registry: &OperationRegistry) {
	println!("descriptors:");
	for descriptor in descriptors() {
		println!(
			"  [{}] {} -> {}",
			descriptor.crate_name,
			(descriptor.operation)(),
			(descriptor.operand)()
		);
	}

	println!("installed:");
	for registration in registry.registrations() {
		println!("  {registration}");
	}

	if !registry.duplicates().is_empty() {
		println!("duplicates:");
		for duplicate in registry.duplicates() {
			println!("  {duplicate}");
		}
	}
}
