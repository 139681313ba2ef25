use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "epgen")]
#[command(about = "Entry-point lookup and dispatch table generator")]
#[command(version)]
/// Command-line arguments.
pub struct Cli {
	/// Verbose logging (overridden by RUST_LOG)
	#[arg(short, long, global = true)]
	pub verbose: bool,

	/// Subcommand to execute.
	#[command(subcommand)]
	pub command: Command,
}

/// Documents every subcommand reads.
#[derive(Args, Debug, Clone)]
pub struct Inputs {
	/// Registry document; repeat to append further documents in order
	#[arg(long, short = 'r', value_name = "PATH", required = true)]
	pub registry: Vec<PathBuf>,

	/// Driver profile
	#[arg(long, short = 'p', value_name = "PATH")]
	pub profile: PathBuf,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
	/// Generate the tables and write them as a blob
	Generate {
		#[command(flatten)]
		inputs: Inputs,

		/// Output path (defaults to <prefix>_entrypoints.bin)
		#[arg(long, short = 'o', value_name = "PATH")]
		out: Option<PathBuf>,

		/// Guard symbol defined for the target build
		#[arg(long = "define", short = 'D', value_name = "SYMBOL")]
		defines: Vec<String>,
	},
	/// Resolve names to ids and report whether they are enabled
	Lookup {
		#[command(flatten)]
		inputs: Inputs,

		/// Requested API version (defaults to the highest declared)
		#[arg(long, value_name = "VERSION")]
		version: Option<String>,

		/// Condition atom that holds on the target device
		#[arg(long = "condition", short = 'c', value_name = "ATOM")]
		conditions: Vec<String>,

		/// Query in capability mode, before a device exists
		#[arg(long)]
		no_device: bool,

		/// Entry point names
		#[arg(required = true)]
		names: Vec<String>,
	},
	/// Print hash table statistics
	Stats {
		#[command(flatten)]
		inputs: Inputs,
	},
}
