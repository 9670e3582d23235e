pub mod generate;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "modelgen",
    version,
    about = "Regenerate database model types and splice in the version table"
)]
pub struct Cli {
    /// Database file to introspect (relative paths resolve against the project directory)
    #[arg(long)]
    pub db: PathBuf,

    /// Project directory containing modelgen.toml, the env file and the models file
    #[arg(short = 'C', long, default_value = ".")]
    pub project_dir: PathBuf,
}

pub fn run(cli: Cli) -> Result<()> {
    generate::run(&cli.db, &cli.project_dir)
}
