use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use modelgen_core::config::ModelgenConfig;
use modelgen_core::pipeline::{self, GenerateOptions};
use modelgen_core::utils::ui;

pub fn run(db: &Path, project_dir: &Path) -> Result<()> {
    println!(
        "{} {}",
        "Generating models from".bold(),
        db.display().to_string().cyan()
    );

    let config = ModelgenConfig::load_with_env(project_dir)?;
    println!(
        "  {} {}",
        "environment".dimmed(),
        config.environment.active
    );
    let options = GenerateOptions {
        project_dir: project_dir.to_path_buf(),
        database: db.to_path_buf(),
    };
    let report = pipeline::generate(&options, &config)?;

    ui::success(&format!(
        "Models generated ({} version entries)",
        report.versions.len()
    ));
    Ok(())
}
