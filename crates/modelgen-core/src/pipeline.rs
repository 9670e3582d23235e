use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};

use crate::config::ModelgenConfig;
use crate::env_file::{self, StagedEnv};
use crate::splice::{self, Markers, SpliceOutcome};
use crate::template::TemplateEngine;
use crate::tools;
use crate::utils::ui;
use crate::versions::VersionTable;

#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Directory holding the env file and the output file; tools run here.
    pub project_dir: PathBuf,
    /// Database file, passed to the tools verbatim.
    pub database: PathBuf,
}

#[derive(Debug)]
pub struct GenerateReport {
    /// `None` when env staging is disabled in the config.
    pub staged: Option<StagedEnv>,
    pub versions: VersionTable,
    pub outcome: SpliceOutcome,
}

fn relative_display(project_dir: &Path, path: &Path) -> String {
    path.strip_prefix(project_dir)
        .unwrap_or(path)
        .display()
        .to_string()
}

/// Stage the env file, regenerate the models, read the version table and
/// splice it into the generated file. Stops at the first failure.
pub fn generate(options: &GenerateOptions, config: &ModelgenConfig) -> Result<GenerateReport> {
    let project_dir = options.project_dir.as_path();
    let database = options.database.as_path();
    let output_path = project_dir.join(&config.output.file);
    let markers = Markers::new(&config.output.block_start, &config.output.block_end)
        .context("Invalid [output] markers")?;

    ui::section("Staging environment");
    let staged = if config.env.stage {
        let env_path = project_dir.join(&config.env.file);
        let staged = env_file::stage(&env_path, &config.env.variable, database)?;
        if let Some(backup) = &staged.backup_path {
            ui::created(&relative_display(project_dir, backup));
        }
        ui::updated(&relative_display(project_dir, &env_path));
        Some(staged)
    } else {
        ui::skipped(
            &config.env.file.display().to_string(),
            "staging disabled",
        );
        None
    };

    ui::section("Generating models");
    let mut codegen = tools::codegen_command(project_dir, config, database);
    ui::running(&tools::display_command(&codegen));
    tools::run_status(&mut codegen).context("Schema introspection failed")?;

    ui::section("Reading version table");
    let mut query = tools::version_query_command(project_dir, config, database);
    ui::running(&tools::display_command(&query));
    let output = tools::run_capture(&mut query).context("Version query failed")?;
    let versions = VersionTable::parse(&output)
        .with_context(|| format!("Invalid version table in {}", database.display()))?;
    if versions.is_empty() {
        ui::warn("version table is empty");
    }

    let engine = TemplateEngine::new()?;
    let block = splice::render_block(&engine, markers, &versions)?;
    let outcome = splice::splice_file(
        &output_path,
        markers,
        &block,
        config.output.on_missing_markers,
    )?;

    let target = relative_display(project_dir, &output_path);
    match outcome {
        SpliceOutcome::Replaced | SpliceOutcome::Appended => {
            ui::injected(&target, &format!("MODEL_VERSIONS ({} entries)", versions.len()))
        }
        SpliceOutcome::Unchanged => ui::skipped(&target, "versions unchanged"),
    }

    Ok(GenerateReport {
        staged,
        versions,
        outcome,
    })
}
