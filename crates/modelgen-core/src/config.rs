use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "modelgen.toml";

pub const DEFAULT_BLOCK_START: &str = "// AUTOGENERATED BY generate_models.py -- do not edit";
pub const DEFAULT_BLOCK_END: &str = "// END AUTOGENERATED BY generate_models.py";

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ModelgenConfig {
    #[serde(default)]
    pub env: EnvConfig,
    #[serde(default)]
    pub codegen: CodegenConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub environment: EnvironmentConfig,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Name of the overlay to apply, e.g. "ci" loads `modelgen.ci.toml`.
    /// After loading this holds the environment actually used.
    #[serde(default = "default_environment")]
    pub active: String,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            active: default_environment(),
        }
    }
}

fn default_environment() -> String {
    "development".to_string()
}

/// The `.env` file handed to the introspection tool.
#[derive(Debug, Serialize, Deserialize)]
pub struct EnvConfig {
    #[serde(default = "default_env_file")]
    pub file: PathBuf,
    #[serde(default = "default_env_variable")]
    pub variable: String,
    /// Write the env file at all. The variable is passed to the tool either way.
    #[serde(default = "default_true")]
    pub stage: bool,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            file: default_env_file(),
            variable: default_env_variable(),
            stage: true,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CodegenConfig {
    #[serde(default = "default_codegen_command")]
    pub command: String,
    /// Extra arguments placed before `--out-file`.
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self {
            command: default_codegen_command(),
            args: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_client")]
    pub client: String,
    /// Arguments placed before the database path.
    #[serde(default = "default_client_args")]
    pub args: Vec<String>,
    #[serde(default = "default_query")]
    pub query: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            client: default_client(),
            args: default_client_args(),
            query: default_query(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_out_file")]
    pub file: PathBuf,
    #[serde(default = "default_block_start")]
    pub block_start: String,
    #[serde(default = "default_block_end")]
    pub block_end: String,
    #[serde(default)]
    pub on_missing_markers: MissingMarkers,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            file: default_out_file(),
            block_start: default_block_start(),
            block_end: default_block_end(),
            on_missing_markers: MissingMarkers::default(),
        }
    }
}

/// What to do when the output file has neither marker.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingMarkers {
    #[default]
    Error,
    Append,
}

fn default_true() -> bool {
    true
}

fn default_env_file() -> PathBuf {
    PathBuf::from(".env")
}

fn default_env_variable() -> String {
    "DATABASE_URL".to_string()
}

fn default_codegen_command() -> String {
    "kysely-codegen".to_string()
}

fn default_client() -> String {
    "sqlite3".to_string()
}

fn default_client_args() -> Vec<String> {
    ["-list", "-noheader", "-separator", "|"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_query() -> String {
    "select * from version;".to_string()
}

fn default_out_file() -> PathBuf {
    Path::new("src").join("models.ts")
}

fn default_block_start() -> String {
    DEFAULT_BLOCK_START.to_string()
}

fn default_block_end() -> String {
    DEFAULT_BLOCK_END.to_string()
}

/// Deep-merge two TOML values. The `override_val` takes precedence over `base`.
/// Tables are merged recursively; all other types are replaced.
fn deep_merge(base: toml::Value, override_val: toml::Value) -> toml::Value {
    match (base, override_val) {
        (toml::Value::Table(mut base_table), toml::Value::Table(override_table)) => {
            for (key, override_v) in override_table {
                let merged = if let Some(base_v) = base_table.remove(&key) {
                    deep_merge(base_v, override_v)
                } else {
                    override_v
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_base, override_val) => override_val,
    }
}

fn read_table(path: &Path) -> Result<toml::Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: toml::Value =
        toml::from_str(&content).with_context(|| format!("Invalid TOML in {}", path.display()))?;
    Ok(value)
}

impl ModelgenConfig {
    /// Load `modelgen.toml` from `dir`, falling back to defaults when it is absent.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let config: ModelgenConfig = read_table(&path)?.try_into()?;
        Ok(config)
    }

    /// Load config with environment-specific overrides.
    ///
    /// The active environment comes from `MODELGEN_ENV`, then from
    /// `[environment] active` in the base config, defaulting to "development".
    /// If `modelgen.{env}.toml` exists it is deep-merged over the base file.
    pub fn load_with_env(dir: &Path) -> Result<Self> {
        let env_name = std::env::var("MODELGEN_ENV").ok();
        Self::load_for_env(dir, env_name.as_deref())
    }

    fn load_for_env(dir: &Path, env_name: Option<&str>) -> Result<Self> {
        let base_path = dir.join(CONFIG_FILE);
        let base_value = if base_path.exists() {
            read_table(&base_path)?
        } else {
            toml::Value::Table(toml::Table::new())
        };

        let env_name = env_name.map(str::to_string).unwrap_or_else(|| {
            base_value
                .get("environment")
                .and_then(|e| e.get("active"))
                .and_then(|a| a.as_str())
                .map(str::to_string)
                .unwrap_or_else(default_environment)
        });

        let env_path = dir.join(format!("modelgen.{}.toml", env_name));
        let merged_value = if env_path.exists() {
            deep_merge(base_value, read_table(&env_path)?)
        } else {
            base_value
        };

        let mut config: ModelgenConfig = merged_value
            .try_into()
            .with_context(|| format!("Invalid configuration in {}", dir.display()))?;
        config.environment.active = env_name;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
    }

    // ── Defaults ──────────────────────────────────────────────────────

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ModelgenConfig::load(dir.path()).unwrap();
        assert_eq!(config.env.file, PathBuf::from(".env"));
        assert_eq!(config.env.variable, "DATABASE_URL");
        assert!(config.env.stage);
        assert_eq!(config.codegen.command, "kysely-codegen");
        assert!(config.codegen.args.is_empty());
        assert_eq!(config.database.client, "sqlite3");
        assert_eq!(config.database.query, "select * from version;");
        assert_eq!(config.output.file, Path::new("src").join("models.ts"));
        assert_eq!(config.output.block_start, DEFAULT_BLOCK_START);
        assert_eq!(config.output.block_end, DEFAULT_BLOCK_END);
        assert_eq!(config.output.on_missing_markers, MissingMarkers::Error);
    }

    #[test]
    fn default_client_args_pin_list_format() {
        let config = DatabaseConfig::default();
        assert_eq!(config.args, vec!["-list", "-noheader", "-separator", "|"]);
    }

    #[test]
    fn empty_sections_use_field_defaults() {
        let dir = tempfile::tempdir().unwrap();
        write_config(dir.path(), CONFIG_FILE, "[env]\n[codegen]\n[database]\n[output]\n");
        let config = ModelgenConfig::load(dir.path()).unwrap();
        assert!(config.env.stage);
        assert_eq!(config.codegen.command, "kysely-codegen");
        assert_eq!(config.database.args.len(), 4);
        assert_eq!(config.output.block_end, DEFAULT_BLOCK_END);
    }

    // ── Loading values ────────────────────────────────────────────────

    #[test]
    fn partial_config_overrides_only_given_fields() {
        let dir = tempfile::tempdir().unwrap();
        write_config(
            dir.path(),
            CONFIG_FILE,
            r#"
[codegen]
command = "npx"
args = ["kysely-codegen", "--dialect", "sqlite"]

[output]
file = "lib/db/models.ts"
on_missing_markers = "append"
"#,
        );

        let config = ModelgenConfig::load(dir.path()).unwrap();
        assert_eq!(config.codegen.command, "npx");
        assert_eq!(config.codegen.args, vec!["kysely-codegen", "--dialect", "sqlite"]);
        assert_eq!(config.output.file, PathBuf::from("lib/db/models.ts"));
        assert_eq!(config.output.on_missing_markers, MissingMarkers::Append);
        assert_eq!(config.database.client, "sqlite3");
        assert_eq!(config.env.variable, "DATABASE_URL");
    }

    #[test]
    fn invalid_toml_errors() {
        let dir = tempfile::tempdir().unwrap();
        write_config(dir.path(), CONFIG_FILE, "[codegen\ncommand = ");
        assert!(ModelgenConfig::load(dir.path()).is_err());
    }

    #[test]
    fn unknown_missing_marker_mode_errors() {
        let dir = tempfile::tempdir().unwrap();
        write_config(dir.path(), CONFIG_FILE, "[output]\non_missing_markers = \"ignore\"\n");
        assert!(ModelgenConfig::load(dir.path()).is_err());
    }

    // ── Environment overlays ──────────────────────────────────────────

    #[test]
    fn overlay_is_merged_over_base() {
        let dir = tempfile::tempdir().unwrap();
        write_config(
            dir.path(),
            CONFIG_FILE,
            "[database]\nclient = \"sqlite3\"\nquery = \"select * from version;\"\n",
        );
        write_config(dir.path(), "modelgen.ci.toml", "[database]\nclient = \"/opt/sqlite/bin/sqlite3\"\n");

        let config = ModelgenConfig::load_for_env(dir.path(), Some("ci")).unwrap();
        assert_eq!(config.database.client, "/opt/sqlite/bin/sqlite3");
        assert_eq!(config.database.query, "select * from version;");
    }

    #[test]
    fn overlay_selected_from_base_config() {
        let dir = tempfile::tempdir().unwrap();
        write_config(dir.path(), CONFIG_FILE, "[environment]\nactive = \"local\"\n");
        write_config(dir.path(), "modelgen.local.toml", "[env]\nstage = false\n");

        let config = ModelgenConfig::load_for_env(dir.path(), None).unwrap();
        assert!(!config.env.stage);
        assert_eq!(config.environment.active, "local");
    }

    #[test]
    fn active_environment_records_the_one_used() {
        let dir = tempfile::tempdir().unwrap();
        write_config(dir.path(), CONFIG_FILE, "[environment]\nactive = \"local\"\n");

        let explicit = ModelgenConfig::load_for_env(dir.path(), Some("ci")).unwrap();
        assert_eq!(explicit.environment.active, "ci");

        let empty = tempfile::tempdir().unwrap();
        let fallback = ModelgenConfig::load_for_env(empty.path(), None).unwrap();
        assert_eq!(fallback.environment.active, "development");
    }

    #[test]
    fn overlay_without_base_file() {
        let dir = tempfile::tempdir().unwrap();
        write_config(dir.path(), "modelgen.ci.toml", "[output]\nfile = \"out.ts\"\n");

        let config = ModelgenConfig::load_for_env(dir.path(), Some("ci")).unwrap();
        assert_eq!(config.output.file, PathBuf::from("out.ts"));
    }

    #[test]
    fn missing_overlay_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let config = ModelgenConfig::load_for_env(dir.path(), Some("production")).unwrap();
        assert_eq!(config.codegen.command, "kysely-codegen");
    }

    #[test]
    fn deep_merge_replaces_scalars_and_keeps_siblings() {
        let base: toml::Value = toml::from_str("[a]\nx = 1\ny = 2\n").unwrap();
        let over: toml::Value = toml::from_str("[a]\ny = 3\n").unwrap();
        let merged = deep_merge(base, over);
        assert_eq!(merged["a"]["x"].as_integer(), Some(1));
        assert_eq!(merged["a"]["y"].as_integer(), Some(3));
    }
}
