//! Invocation of the external collaborators: the schema-introspection tool
//! and the database command-line client.

use std::io;
use std::path::Path;
use std::process::{Command, Stdio};
use std::string::FromUtf8Error;

use thiserror::Error;

use crate::config::ModelgenConfig;

/// Directive appended after the query so the client exits instead of reading stdin.
pub const EXIT_DIRECTIVE: &str = ".exit";

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("failed to launch `{tool}`")]
    Launch {
        tool: String,
        #[source]
        source: io::Error,
    },

    #[error("`{tool}` {}{}", describe_exit(.exit_code), describe_output(.output))]
    Failed {
        tool: String,
        exit_code: Option<i32>,
        output: String,
    },

    #[error("`{tool}` wrote output that is not valid UTF-8")]
    InvalidUtf8 {
        tool: String,
        #[source]
        source: FromUtf8Error,
    },
}

fn describe_exit(exit_code: &Option<i32>) -> String {
    match exit_code {
        Some(code) => format!("exited with status {}", code),
        None => "was terminated by a signal".to_string(),
    }
}

fn describe_output(output: &str) -> String {
    let output = output.trim();
    if output.is_empty() {
        String::new()
    } else {
        format!(":\n{}", output)
    }
}

/// Human-readable rendering of a command line, for progress output.
pub fn display_command(command: &Command) -> String {
    let mut parts = vec![command.get_program().to_string_lossy().into_owned()];
    parts.extend(command.get_args().map(|a| a.to_string_lossy().into_owned()));
    parts.join(" ")
}

fn tool_name(command: &Command) -> String {
    command.get_program().to_string_lossy().into_owned()
}

/// Run a command with inherited stdio and require a zero exit status.
pub fn run_status(command: &mut Command) -> Result<(), ToolError> {
    let tool = tool_name(command);
    let status = command.status().map_err(|source| ToolError::Launch {
        tool: tool.clone(),
        source,
    })?;
    if !status.success() {
        return Err(ToolError::Failed {
            tool,
            exit_code: status.code(),
            output: String::new(),
        });
    }
    Ok(())
}

/// Run a command, capture stdout as UTF-8 and require a zero exit status.
///
/// On failure the captured stderr (or stdout when stderr is empty) is kept
/// in the error.
pub fn run_capture(command: &mut Command) -> Result<String, ToolError> {
    let tool = tool_name(command);
    let output = command
        .stdin(Stdio::null())
        .output()
        .map_err(|source| ToolError::Launch {
            tool: tool.clone(),
            source,
        })?;

    if !output.status.success() {
        let captured = if output.stderr.is_empty() {
            &output.stdout
        } else {
            &output.stderr
        };
        return Err(ToolError::Failed {
            tool,
            exit_code: output.status.code(),
            output: String::from_utf8_lossy(captured).into_owned(),
        });
    }

    String::from_utf8(output.stdout).map_err(|source| ToolError::InvalidUtf8 { tool, source })
}

/// Build the schema-introspection command:
/// `<command> <args..> --out-file <output.file>`, with the connection string
/// passed explicitly in the child's environment.
pub fn codegen_command(project_dir: &Path, config: &ModelgenConfig, database: &Path) -> Command {
    let mut command = Command::new(&config.codegen.command);
    command
        .args(&config.codegen.args)
        .arg("--out-file")
        .arg(&config.output.file)
        .env(&config.env.variable, database.as_os_str())
        .current_dir(project_dir);
    command
}

/// Build the version query command:
/// `<client> <args..> <database> <query> .exit`.
pub fn version_query_command(
    project_dir: &Path,
    config: &ModelgenConfig,
    database: &Path,
) -> Command {
    let mut command = Command::new(&config.database.client);
    command
        .args(&config.database.args)
        .arg(database)
        .arg(&config.database.query)
        .arg(EXIT_DIRECTIVE)
        .current_dir(project_dir);
    command
}
