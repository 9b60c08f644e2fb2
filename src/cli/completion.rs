//! Shell completion generation for elaster
//!
//! Generates completion scripts for bash, zsh and fish. The bash and fish
//! scripts also complete `--only` with the collection names of the current
//! configuration file.

use clap::CommandFactory;
use clap_complete::{Shell, generate};

use crate::cli::CliArgs;
use crate::error::{ConfigError, Result};

const BIN: &str = "elaster";

/// Generate shell completion script
///
/// # Arguments
/// * `shell_name` - Shell type (bash, zsh, fish)
///
/// # Returns
/// * `Result<String>` - Completion script or error
pub fn generate_completion(shell_name: &str) -> Result<String> {
    let shell = parse_shell(shell_name)?;
    let base = base_completion(shell);

    let script = match shell {
        Shell::Bash => format!(
            r#"{base}
_elaster_list_collections() {{
    elaster config --list-collections 2>/dev/null
}}

_elaster_enhanced() {{
    local cur prev words cword
    _init_completion || return

    if [[ "$prev" == "--only" ]]; then
        COMPREPLY=($(compgen -W "$(_elaster_list_collections)" -- "$cur"))
        return 0
    fi

    _elaster "$@"
}}

complete -F _elaster_enhanced elaster
"#
        ),
        Shell::Fish => format!(
            r#"{base}
function __elaster_list_collections
    elaster config --list-collections 2>/dev/null
end

complete -c elaster -l only -f -a "(__elaster_list_collections)" -d "Collection from config file"
"#
        ),
        _ => base,
    };

    Ok(script)
}

/// Completion generated by clap for `shell`
fn base_completion(shell: Shell) -> String {
    let mut cmd = CliArgs::command();
    let mut buffer = Vec::new();
    generate(shell, &mut cmd, BIN, &mut buffer);
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Parse shell name string to Shell enum
fn parse_shell(shell_name: &str) -> Result<Shell> {
    match shell_name.to_lowercase().as_str() {
        "bash" => Ok(Shell::Bash),
        "zsh" => Ok(Shell::Zsh),
        "fish" => Ok(Shell::Fish),
        _ => Err(ConfigError::InvalidValue {
            field: "shell".to_string(),
            value: format!("{shell_name} (supported: bash, zsh, fish)"),
        }
        .into()),
    }
}
