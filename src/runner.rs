//! Spawns build commands directly (never through a shell), logging each one
//! rendered as a shell-copy-pastable line before it runs.

use std::process::Stdio;

use crate::error::{BuildError, MaekError};

/// Quote a single argument only if it contains shell metacharacters or would
/// otherwise be misread when pasted back into a shell (a leading `=` or `#`).
fn quote_arg(arg: &str) -> String {
    let needs_quoting = arg.is_empty()
        || arg.starts_with('=')
        || arg.starts_with('#')
        || arg.chars().any(|c| {
            matches!(
                c,
                ' ' | '\t'
                    | '\n'
                    | '\''
                    | '"'
                    | '\\'
                    | '$'
                    | '`'
                    | '!'
                    | '*'
                    | '?'
                    | '['
                    | ']'
                    | '('
                    | ')'
                    | '{'
                    | '}'
                    | '<'
                    | '>'
                    | '|'
                    | '&'
                    | ';'
                    | '~'
            )
        });
    if needs_quoting {
        format!("'{}'", arg.replace('\'', r"'\''"))
    } else {
        arg.to_string()
    }
}

/// Render a command vector the way it would need to be typed to reproduce
/// it at a shell prompt.
pub fn render(command: &[String]) -> String {
    command.iter().map(|a| quote_arg(a)).collect::<Vec<_>>().join(" ")
}

/// Run a command to completion with inherited stdout/stderr and closed
/// stdin, returning a [`BuildError`] on nonzero exit or spawn failure.
/// `label` names the task the command belongs to, so concurrent output from
/// several tasks can still be attributed to the one that produced it.
pub async fn run(command: &[String], label: &str) -> Result<(), MaekError> {
    let Some((program, args)) = command.split_first() else {
        return Err(BuildError::new("empty command").into());
    };

    tracing::info!(label, cmd = %render(command), "running");

    let mut child = tokio::process::Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|e| BuildError::new(format!("failed to start `{program}`: {e}")))?;

    let status = child
        .wait()
        .await
        .map_err(|e| BuildError::new(format!("failed to wait on `{program}`: {e}")))?;

    if !status.success() {
        return Err(BuildError::new(format!(
            "command failed ({status}): {}",
            render(command)
        ))
        .into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn quotes_only_what_needs_it() {
        let cmd = vec!["c++".to_string(), "-o".to_string(), "a b".to_string(), "x".to_string()];
        assert_eq!(render(&cmd), "c++ -o 'a b' x");
    }

    #[tokio::test]
    async fn nonzero_exit_is_a_build_error() {
        let err = run(&["false".to_string()], "test").await.unwrap_err();
        assert!(matches!(err, MaekError::Build(_)));
    }

    #[tokio::test]
    async fn missing_program_is_a_build_error() {
        let err = run(&["/no/such/binary-anywhere".to_string()], "test").await.unwrap_err();
        assert!(matches!(err, MaekError::Build(_)));
    }
}
