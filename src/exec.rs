use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("unbalanced quoting in command line")]
    Tokenize,

    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}\n{output}")]
    Failed {
        command: String,
        status: std::process::ExitStatus,
        output: String,
    },

    #[error("command output was not valid UTF-8")]
    Decode(#[from] std::string::FromUtf8Error),

    #[error("`{command}` still running after {limit:?}")]
    Timeout { command: String, limit: Duration },
}

/// Run one command line on the local host and capture its output.
///
/// The line is split with shell-word rules (quoting honored, no
/// pipes/redirects/expansion) and the first word is spawned directly
/// with the rest as arguments. Captured stdout and stderr come back
/// as a single UTF-8 blob; a nonzero exit is an error that still
/// carries whatever was captured. An empty or whitespace-only line is
/// a no-op, not an error. Without a timeout the call waits forever.
pub async fn execute(command_line: &str, timeout: Option<Duration>) -> Result<String, ExecError> {
    let line = command_line.trim();
    if line.is_empty() {
        return Ok(String::new());
    }

    let words = shlex::split(line).ok_or(ExecError::Tokenize)?;
    let Some((program, args)) = words.split_first() else {
        return Ok(String::new());
    };

    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = match timeout {
        Some(limit) => tokio::time::timeout(limit, command.output())
            .await
            .map_err(|_| ExecError::Timeout {
                command: line.to_string(),
                limit,
            })?,
        None => command.output().await,
    }
    .map_err(|source| ExecError::Spawn {
        command: line.to_string(),
        source,
    })?;

    let mut text = String::from_utf8(output.stdout)?;
    text.push_str(&String::from_utf8(output.stderr)?);

    if !output.status.success() {
        return Err(ExecError::Failed {
            command: line.to_string(),
            status: output.status,
            output: text,
        });
    }

    Ok(text)
}
