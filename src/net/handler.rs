use crate::config::{Config, Mode};
use crate::exec;
use crate::net::RECV_CHUNK;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Shell mode reads in small bursts while gathering one command line.
const SHELL_CHUNK: usize = 64;
const SHELL_PROMPT: &[u8] = b"BHP: #> ";

/// Serve one accepted connection to completion.
///
/// Exactly one of the configured behaviors runs (execute wins over
/// upload, upload over shell; none set means close immediately). The
/// stream is owned here and dropped on every exit path.
pub async fn handle(mut stream: TcpStream, config: Arc<Config>) -> crate::Result<()> {
    match config.mode() {
        Mode::Execute(command) => execute_once(&mut stream, command, config.exec_timeout()).await,
        Mode::Upload(path) => receive_file(&mut stream, path).await,
        Mode::Shell => shell_session(&mut stream, config.exec_timeout()).await,
        Mode::Relay => Ok(()),
    }
}

/// Execute mode: one command, one response, done.
async fn execute_once(
    stream: &mut TcpStream,
    command: &str,
    timeout: Option<Duration>,
) -> crate::Result<()> {
    match exec::execute(command, timeout).await {
        Ok(output) => stream.write_all(output.as_bytes()).await?,
        // The failure (with any captured output) goes back to the
        // peer as the response; the listener keeps running.
        Err(e) => stream.write_all(e.to_string().as_bytes()).await?,
    }
    Ok(())
}

/// Upload mode: drain the stream until the peer closes its half,
/// then write the file in one shot and confirm.
async fn receive_file(stream: &mut TcpStream, path: &Path) -> crate::Result<()> {
    let mut file_buffer = Vec::new();
    let mut chunk = [0u8; RECV_CHUNK];
    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        file_buffer.extend_from_slice(&chunk[..n]);
    }

    match tokio::fs::write(path, &file_buffer).await {
        Ok(()) => {
            let message = format!("Saved file {}", path.display());
            stream.write_all(message.as_bytes()).await?;
            Ok(())
        }
        Err(e) => {
            // Tell the peer before handing the error back; the
            // connection closes either way.
            let message = format!("Failed to save {}: {}", path.display(), e);
            let _ = stream.write_all(message.as_bytes()).await;
            Err(e.into())
        }
    }
}

/// Shell mode: prompt, gather one line, execute, answer, repeat.
///
/// Any failure (read, UTF-8 decode, command) ends this session only.
/// Peer EOF ends it cleanly.
async fn shell_session(stream: &mut TcpStream, timeout: Option<Duration>) -> crate::Result<()> {
    let mut cmd_buffer: Vec<u8> = Vec::new();
    loop {
        stream.write_all(SHELL_PROMPT).await?;

        while !cmd_buffer.contains(&b'\n') {
            let mut chunk = [0u8; SHELL_CHUNK];
            let n = stream.read(&mut chunk).await?;
            if n == 0 {
                return Ok(());
            }
            cmd_buffer.extend_from_slice(&chunk[..n]);
        }

        let line_end = cmd_buffer
            .iter()
            .position(|&b| b == b'\n')
            .unwrap_or(cmd_buffer.len());
        let line = std::str::from_utf8(&cmd_buffer[..line_end])?.to_owned();

        let response = exec::execute(&line, timeout).await?;
        if !response.is_empty() {
            stream.write_all(response.as_bytes()).await?;
        }
        cmd_buffer.clear();
    }
}
