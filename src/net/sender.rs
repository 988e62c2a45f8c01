use crate::config::Config;
use crate::net::RECV_CHUNK;
use crate::RcatError;
use std::future::Future;
use std::io::Write as _;
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};
use tokio::net::TcpStream;
use tokio::signal;

/// Notice shown on the one graceful-shutdown path in the tool.
pub const TERMINATION_NOTICE: &str = "User terminated.";

/// How an interactive session ended.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Peer closed the connection or input ran dry.
    Finished,
    /// The user interrupted the session.
    Interrupted,
}

/// Outbound role: connect, send the initial payload once, then trade
/// messages with the peer until it hangs up or the user interrupts.
///
/// Ctrl-C prints the termination notice and returns Ok so the
/// process exits 0.
pub async fn run(config: &Config, payload: &[u8]) -> crate::Result<()> {
    let input = BufReader::new(tokio::io::stdin());
    let outcome = run_until(config, payload, input, signal::ctrl_c()).await?;
    if outcome == Outcome::Interrupted {
        println!("{TERMINATION_NOTICE}");
    }
    Ok(())
}

/// Drive one session, racing the relay loop against a shutdown
/// signal. The signal winning is a clean interrupt, not an error.
pub async fn run_until<I, F>(
    config: &Config,
    payload: &[u8],
    input: I,
    shutdown: F,
) -> crate::Result<Outcome>
where
    I: AsyncBufRead + Unpin,
    F: Future<Output = std::io::Result<()>>,
{
    let mut stream = connect(config).await?;

    if !payload.is_empty() {
        stream.write_all(payload).await?;
    }

    tokio::select! {
        result = relay(&mut stream, input) => result.map(|_| Outcome::Finished),
        _ = shutdown => Ok(Outcome::Interrupted),
    }
}

pub async fn connect(config: &Config) -> crate::Result<TcpStream> {
    let addr = format!("{}:{}", config.target, config.port);
    let stream = TcpStream::connect(&addr)
        .await
        .map_err(|e| RcatError::Connect(addr.clone(), e))?;
    tracing::info!("connected to {}", addr);
    Ok(stream)
}

/// One receive round: accumulate fixed-size chunks until a short read
/// marks the end of the message, or EOF marks the peer gone.
async fn recv_round<S>(stream: &mut S) -> crate::Result<(Vec<u8>, bool)>
where
    S: AsyncRead + Unpin,
{
    let mut response = Vec::new();
    loop {
        let mut chunk = [0u8; RECV_CHUNK];
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok((response, true));
        }
        response.extend_from_slice(&chunk[..n]);
        if n < RECV_CHUNK {
            return Ok((response, false));
        }
    }
}

/// The interactive loop: show whatever the peer sent, then forward
/// one line of input with a trailing newline. Input EOF ends the
/// session quietly.
async fn relay<S, I>(stream: &mut S, mut input: I) -> crate::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
    I: AsyncBufRead + Unpin,
{
    loop {
        let (response, closed) = recv_round(stream).await?;
        if !response.is_empty() {
            print!("{}", String::from_utf8_lossy(&response));
            std::io::stdout().flush()?;
        }
        if closed {
            tracing::info!("peer closed the connection");
            return Ok(());
        }

        print!("> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if input.read_line(&mut line).await? == 0 {
            return Ok(());
        }
        if !line.ends_with('\n') {
            line.push('\n');
        }
        stream.write_all(line.as_bytes()).await?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::Listener;
    use tokio::io::duplex;

    #[tokio::test]
    async fn recv_round_stops_on_short_read() {
        let (mut client, mut server) = duplex(2 * RECV_CHUNK);
        server.write_all(b"hello").await.unwrap();

        let (data, closed) = recv_round(&mut client).await.unwrap();
        assert_eq!(data, b"hello");
        assert!(!closed);
    }

    #[tokio::test]
    async fn recv_round_reports_peer_close() {
        let (mut client, server) = duplex(64);
        drop(server);

        let (data, closed) = recv_round(&mut client).await.unwrap();
        assert!(data.is_empty());
        assert!(closed);
    }

    #[tokio::test]
    async fn relay_ends_cleanly_when_input_dries_up() {
        let (mut client, mut server) = duplex(2 * RECV_CHUNK);
        server.write_all(b"hello").await.unwrap();

        // one response arrives, then the scripted input is empty
        let input = BufReader::new(&b""[..]);
        relay(&mut client, input).await.unwrap();
    }

    #[tokio::test]
    async fn relay_forwards_one_line_per_round() {
        let (mut client, mut server) = duplex(2 * RECV_CHUNK);
        server.write_all(b"ready").await.unwrap();

        let input = BufReader::new(&b"whoami\n"[..]);
        let client_task = tokio::spawn(async move { relay(&mut client, input).await });

        let mut buf = [0u8; 64];
        let n = server.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"whoami\n");

        drop(server);
        client_task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn relay_against_an_execute_listener_exits_cleanly() {
        let listener = Listener::bind(Config {
            target: "127.0.0.1".into(),
            port: 0,
            execute: Some("echo hello".into()),
            ..Config::default()
        })
        .await
        .unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(listener.serve());

        let client = Config {
            target: "127.0.0.1".into(),
            port: addr.port(),
            ..Config::default()
        };
        let mut stream = connect(&client).await.unwrap();

        // the short response prints, then input EOF ends the loop
        let input = BufReader::new(&b""[..]);
        relay(&mut stream, input).await.unwrap();
    }
}
