use conductor_core::registry::ToolRegistry;
use conductor_core::session::{Session, SessionManager, SessionReply};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum StdioError {
    #[error("stdin/stdout I/O error: {0}")]
    Io(#[from] std::io::Error),
}

enum LoopControl {
    Continue,
    Exit,
}

pub async fn run(sessions: Arc<SessionManager>) -> Result<(), StdioError> {
    let mut stdout = io::stdout();
    let stdin = BufReader::new(io::stdin());
    let mut lines = stdin.lines();
    let mut session = sessions.open().await;

    print_banner(&mut stdout, session.registry()).await?;
    print_help(&mut stdout).await?;

    loop {
        prompt(&mut stdout).await?;
        let line = match lines.next_line().await? {
            Some(line) => line,
            None => {
                write_line(&mut stdout, "\nInput closed. Leaving chat.").await?;
                break;
            }
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        if input.starts_with('/') {
            match handle_command(input, &mut session, &sessions, &mut stdout).await? {
                LoopControl::Continue => continue,
                LoopControl::Exit => break,
            }
        }

        let reply = session.handle(input).await;
        if let Some(text) = reply.render() {
            write_line(&mut stdout, &text).await?;
        }
        if let SessionReply::Farewell(_) = reply {
            break;
        }
    }

    info!(session_id = %session.id(), "Terminal session closed");
    stdout.flush().await?;
    Ok(())
}

async fn handle_command(
    input: &str,
    session: &mut Session,
    sessions: &SessionManager,
    stdout: &mut io::Stdout,
) -> Result<LoopControl, StdioError> {
    let name = input
        .trim_start_matches('/')
        .split_whitespace()
        .next()
        .unwrap_or("")
        .to_ascii_lowercase();

    debug!(command = %name, "Processing chat command");

    match name.as_str() {
        "help" | "?" => print_help(stdout).await?,
        "exit" | "quit" => {
            write_line(stdout, "Leaving chat.").await?;
            return Ok(LoopControl::Exit);
        }
        "tools" => print_tools(stdout, session.registry()).await?,
        "reset" => {
            *session = sessions.open().await;
            write_line(stdout, "Memory cleared. Started a new session.").await?;
        }
        "refresh" => {
            let registry = sessions.registry().refresh().await;
            write_line(
                stdout,
                &format!("Rediscovered {} tool(s).", registry.len()),
            )
            .await?;
            *session = sessions.open().await;
            write_line(stdout, "Started a new session with the refreshed tools.").await?;
        }
        other => {
            write_line(stdout, &format!("Unknown command: /{other}. Try /help.")).await?;
        }
    }
    Ok(LoopControl::Continue)
}

async fn print_banner(stdout: &mut io::Stdout, registry: &ToolRegistry) -> io::Result<()> {
    write_line(stdout, "mcp-conductor terminal chat.").await?;
    write_line(
        stdout,
        &format!(
            "{} tool(s) from {} server(s) available.",
            registry.len(),
            registry.servers().len()
        ),
    )
    .await?;
    for failure in registry.failures() {
        write_line(stdout, &format!("  unavailable: {failure}")).await?;
    }
    Ok(())
}

async fn print_help(stdout: &mut io::Stdout) -> io::Result<()> {
    write_line(stdout, "\nCommands:").await?;
    write_line(stdout, "  /help      Show this help").await?;
    write_line(stdout, "  /tools     List the tools this session can use").await?;
    write_line(stdout, "  /reset     Forget the conversation and start over").await?;
    write_line(stdout, "  /refresh   Rediscover tools and start a new session").await?;
    write_line(stdout, "  /exit      Leave the chat").await?;
    write_line(stdout, "Anything else is sent to the agent.\n").await?;
    Ok(())
}

async fn print_tools(stdout: &mut io::Stdout, registry: &ToolRegistry) -> io::Result<()> {
    if registry.is_empty() {
        write_line(stdout, "No tools available.").await?;
        return Ok(());
    }
    for entry in registry.entries() {
        write_line(
            stdout,
            &format!(
                "  {} ({}) {}",
                entry.name(),
                entry.binding.name,
                entry.descriptor.description
            ),
        )
        .await?;
    }
    for shadowed in registry.shadowed() {
        write_line(
            stdout,
            &format!(
                "  hidden: {} from {} (kept {})",
                shadowed.tool, shadowed.shadowed_server, shadowed.kept_server
            ),
        )
        .await?;
    }
    Ok(())
}

async fn prompt(stdout: &mut io::Stdout) -> io::Result<()> {
    stdout.write_all(b"you> ").await?;
    stdout.flush().await
}

async fn write_line(stdout: &mut io::Stdout, line: &str) -> io::Result<()> {
    stdout.write_all(line.as_bytes()).await?;
    stdout.write_all(b"\n").await?;
    Ok(())
}
