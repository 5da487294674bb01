use std::thread;

use anyhow::{anyhow, Result};
use console::style;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tokio::sync::{mpsc, oneshot};

use toolchat_core::chat::ChatContext;
use toolchat_core::types::CancellationToken;

const PROMPT: &str = "Query: ";

/// A line from the terminal, or the end of input
enum Line {
    Text(String),
    End,
}

type LineReply = oneshot::Sender<Result<Line>>;

/// Owns the line editor on its own thread so reads never block the runtime
///
/// A prompt is only shown when a line is requested.
struct LineReader {
    requests: mpsc::UnboundedSender<LineReply>,
}

impl LineReader {
    fn spawn() -> Result<Self> {
        let (requests, mut pending) = mpsc::unbounded_channel::<LineReply>();
        let (ready_tx, ready_rx) = std::sync::mpsc::channel();

        thread::Builder::new().name("toolchat-readline".into()).spawn(move || {
            let mut editor = match DefaultEditor::new() {
                Ok(editor) => {
                    let _ = ready_tx.send(Ok(()));
                    editor
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };

            while let Some(reply) = pending.blocking_recv() {
                let line = match editor.readline(PROMPT) {
                    Ok(text) => {
                        if !text.trim().is_empty() {
                            let _ = editor.add_history_entry(text.trim());
                        }
                        Ok(Line::Text(text))
                    }
                    Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(Line::End),
                    Err(e) => Err(e.into()),
                };
                if reply.send(line).is_err() {
                    break;
                }
            }
        })?;

        ready_rx
            .recv()
            .map_err(|_| anyhow!("line editor thread exited during startup"))??;
        Ok(Self { requests })
    }

    async fn read_line(&self) -> Result<Line> {
        let (reply, response) = oneshot::channel();
        self.requests
            .send(reply)
            .map_err(|_| anyhow!("line editor thread has stopped"))?;
        response
            .await
            .map_err(|_| anyhow!("line editor thread has stopped"))?
    }
}

/// Read queries until `quit`, `exit` or end of input
///
/// Failed turns are printed and the loop continues. Ctrl-C during a turn
/// cancels that turn only.
pub async fn run(context: &ChatContext) -> Result<()> {
    let mut chat = context.orchestrator();
    let reader = LineReader::spawn()?;

    println!(
        "{} {}",
        style("toolchat").bold(),
        style("- type \"quit\" or \"exit\" to end the session").dim()
    );

    loop {
        let line = match reader.read_line().await? {
            Line::Text(line) => line,
            Line::End => break,
        };

        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if query.eq_ignore_ascii_case("quit") || query.eq_ignore_ascii_case("exit") {
            break;
        }

        let cancel = CancellationToken::new();
        let interrupt = cancel.clone();
        let watcher = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                interrupt.cancel();
            }
        });

        match chat.process_query_with_cancel(query, cancel).await {
            Ok(answer) => println!("\n{}\n", answer),
            Err(e) => eprintln!("\n{} {}\n", style("Error:").red(), e),
        }
        watcher.abort();
    }

    Ok(())
}
