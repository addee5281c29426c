use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;
use paperchat_core::session::{
    ChatMessage, ChatSession, ExtractionState, MessageRole, SessionEvent,
};
use rustyline::error::ReadlineError;

use super::build_client;

/// Interactive chat loop for one document.
///
/// This is a pure presentation layer: it renders the session's transcript
/// and events, and forwards submit intent. All gating, ordering and
/// failure policy live in `ChatSession`.
pub async fn run(document_id: &str, name: Option<&str>, reset: bool) -> Result<()> {
    let client = Arc::new(build_client()?);
    if reset {
        client.clear_history(document_id).await?;
        println!("{}", "Transcript cleared.".dimmed());
    }

    let display_name = name.unwrap_or(document_id);
    let session = Arc::new(ChatSession::new(
        document_id,
        display_name,
        client.clone(),
        client.clone(),
        client.clone(),
    ));

    println!("{}", "Processing document...".dimmed());
    session.start().await;

    // Render whatever start produced: restored history, the welcome
    // message, or the extraction failure notice.
    for message in session.transcript().await {
        render(&message);
    }
    if session.extraction_state().await == ExtractionState::Failed {
        session.close();
        return Ok(());
    }

    // Events from here on are submit-driven; start's are already rendered.
    let mut events = session.subscribe();
    let printer = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                SessionEvent::MessageAppended { message }
                    if message.role == MessageRole::Assistant =>
                {
                    render(&message)
                }
                SessionEvent::RequestStarted => println!("{}", "Thinking...".dimmed()),
                SessionEvent::Closed => break,
                _ => {}
            }
        }
    });

    let mut editor = rustyline::DefaultEditor::new()?;
    loop {
        let (returned, line) = tokio::task::spawn_blocking(move || {
            let result = editor.readline("you> ");
            (editor, result)
        })
        .await?;
        editor = returned;

        match line {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                // Awaits the full round trip; the printer renders the reply.
                session.submit(&line).await;
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => {
                session.close();
                return Err(err.into());
            }
        }
    }

    session.close();
    let _ = printer.await;
    Ok(())
}

fn render(message: &ChatMessage) {
    match message.role {
        MessageRole::User => println!("{} {}", "you>".cyan().bold(), message.content),
        MessageRole::Assistant => {
            println!("{} {}", "assistant>".green().bold(), message.content)
        }
    }
}
