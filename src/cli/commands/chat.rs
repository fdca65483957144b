//! Implementation of the `tamly chat` command: a streaming REPL.

use anyhow::Result;
use clap::Args;
use console::style;
use futures::StreamExt;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::cli::{build_orchestrator, load_config};
use crate::domain::models::{TurnEvent, TurnRequest};
use crate::services::ChatOrchestrator;

#[derive(Args, Debug)]
pub struct ChatArgs {
    /// Resume an existing session
    #[arg(long, short)]
    pub session: Option<String>,
}

pub async fn execute(args: ChatArgs, config_path: Option<&std::path::PathBuf>) -> Result<()> {
    let config = load_config(config_path)?;
    let orchestrator = build_orchestrator(&config)?;

    println!("{}", style("Tamly — trợ lý sức khỏe tâm thần. Gõ /quit để thoát, /new để bắt đầu phiên mới.").dim());

    let mut session_id = args.session;
    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        print!("{} ", style(">").cyan().bold());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line {
            "/quit" | "/exit" => break,
            "/new" => {
                session_id = Some(orchestrator.new_session().await);
                println!("{}", style("Đã bắt đầu phiên mới.").dim());
                continue;
            }
            "/sessions" => {
                for id in orchestrator.active_sessions().await {
                    println!("  {id}");
                }
                continue;
            }
            _ => {}
        }

        let mut request = TurnRequest::new(line);
        if let Some(id) = &session_id {
            request = request.with_session(id.clone());
        }

        match run_turn(&orchestrator, request).await {
            Ok(new_session) => session_id = Some(new_session),
            Err(err) => eprintln!("{}", style(format!("Lỗi: {err:#}")).red()),
        }
    }

    Ok(())
}

/// Stream one turn to the terminal; returns the session id from `Done`.
async fn run_turn(orchestrator: &ChatOrchestrator, request: TurnRequest) -> Result<String> {
    let mut stream = orchestrator.chat_stream(request).await?;
    let mut session_id = String::new();
    let mut streamed_tokens = false;

    while let Some(event) = stream.next().await {
        match event {
            TurnEvent::Safety { .. } => {}
            TurnEvent::Crisis { text } => {
                println!("{}", style(text).red().bold());
            }
            TurnEvent::Warning { text } => {
                println!("{}\n", style(text).yellow());
            }
            TurnEvent::Token { text } => {
                streamed_tokens = true;
                print!("{text}");
                std::io::stdout().flush()?;
            }
            TurnEvent::Sources { sources } => {
                if streamed_tokens {
                    println!();
                }
                if !sources.is_empty() {
                    println!("{}", style(format!("Nguồn tham khảo ({}):", sources.len())).dim());
                    for (i, source) in sources.iter().enumerate() {
                        println!(
                            "{}",
                            style(format!(
                                "  [{}] {} (độ liên quan {:.3})",
                                i + 1,
                                source.source_file,
                                source.score
                            ))
                            .dim()
                        );
                    }
                }
            }
            TurnEvent::Error { message } => {
                if streamed_tokens {
                    println!();
                }
                eprintln!("{}", style(format!("Lỗi tạo phản hồi: {message}")).red());
            }
            TurnEvent::Done { session_id: id } => {
                session_id = id;
            }
        }
    }

    Ok(session_id)
}
