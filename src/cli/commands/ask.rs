//! Implementation of the `tamly ask` command.

use anyhow::Result;
use clap::Args;
use console::style;

use crate::cli::{build_orchestrator, load_config};
use crate::domain::models::{TurnMessageKind, TurnRequest};

#[derive(Args, Debug)]
pub struct AskArgs {
    /// The question to ask
    pub message: String,

    /// Continue an existing session instead of starting fresh
    #[arg(long, short)]
    pub session: Option<String>,
}

pub async fn execute(args: AskArgs, config_path: Option<&std::path::PathBuf>, json_mode: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let orchestrator = build_orchestrator(&config)?;

    let mut request = TurnRequest::new(args.message);
    if let Some(session) = args.session {
        request = request.with_session(session);
    }

    let response = orchestrator.chat(request).await?;

    if json_mode {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    for message in &response.messages {
        match message.kind {
            TurnMessageKind::Crisis => println!("{}", style(&message.text).red().bold()),
            TurnMessageKind::Warning => println!("{}\n", style(&message.text).yellow()),
            TurnMessageKind::Reply => println!("{}", message.text),
        }
    }

    if !response.sources.is_empty() {
        println!("\n{}", style(format!("Nguồn tham khảo ({}):", response.sources.len())).dim());
        for (i, source) in response.sources.iter().enumerate() {
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

    println!("\n{}", style(format!("session: {}", response.session_id)).dim());
    Ok(())
}
