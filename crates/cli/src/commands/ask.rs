//! `mcpagent ask`: one question, or an interactive session with history.

use std::io::Write;

use mcpagent_agent::{Agent, StreamEvent};
use mcpagent_core::message::HistoryEntry;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(question: Option<String>, stream: bool, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (config, agent) = super::connect().await?;

    if let Some(question) = question {
        return answer_once(&agent, &question, &[], stream, json).await;
    }

    println!();
    println!("  mcpagent, interactive mode");
    println!();
    println!("  Server:  {}", config.mcp.url);
    println!("  Model:   {}", config.model.model_id);
    println!("  Tools:   {}", agent.tools().len());
    println!();
    println!("  Type your question and press Enter. Type 'exit' or Ctrl+C to quit.");
    println!();

    let mut history: Vec<HistoryEntry> = Vec::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else { break };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "exit" || line == "quit" {
            break;
        }

        // With exclude_last the builder drops the newest entry, which is this question.
        history.push(HistoryEntry::user(line));
        let context = if config.agent.exclude_last {
            &history[..]
        } else {
            &history[..history.len() - 1]
        };
        let result = run_turn(&agent, line, context, stream).await;
        match result {
            Ok(answer) => history.push(HistoryEntry::assistant(answer)),
            Err(e) => eprintln!("  [Error] {e}"),
        }
        println!();
    }

    println!();
    Ok(())
}

async fn answer_once(
    agent: &Agent,
    question: &str,
    history: &[HistoryEntry],
    stream: bool,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        let result = agent.answer(question, history).await?;
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }
    run_turn(agent, question, history, stream).await?;
    Ok(())
}

/// Answer and print; returns the answer text.
async fn run_turn(
    agent: &Agent,
    question: &str,
    history: &[HistoryEntry],
    stream: bool,
) -> Result<String, Box<dyn std::error::Error>> {
    if !stream {
        eprint!("  Thinking...");
        let result = agent.answer(question, history).await;
        eprint!("\r              \r");
        let result = result?;
        println!("{}", result.answer);
        return Ok(result.answer);
    }

    let mut events = agent.answer_streaming(question, history);
    let mut answer = String::new();
    while let Some(event) = events.next().await {
        match event? {
            StreamEvent::Start { .. } => {}
            StreamEvent::ToolCall { tool, args } => eprintln!("  -> {tool} {args}"),
            StreamEvent::ToolResult { tool, payload, .. } => eprintln!("  <- {tool}: {}", preview(&payload)),
            StreamEvent::ToolError { tool, payload, .. } => eprintln!("  x  {tool}: {}", preview(&payload)),
            StreamEvent::FinalAnswer { answer: text, .. } => {
                println!("{text}");
                answer = text;
            }
        }
    }
    Ok(answer)
}

fn preview(payload: &serde_json::Value) -> String {
    let text = match payload {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    match text.char_indices().nth(120) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text,
    }
}
