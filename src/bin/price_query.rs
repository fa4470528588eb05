use std::io::Write;

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use colored::*;

use azure_price_agent::stream::{EventSink, StreamEvent, StreamState};
use azure_price_agent::{Config, PriceAgentService, table};

/// Prints coordinator events to the terminal as they arrive.
struct StdoutSink;

#[async_trait]
impl EventSink for StdoutSink {
    async fn emit(&mut self, event: StreamEvent) -> azure_price_agent::Result<()> {
        let mut out = std::io::stdout().lock();
        let written = match event {
            StreamEvent::PriceData(data) => writeln!(
                out,
                "{} {}\n\n{}\n{}",
                "Filter:".bright_cyan(),
                data.filter,
                table::render(&data.items),
                format!("{} records", data.total_count).dimmed()
            ),
            StreamEvent::AiResponseChunk(chunk) => {
                write!(out, "{}", chunk.content).and_then(|_| out.flush())
            }
            StreamEvent::AiResponseComplete(_) => writeln!(out),
            StreamEvent::Error(err) => {
                eprintln!("{} {}", "error:".bright_red(), err.message);
                Ok(())
            }
        };
        written.map_err(|e| azure_price_agent::PriceAgentError::Internal(e.to_string()))
    }

    async fn close(&mut self) {}
}

fn usage() -> String {
    "usage: price-query [--stream] <prompt>".to_string()
}

#[tokio::main]
async fn main() -> Result<()> {
    azure_price_agent::init_tracing();

    let mut stream = false;
    let mut words = Vec::new();
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--stream" => stream = true,
            "-h" | "--help" => {
                println!("{}", usage());
                return Ok(());
            }
            _ => words.push(arg),
        }
    }
    let prompt = words.join(" ");
    if prompt.trim().is_empty() {
        bail!(usage());
    }

    let config = Config::load();
    config.validate().context("incomplete configuration")?;
    let service = PriceAgentService::new(&config)?;

    if stream {
        let state = service.query_stream(&prompt, &mut StdoutSink).await;
        if state != StreamState::Complete {
            return Err(anyhow!("streaming query ended in state {state:?}"));
        }
        return Ok(());
    }

    let result = service.query(&prompt).await?;
    println!("{} {}\n", "Filter:".bright_cyan(), result.filter);
    println!("{}", table::render(&result.items));
    println!("{}\n", format!("{} records", result.total_count).dimmed());
    if let Some(answer) = result.ai_response {
        println!("{}", answer);
    }
    Ok(())
}
