use std::borrow::Cow::{self, Borrowed, Owned};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};

use embedchat_application::{PreviewHost, embed_snippet};
use embedchat_core::widget::{ChatWidget, SessionMode, SharedWidget, SubmitOutcome};
use embedchat_core::{BotReply, WidgetConfig};
use embedchat_infrastructure::Settings;
use embedchat_interaction::HttpTransport;

const COMMANDS: [&str; 4] = ["/open", "/close", "/snippet", "/quit"];

/// Completion and hints for slash commands.
#[derive(Clone)]
struct CliHelper;

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];
        if !line.starts_with('/') {
            return Ok((0, vec![]));
        }
        let candidates = COMMANDS
            .iter()
            .filter(|cmd| cmd.starts_with(line))
            .map(|cmd| Pair {
                display: cmd.to_string(),
                replacement: cmd.to_string(),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];
        if line.starts_with('/') && !line.contains(' ') {
            COMMANDS
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for CliHelper {}

/// Terminal front end over the same widget state machine the hosts use.
pub async fn run(settings: Settings, preview: bool, context: Option<PathBuf>) -> Result<()> {
    let config = settings.widget_config()?;
    let script_src = settings.script_src(&config);
    let transport = Arc::new(HttpTransport::from_config(&config)?);

    let widget = if preview {
        let host = match context {
            Some(path) => PreviewHost::with_temp_context(
                config.clone(),
                script_src.clone(),
                transport,
                read_context(&path)?,
            ),
            None => PreviewHost::new(config.clone(), script_src.clone(), transport),
        };
        host.widget().clone()
    } else {
        let identity = super::identity_store(&settings, Some(config.origin()))?;
        let session = SessionMode::Persistent(Arc::new(identity));
        SharedWidget::new(ChatWidget::new(config.clone(), session), transport)
    };

    let mut rl: Editor<CliHelper, DefaultHistory> = Editor::new()?;
    rl.set_helper(Some(CliHelper));

    let banner = if preview { "=== embedchat (preview) ===" } else { "=== embedchat ===" };
    println!("{}", banner.bright_magenta().bold());
    println!(
        "{}",
        "Type a message, '/close' to hide the widget, '/open' to show it, or '/quit' to exit."
            .bright_black()
    );
    println!();

    widget.open().await;
    print_greeting(&widget).await;

    loop {
        match rl.readline(">> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(&line);

                match trimmed {
                    "/quit" | "quit" | "exit" => {
                        println!("{}", "Goodbye!".bright_green());
                        break;
                    }
                    "/open" => {
                        let phase = widget.open().await;
                        println!("{}", format!("widget {phase:?}").bright_black());
                    }
                    "/close" => {
                        let phase = widget.close().await;
                        println!("{}", format!("widget {phase:?}").bright_black());
                    }
                    "/snippet" => println!("{}", snippet_for(&config, &script_src)?),
                    input => submit(&widget, &config, input).await,
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type '/quit' to exit.".yellow());
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {err:?}").red());
                break;
            }
        }
    }

    Ok(())
}

async fn submit(widget: &SharedWidget, config: &WidgetConfig, input: &str) {
    match widget.submit(input).await {
        SubmitOutcome::Replied(reply) => print_reply(&reply),
        SubmitOutcome::Failed(err) => {
            tracing::debug!(error = %err, "exchange failed");
            println!("{}", config.error_message().red());
        }
        SubmitOutcome::Ignored => {
            if !widget.phase().await.is_open() {
                println!("{}", "The widget is closed. Type '/open' to reopen it.".yellow());
            }
        }
    }
}

async fn print_greeting(widget: &SharedWidget) {
    let greeting = widget
        .inspect(|w| w.log().greeting().content().to_string())
        .await;
    println!("{}", greeting.bright_blue());
}

fn print_reply(reply: &BotReply) {
    for line in reply.content.lines() {
        println!("{}", line.bright_blue());
    }
    if reply.handoff {
        println!("{}", "(handed off to a human operator)".bright_black());
    }
    if reply.lead {
        println!("{}", "(flagged as a sales lead)".bright_black());
    }
}

fn snippet_for(config: &WidgetConfig, script_src: &str) -> Result<String> {
    Ok(embed_snippet(config.client_id().as_str(), script_src)?)
}

fn read_context(path: &Path) -> Result<serde_json::Value> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("{} is not valid JSON", path.display()))
}
