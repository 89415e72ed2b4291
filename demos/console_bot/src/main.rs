//! Console Bot Example
//!
//! A weather bot that talks over the terminal. Every line typed is one
//! message of a single chat; replies are printed with the options a
//! messenger would render as buttons.
//!
//! # Input
//!
//! ```text
//! /weather Paris today     start a command with positional arguments
//! Weather                  menu entries and display names work as typed text
//! !loc 48.85 2.35          share a location
//! !cb day:2                press an inline button
//! ```
//!
//! # Usage
//!
//! ```bash
//! cargo run --package console-bot -- --config parley.toml
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use parley::prelude::*;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(about = "Chat with a Parley bot in the terminal")]
struct Args {
    /// Configuration file; the default locations are searched when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Configuration profile.
    #[arg(short, long, default_value = "development")]
    profile: String,

    /// Chat id used for every line read.
    #[arg(long, default_value_t = 1)]
    chat: i64,
}

// ============================================================================
// Reply channel
// ============================================================================

/// Prints replies to stdout.
struct ConsoleChannel;

impl ReplyChannel for ConsoleChannel {
    fn send_reply(&self, text: &str) -> ReplyResult<()> {
        println!("bot> {text}");
        Ok(())
    }

    fn ask_options(&self, text: &str, options: &[String], _force_answer: bool) -> ReplyResult<()> {
        let keyboard: Vec<String> = options.iter().map(|o| format!("[{o}]")).collect();
        println!("bot> {text}");
        println!("     {}", keyboard.join(" "));
        Ok(())
    }

    fn send_inline(&self, text: &str, buttons: &[InlineButton]) -> ReplyResult<()> {
        let buttons: Vec<String> = buttons
            .iter()
            .map(|b| format!("[{} → !cb {}]", b.label, b.data))
            .collect();
        println!("bot> {text}");
        println!("     {}", buttons.join(" "));
        Ok(())
    }

    fn identity_display_name(&self) -> String {
        "console".to_string()
    }
}

// ============================================================================
// Bot definition
// ============================================================================

struct Weekdays;

const WEEKDAYS: [&str; 5] = ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"];

impl InlineHandler for Weekdays {
    fn buttons(&self) -> Vec<InlineButton> {
        WEEKDAYS
            .iter()
            .enumerate()
            .map(|(i, day)| InlineButton::new(*day, format!("day:{i}")))
            .collect()
    }

    fn parse_callback(&self, data: &str) -> Result<String, ParseError> {
        data.strip_prefix("day:")
            .and_then(|i| i.parse::<usize>().ok())
            .and_then(|i| WEEKDAYS.get(i))
            .map(|day| day.to_string())
            .ok_or_else(|| ParseError::new(format!("unknown button: {data}")))
    }
}

/// Answers greetings; everything else gets a hint.
struct SmallTalk;

impl ChatProcessor for SmallTalk {
    fn process(
        &mut self,
        _message_id: Option<i64>,
        input: &ProcessorInput,
        reply: &dyn ReplyChannel,
    ) -> Option<String> {
        let ProcessorInput::Text(text) = input else {
            let _ = reply.send_reply("Nice, but I do not know what to do with that.");
            return None;
        };

        let lower = text.to_lowercase();
        if ["hi", "hello", "hey"].iter().any(|g| lower.starts_with(g)) {
            let _ = reply.send_reply(&format!("Hello, {}!", reply.identity_display_name()));
            Some("greeting".to_string())
        } else {
            let _ = reply.send_reply("Try /weather, /units, /where or /remind.");
            None
        }
    }
}

fn definition() -> BotDefinitionBuilder {
    let day = || {
        Parameter::new("day", "Which day?")
            .with_text_parser(parsers::one_of(["today", "tomorrow"]))
    };

    let weather = Command::new("/weather", |args, reply| {
        reply.send_reply(&format!(
            "{} in {}: sunny, {}",
            args.value("day").unwrap_or("today"),
            args.value("city").unwrap_or("?"),
            if args.value("units") == Some("F") { "75°F" } else { "24°C" },
        ))
    })
    .display_name("Weather")
    .parameter(Parameter::new("city", "Which city?").sticky(true))
    .parameter(day());

    let units = Command::new("/units", |args, reply| {
        reply.send_reply(&format!("Units set to {}", args.value("units").unwrap_or("C")))
    })
    .parameter(
        Parameter::new("units", "Celsius or Fahrenheit? (C/F)")
            .with_text_parser(parsers::one_of(["C", "F"])),
    );

    let place = Command::new("/where", |args, reply| {
        reply.send_reply(&format!("Noted, you are at {}", args.value("point").unwrap_or("?")))
    })
    .display_name("Here")
    .parameter(Parameter::location_only(
        "point",
        "Share your location (!loc <lat> <lon>)",
        |loc| Ok(format!("{:.4}, {:.4}", loc.latitude, loc.longitude)),
    ));

    let remind = Command::new("/remind", |args, reply| {
        reply.send_reply(&format!(
            "I will remind you on {}: {}",
            args.value("weekday").unwrap_or("?"),
            args.value("text").unwrap_or("?"),
        ))
    })
    .parameter(Parameter::new("weekday", "On which day?").with_inline_handler(Weekdays))
    .parameter(Parameter::new("text", "What should I remind you of?"));

    BotDefinition::builder()
        .command(weather)
        .command(units)
        .command(place)
        .command(remind)
        .menu(
            Menu::new("Main")
                .command("Weather", "/weather")
                .command("Reminder", "/remind")
                .submenu(
                    Menu::new("Settings")
                        .command("Units", "/units")
                        .command("Location", "/where"),
                ),
        )
        .processor(|_| Box::new(SmallTalk))
}

// ============================================================================
// Console input
// ============================================================================

/// Turns one console line into an event.
fn parse_line(chat_id: ChatId, line: &str) -> InboundEvent {
    if let Some(data) = line.strip_prefix("!cb ") {
        return InboundEvent::callback(chat_id, data.trim());
    }

    if let Some(coords) = line.strip_prefix("!loc ") {
        let mut parts = coords.split_whitespace().map(str::parse::<f64>);
        if let (Some(Ok(latitude)), Some(Ok(longitude))) = (parts.next(), parts.next()) {
            return InboundEvent::location(chat_id, "", Location::new(latitude, longitude));
        }
    }

    InboundEvent::text(chat_id, line)
}

async fn read_console(
    chat_id: ChatId,
    events: mpsc::Sender<InboundEvent>,
    shutdown: CancellationToken,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            () = shutdown.cancelled() => break,
            line = lines.next_line() => line?,
        };
        let Some(line) = line else {
            info!("End of input");
            break;
        };

        if events.send(parse_line(chat_id, &line)).await.is_err() {
            break;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut builder = ParleyRuntime::builder()
        .profile(&args.profile)
        .set("dispatch.mode", "sequential");
    if let Some(path) = &args.config {
        builder = builder.config_file(path);
    }

    let runtime = builder.build(definition(), |_: ChatId| -> BoxedReplyChannel {
        Arc::new(ConsoleChannel)
    })?;

    let (events, receiver) = runtime.channel();
    let shutdown = CancellationToken::new();

    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for Ctrl+C");
                return;
            }
            info!("Received Ctrl+C, shutting down");
            shutdown.cancel();
        }
    });

    let reader = tokio::spawn(read_console(ChatId(args.chat), events, shutdown.clone()));

    println!("Type a message, or \"Main\" for the menu. Ctrl+D quits.");
    runtime.run(receiver, shutdown).await?;
    reader.await??;

    info!(stats = %runtime.stats(), "Bye");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line() {
        let chat = ChatId(1);
        assert_eq!(parse_line(chat, "!cb day:2").callback_data(), Some("day:2"));
        assert_eq!(
            parse_line(chat, "!loc 1.5 -2").location_content(),
            Some(Location::new(1.5, -2.0))
        );
        assert_eq!(parse_line(chat, "!loc nowhere").text_content(), Some("!loc nowhere"));
        assert_eq!(parse_line(chat, "/weather").text_content(), Some("/weather"));
    }

    #[test]
    fn test_definition_is_valid() {
        let definition = definition().build().unwrap();
        assert_eq!(definition.commands().len(), 4);
    }

    #[test]
    fn test_weekday_buttons_round_trip() {
        let buttons = Weekdays.buttons();
        assert_eq!(Weekdays.parse_callback(&buttons[2].data).unwrap(), "Wednesday");
        assert!(Weekdays.parse_callback("day:9").is_err());
    }
}
