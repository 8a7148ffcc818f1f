//! Interactive prompt loop.
//!
//! Reads one line at a time, routes `/` commands to the chat registry and
//! everything else through the turn handler. Generic over the reader and
//! writer so tests can drive it with in-memory buffers.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::application::{SendTurnError, SendTurnHandler, TurnOutcome};
use crate::domain::conversation::ConversationRegistry;

pub const GREETING: &str =
    "Welcome! Ask me anything about the BOIN clinical trial design, I am at your service.";
pub const FAREWELL: &str = "This session has ended. Goodbye!";
pub const PROMPT: &str = "User: ";

const COMMAND_HINT: &str = "Commands: /new, /chats, /switch <name>. Type 'end' to quit.";

/// True for `end` in any case, ignoring surrounding whitespace.
pub fn is_end_command(input: &str) -> bool {
    input.trim().eq_ignore_ascii_case("end")
}

/// A registry command typed at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    New,
    Chats,
    Switch(String),
    Unknown(String),
}

impl Command {
    /// Parses `/`-prefixed input; anything else is a chat message.
    pub fn parse(input: &str) -> Option<Self> {
        let rest = input.trim().strip_prefix('/')?;
        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };

        Some(match name {
            "new" => Command::New,
            "chats" => Command::Chats,
            "switch" if !arg.is_empty() => Command::Switch(arg.to_string()),
            _ => Command::Unknown(rest.to_string()),
        })
    }
}

/// The prompt loop and the session's chats.
pub struct Repl {
    handler: SendTurnHandler,
    registry: ConversationRegistry,
    notices: Vec<String>,
}

impl Repl {
    pub fn new(handler: SendTurnHandler) -> Self {
        Self {
            handler,
            registry: ConversationRegistry::new(),
            notices: Vec::new(),
        }
    }

    /// Notices printed once after the greeting.
    pub fn with_startup_notices(mut self, notices: Vec<String>) -> Self {
        self.notices = notices;
        self
    }

    pub fn registry(&self) -> &ConversationRegistry {
        &self.registry
    }

    /// Runs until `end` or end of input.
    pub async fn run<R, W>(&mut self, reader: R, writer: &mut W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        write_line(writer, GREETING).await?;
        for notice in std::mem::take(&mut self.notices) {
            write_line(writer, &format!("Notice: {}", notice)).await?;
        }

        let mut lines = reader.lines();
        loop {
            write_str(writer, PROMPT).await?;
            writer.flush().await?;

            let Some(line) = lines.next_line().await? else {
                tracing::info!("Input closed");
                write_line(writer, &format!("\n{}", FAREWELL)).await?;
                break;
            };

            if is_end_command(&line) {
                write_line(writer, FAREWELL).await?;
                break;
            }
            if line.trim().is_empty() {
                continue;
            }

            match Command::parse(&line) {
                Some(command) => self.apply(command, writer).await?,
                None => self.turn(&line, writer).await?,
            }
        }

        writer.flush().await
    }

    async fn apply<W>(&mut self, command: Command, writer: &mut W) -> std::io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        match command {
            Command::New => {
                let name = self.registry.create().name().to_string();
                write_line(writer, &format!("Started {}", name)).await?;
            }
            Command::Chats => {
                let current = self.registry.current().name().to_string();
                for name in self.registry.names() {
                    let marker = if name == current { "*" } else { " " };
                    write_line(writer, &format!("{} {}", marker, name)).await?;
                }
            }
            Command::Switch(name) => match self.registry.select(&name) {
                Ok(conversation) => {
                    write_line(writer, &format!("Switched to {}", conversation.name())).await?
                }
                Err(err) => write_line(writer, &err.to_string()).await?,
            },
            Command::Unknown(text) => {
                let hint = format!("Unknown command '/{}'. {}", text, COMMAND_HINT);
                write_line(writer, &hint).await?;
            }
        }
        Ok(())
    }

    async fn turn<W>(&mut self, input: &str, writer: &mut W) -> std::io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let conversation = self.registry.current_mut();
        match self.handler.handle(conversation, input).await {
            Ok(outcome) => write_outcome(writer, &outcome).await,
            Err(SendTurnError::EmptyInput) => Ok(()),
            Err(err) => write_line(writer, &format!("\nError: {}. Please try again.", err)).await,
        }
    }
}

async fn write_outcome<W>(writer: &mut W, outcome: &TurnOutcome) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    write_line(writer, &format!("\nAssistant:\n{}", outcome.reply)).await?;
    if let Some(computed) = &outcome.computed {
        write_line(writer, &format!("\n{}", computed)).await?;
    }
    for notice in &outcome.notices {
        write_line(writer, &format!("\nNotice: {}", notice)).await?;
    }
    Ok(())
}

async fn write_str<W>(writer: &mut W, text: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(text.as_bytes()).await
}

async fn write_line<W>(writer: &mut W, line: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{MockAIProvider, MockError};
    use crate::adapters::statistics::MockStatisticsEngine;
    use crate::application::{GatewayConfig, StatisticsGateway, TurnSettings};
    use crate::domain::conversation::{instruction_for_profile, InstructionProfile};
    use std::sync::Arc;

    fn repl(provider: MockAIProvider) -> Repl {
        let gateway = StatisticsGateway::new(
            Arc::new(MockStatisticsEngine::new()),
            GatewayConfig::default(),
        );
        let settings = TurnSettings::new(instruction_for_profile(InstructionProfile::Concise));
        Repl::new(SendTurnHandler::new(
            Arc::new(provider),
            gateway,
            Vec::new(),
            settings,
        ))
    }

    async fn drive(repl: &mut Repl, input: &str) -> String {
        let mut out = Vec::new();
        repl.run(input.as_bytes(), &mut out).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    mod end_command {
        use super::*;

        #[test]
        fn matches_any_case_and_padding() {
            assert!(is_end_command("end"));
            assert!(is_end_command("END"));
            assert!(is_end_command(" End "));
        }

        #[test]
        fn other_input_continues() {
            assert!(!is_end_command("the end"));
            assert!(!is_end_command("ending"));
            assert!(!is_end_command(""));
        }
    }

    mod commands {
        use super::*;

        #[test]
        fn parses_known_commands() {
            assert_eq!(Command::parse("/new"), Some(Command::New));
            assert_eq!(Command::parse(" /chats "), Some(Command::Chats));
            assert_eq!(
                Command::parse("/switch Chat 2"),
                Some(Command::Switch("Chat 2".to_string()))
            );
        }

        #[test]
        fn switch_without_name_is_unknown() {
            assert_eq!(
                Command::parse("/switch"),
                Some(Command::Unknown("switch".to_string()))
            );
        }

        #[test]
        fn plain_text_is_not_a_command() {
            assert_eq!(Command::parse("target = 0.3"), None);
        }
    }

    mod session {
        use super::*;

        #[tokio::test]
        async fn greets_and_says_goodbye() {
            let out = drive(&mut repl(MockAIProvider::new()), "end\n").await;
            assert!(out.starts_with(GREETING));
            assert!(out.trim_end().ends_with(FAREWELL));
        }

        #[tokio::test]
        async fn end_of_input_ends_the_loop() {
            let out = drive(&mut repl(MockAIProvider::new()), "").await;
            assert!(out.trim_end().ends_with(FAREWELL));
        }

        #[tokio::test]
        async fn prints_reply_and_computed_block() {
            let provider =
                MockAIProvider::new().with_response("target = 0.3, ncohort = 10, cohortsize = 3");
            let out = drive(&mut repl(provider), "design it\nend\n").await;

            assert!(out.contains("Assistant:\ntarget = 0.3"));
            assert!(out.contains("Patients Treated"));
        }

        #[tokio::test]
        async fn provider_error_is_recoverable() {
            let provider = MockAIProvider::new()
                .with_error(MockError::Unavailable {
                    message: "overloaded".to_string(),
                })
                .with_response("Back again");
            let mut r = repl(provider);
            let out = drive(&mut r, "hello\nhello\nend\n").await;

            assert!(out.contains("Error: "));
            assert!(out.contains("Back again"));
            assert_eq!(r.registry().current().turns().len(), 2);
        }

        #[tokio::test]
        async fn commands_manage_chats() {
            let mut r = repl(MockAIProvider::new());
            let out = drive(&mut r, "/new\n/chats\n/switch Chat 1\n/switch Chat 9\n/bogus\nend\n").await;

            assert!(out.contains("Started Chat 2"));
            assert!(out.contains("* Chat 2"));
            assert!(out.contains("Switched to Chat 1"));
            assert!(out.contains("No chat named 'Chat 9'"));
            assert!(out.contains("Unknown command '/bogus'"));
            assert_eq!(r.registry().current().name(), "Chat 1");
        }

        #[tokio::test]
        async fn startup_notices_follow_greeting() {
            let mut r = repl(MockAIProvider::new())
                .with_startup_notices(vec!["guide.pdf not found".to_string()]);
            let out = drive(&mut r, "end\n").await;
            assert!(out.contains("Notice: guide.pdf not found"));
        }
    }
}
