//! Terminal chat adaptor: a line-oriented conversation loop
//!
//! Each loop step applies the keyword stimulus heuristic to the raw input,
//! runs the turn, lets the best-effort AI mood update run, and ticks the
//! mood decay. Generation failures degrade to a printed notice; they never
//! end the loop.

#![warn(missing_docs)]
#![warn(clippy::all)]

use sona_core::{ConversationSession, Result, SonaError, Stimulus};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Commands that end the conversation loop
const EXIT_COMMANDS: [&str; 2] = ["exit", "quit"];

/// Line-oriented terminal chat loop around one conversation session
pub struct TerminalAdaptor {
    session: ConversationSession,
}

impl TerminalAdaptor {
    /// Wrap a session
    pub fn new(session: ConversationSession) -> Self {
        Self { session }
    }

    /// The wrapped session
    pub fn session(&self) -> &ConversationSession {
        &self.session
    }

    /// Run the conversation loop until EOF or an exit command
    pub async fn run(&mut self) -> Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let mut lines = stdin.lines();
        let mut stdout = tokio::io::stdout();

        println!(
            "Chat with {} — type 'exit' or 'quit' to stop.",
            self.session.persona.name
        );

        loop {
            stdout.write_all(b"You: ").await?;
            stdout.flush().await?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            let input = line.trim();
            if EXIT_COMMANDS.contains(&input.to_lowercase().as_str()) {
                println!("Goodbye!");
                break;
            }

            match self.step(input).await {
                Ok(Some(reply)) => println!("{}: {}", self.session.persona.name, reply),
                Ok(None) => continue,
                Err(e) => println!(
                    "[{} can't answer right now: {}]",
                    self.session.persona.name, e
                ),
            }
        }

        Ok(())
    }

    /// One loop step: stimulus, turn, best-effort mood update, decay tick.
    /// Returns `Ok(None)` for blank input (no turn, no state change).
    pub async fn step(&mut self, input: &str) -> Result<Option<String>> {
        if let Some(stimulus) = Stimulus::from_text(input) {
            self.session.persona.mood.apply(stimulus);
            tracing::debug!(
                mood = %self.session.persona.mood.label(),
                "keyword stimulus applied"
            );
        }

        let reply = match self.session.take_turn(input).await {
            Ok(reply) => reply,
            Err(SonaError::EmptyInput) => return Ok(None),
            Err(e) => return Err(e),
        };

        self.session.update_mood_via_ai(input, &reply).await;
        self.session.tick();
        tracing::debug!(mood = %self.session.persona.mood.label(), "tick complete");

        Ok(Some(reply))
    }
}
