//! Canned Dungeon-Master prompts and the text-generation seam.
//!
//! The generation service itself is external; callers plug one in through
//! [`TextGenerator`].

use crate::error::ErrorKind;
use futures::future::BoxFuture;
use thiserror::Error;

const PREAMBLE: &str = "Act as a helpful assistant for a Dungeon Master.";

/// Errors from prompt building or text generation.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Please enter text for the {0} prompt")]
    EmptyInput(&'static str),

    #[error("Text generation is not configured")]
    NotConfigured,

    #[error("Text generation failed: {0}")]
    Service(String),
}

impl GenerationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GenerationError::EmptyInput(_) => ErrorKind::InvalidInput,
            GenerationError::NotConfigured | GenerationError::Service(_) => {
                ErrorKind::ResourceUnavailable
            }
        }
    }
}

/// A request for the assistant. Context fields may be blank, in which case a
/// generic default is used; free queries and note analysis need real text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    FreeQuery(String),
    RandomEncounter { context: String },
    DescribeNpc { keywords: String },
    PlotHook { keywords: String },
    DungeonRoom { context: String },
    SessionSummary { notes: String },
    ExtractInformation { notes: String },
}

impl Prompt {
    pub fn name(&self) -> &'static str {
        match self {
            Prompt::FreeQuery(_) => "query",
            Prompt::RandomEncounter { .. } => "random encounter",
            Prompt::DescribeNpc { .. } => "NPC description",
            Prompt::PlotHook { .. } => "plot hook",
            Prompt::DungeonRoom { .. } => "dungeon room",
            Prompt::SessionSummary { .. } => "session summary",
            Prompt::ExtractInformation { .. } => "information extraction",
        }
    }

    /// The full prompt text sent to the generator.
    pub fn render(&self) -> Result<String, GenerationError> {
        let text = match self {
            Prompt::FreeQuery(query) => format!(
                "{PREAMBLE} Respond to the following request:\n\n---\n\n{}",
                self.required(query)?
            ),
            Prompt::RandomEncounter { context } => format!(
                "{PREAMBLE} Generate a random D&D 5e encounter idea. Include a brief description \
                 of the scene, potential creatures, a challenge rating (CR) suggestion, and a minor \
                 plot hook or complication. Context: {}",
                or_default(context, "generic fantasy setting")
            ),
            Prompt::DescribeNpc { keywords } => format!(
                "{PREAMBLE} Create a brief description for a D&D NPC. Include their appearance, \
                 personality quirk, a secret or goal, and a potential hook for players. Keywords: {}",
                or_default(keywords, "generic fantasy NPC")
            ),
            Prompt::PlotHook { keywords } => format!(
                "{PREAMBLE} Generate a D&D plot hook idea. Describe the initial situation, the \
                 inciting incident, and what the players might need to do. Theme/Keywords: {}",
                or_default(keywords, "generic fantasy adventure")
            ),
            Prompt::DungeonRoom { context } => format!(
                "{PREAMBLE} Describe a D&D dungeon room. Include its appearance, notable features, \
                 potential traps or puzzles, and any monsters or treasures. Context: {}",
                or_default(context, "a generic dungeon")
            ),
            Prompt::SessionSummary { notes } => format!(
                "{PREAMBLE} Read the following D&D session notes/transcript and provide a concise \
                 summary of the key events, important player decisions, and major outcomes.\n\n---\n\n{}",
                self.required(notes)?
            ),
            Prompt::ExtractInformation { notes } => format!(
                "{PREAMBLE} Read the following D&D session notes/transcript and extract the \
                 following information. If a category has no information, write 'None'.\n\n\
                 - **Key NPCs Mentioned:**\n\
                 - **Locations Visited or Described:**\n\
                 - **Quests Started or Advanced:**\n\
                 - **Unique Items or Loot Found:**\n\n---\n\n{}",
                self.required(notes)?
            ),
        };
        Ok(text)
    }

    fn required<'a>(&self, text: &'a str) -> Result<&'a str, GenerationError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            Err(GenerationError::EmptyInput(self.name()))
        } else {
            Ok(trimmed)
        }
    }
}

fn or_default<'a>(text: &'a str, default: &'a str) -> &'a str {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        default
    } else {
        trimmed
    }
}

/// An external text-generation service.
pub trait TextGenerator: Send + Sync {
    fn generate<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, GenerationError>>;
}
