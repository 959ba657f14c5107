//! Command-line interface
//!
//! Command definitions live here; `commands` holds the handlers and the
//! terminal rendering.

pub mod commands;

use clap::{ArgGroup, Args, Parser, Subcommand};

use crate::app::rate_limiter::LimiterConfig;
use crate::domain::entities::{PageRequest, DEFAULT_PER_PAGE};

#[derive(Parser, Debug)]
#[command(name = "ticket-triage")]
#[command(version)]
#[command(about = "Support ticket classification with rate-limited bulk dispatch")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a ticket
    Create(CreateArgs),

    /// List tickets, newest first
    List(ListArgs),

    /// Show ticket counts and average confidence
    Stats {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Change a ticket's status, category or note
    Update(UpdateArgs),

    /// Insert random demo tickets
    Seed {
        /// Number of tickets
        #[arg(long, default_value = "35")]
        count: usize,
    },

    /// Queue classification for every ticket that needs it
    BulkClassify(BulkClassifyArgs),

    /// Queue classification for one ticket
    Classify {
        /// Ticket ID
        ticket_id: String,
    },

    /// Set or release a ticket's manual category
    Categorize(CategorizeArgs),

    /// Run the queue worker
    Work(WorkArgs),

    /// Create the database tables if they do not exist
    Migrate,
}

#[derive(Args, Debug, Clone)]
pub struct CreateArgs {
    #[arg(long)]
    pub subject: String,

    #[arg(long)]
    pub body: String,

    /// open, in_progress, resolved or closed
    #[arg(long, default_value = "open")]
    pub status: String,

    /// Internal note for agents
    #[arg(long)]
    pub note: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Text to look for in subject and body
    #[arg(long)]
    pub search: Option<String>,

    #[arg(long)]
    pub status: Option<String>,

    /// Category key, e.g. billing
    #[arg(long)]
    pub category: Option<String>,

    #[arg(long, default_value = "1")]
    pub page: u64,

    /// Capped at 50
    #[arg(long, default_value_t = DEFAULT_PER_PAGE)]
    pub per_page: u64,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

impl ListArgs {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.per_page)
    }
}

#[derive(Args, Debug, Clone)]
#[command(group(
    ArgGroup::new("changes")
        .required(true)
        .multiple(true)
        .args(["status", "category", "note", "clear_note"])
))]
pub struct UpdateArgs {
    /// Ticket ID
    pub ticket_id: String,

    #[arg(long)]
    pub status: Option<String>,

    /// Category key; a different category becomes a manual override
    #[arg(long)]
    pub category: Option<String>,

    #[arg(long, conflicts_with = "clear_note")]
    pub note: Option<String>,

    /// Remove the note
    #[arg(long)]
    pub clear_note: bool,
}

impl UpdateArgs {
    /// `Some(None)` when the note should be cleared
    pub fn note_change(&self) -> Option<Option<String>> {
        if self.clear_note {
            Some(None)
        } else {
            self.note.clone().map(Some)
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct BulkClassifyArgs {
    /// Tickets per batch
    #[arg(long, default_value = "10", value_parser = lenient_number, allow_hyphen_values = true)]
    pub batch_size: u64,

    /// Maximum API calls per minute
    #[arg(long, default_value = "30", value_parser = lenient_number, allow_hyphen_values = true)]
    pub rate_limit: u64,

    /// Delay between batches in seconds
    #[arg(long, default_value = "1", value_parser = lenient_number, allow_hyphen_values = true)]
    pub delay: u64,

    /// Also reclassify tickets that already have a confident category
    #[arg(long)]
    pub force: bool,

    /// Show what would be processed without queueing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

impl BulkClassifyArgs {
    pub fn batch_size(&self) -> usize {
        usize::try_from(self.batch_size).unwrap_or(usize::MAX).max(1)
    }

    pub fn rate_limit(&self) -> u32 {
        u32::try_from(self.rate_limit).unwrap_or(u32::MAX).max(1)
    }

    /// `--rate-limit` calls per one-minute window
    pub fn limiter_config(&self) -> LimiterConfig {
        LimiterConfig::per_minute(self.rate_limit())
    }
}

#[derive(Args, Debug, Clone)]
pub struct CategorizeArgs {
    /// Ticket ID
    pub ticket_id: String,

    /// Category key, e.g. billing
    #[arg(required_unless_present = "release", conflicts_with = "release")]
    pub category: Option<String>,

    /// Let classification overwrite the category again
    #[arg(long)]
    pub release: bool,
}

#[derive(Args, Debug, Clone)]
pub struct WorkArgs {
    /// Drain the queue and exit
    #[arg(long)]
    pub once: bool,

    /// Seconds to sleep when the queue is empty
    #[arg(long, default_value = "3")]
    pub idle: u64,
}

/// Read the leading digits of `raw`; anything else counts as zero
fn lenient_number(raw: &str) -> Result<u64, String> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());

    Ok(digits[..end].parse().unwrap_or(0))
}
