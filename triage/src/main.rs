//! Ticket Triage
//!
//! Classifies support tickets with a chat-completion model and dispatches
//! bulk classification runs under a shared rate limit.
//! Uses hexagonal (ports & adapters) architecture for clean separation of concerns.

use std::io;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use indicatif::ProgressDrawTarget;
use sea_orm::Database;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod adapters;
mod app;
mod cli;
mod config;
mod domain;
mod entity;
mod error;

#[cfg(test)]
mod test_utils;

use adapters::{
    InMemoryLimiterStore, OpenAiClient, PostgresJobQueue, PostgresTicketRepository,
};
use app::{
    BulkClassifyService, ClassifierMode, ClassifyTicketJob, QueueWorker, RateLimiter,
    ThrottledClient, TicketClassifier, TicketService,
};
use cli::{commands, Cli, Command};
use config::Config;

type LiveClient = ThrottledClient<OpenAiClient, InMemoryLimiterStore>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "info,ticket_triage=debug"
    } else {
        "warn,ticket_triage=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let config = Config::from_env()?;

    let db = Database::connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::debug!("Database connected");

    let ticket_repo = Arc::new(PostgresTicketRepository::new(db.clone()));
    let job_queue = Arc::new(PostgresJobQueue::new(db.clone()));
    let limiter_store = Arc::new(InMemoryLimiterStore::new());
    let mut stdout = io::stdout().lock();

    match cli.command {
        Command::BulkClassify(args) => {
            let limiter = RateLimiter::new(limiter_store, args.limiter_config());
            let service = BulkClassifyService::new(ticket_repo, job_queue, limiter);
            commands::bulk_classify(
                &service,
                &args,
                &mut stdout,
                &mut io::stdin().lock(),
                ProgressDrawTarget::stderr(),
            )
            .await?;
        }
        Command::Create(args) => {
            let service = TicketService::new(ticket_repo, job_queue);
            commands::create(&service, &args, &mut stdout).await?;
        }
        Command::List(args) => {
            let service = TicketService::new(ticket_repo, job_queue);
            commands::list(&service, &args, &mut stdout).await?;
        }
        Command::Stats { json } => {
            let service = TicketService::new(ticket_repo, job_queue);
            commands::stats(&service, json, &mut stdout).await?;
        }
        Command::Update(args) => {
            let service = TicketService::new(ticket_repo, job_queue);
            commands::update(&service, &args, &mut stdout).await?;
        }
        Command::Seed { count } => {
            let service = TicketService::new(ticket_repo, job_queue);
            commands::seed(&service, count, &mut stdout).await?;
        }
        Command::Classify { ticket_id } => {
            let service = TicketService::new(ticket_repo, job_queue);
            commands::classify(&service, &ticket_id, &mut stdout).await?;
        }
        Command::Categorize(args) => {
            let service = TicketService::new(ticket_repo, job_queue);
            commands::categorize(&service, &args, &mut stdout).await?;
        }
        Command::Work(args) => {
            let classifier = build_classifier(&config, limiter_store)?;
            let job = ClassifyTicketJob::new(ticket_repo, Arc::new(classifier));
            let worker = QueueWorker::new(job_queue, job);
            commands::work(&worker, &args, &mut stdout).await?;
        }
        Command::Migrate => {
            commands::migrate(&db, &mut stdout).await?;
        }
    }

    Ok(())
}

/// Pick the classifier mode once from configuration
fn build_classifier(
    config: &Config,
    limiter_store: Arc<InMemoryLimiterStore>,
) -> anyhow::Result<TicketClassifier<LiveClient>> {
    if !config.classify_enabled {
        tracing::info!("Completion classification disabled, using fallback classification");
        return Ok(TicketClassifier::new(ClassifierMode::Disabled));
    }
    if !config.completion_enabled() {
        tracing::warn!("OPENAI_API_KEY is not set, using fallback classification");
        return Ok(TicketClassifier::new(ClassifierMode::Disabled));
    }

    let client = OpenAiClient::new(config.openai_settings())
        .context("Failed to build completion client")?;
    let limiter = RateLimiter::new(limiter_store, config.limiter_config());
    tracing::info!(
        model = %config.openai_model,
        rate_limit = config.rate_limit,
        "Completion classification enabled"
    );

    Ok(TicketClassifier::new(ClassifierMode::Live(Arc::new(
        ThrottledClient::new(client, limiter),
    ))))
}
