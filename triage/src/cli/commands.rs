//! Command handlers and terminal output

use std::io::{BufRead, Write};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use rand::rngs::StdRng;
use rand::SeedableRng;
use sea_orm::DatabaseConnection;
use serde::Serialize;

use crate::adapters::postgres::create_tables;
use crate::app::bulk_classify::{BulkClassifyService, BulkOptions, DispatchPlan, DispatchProgress};
use crate::app::rate_limiter::ceil_secs;
use crate::app::sample_tickets::sample_tickets;
use crate::app::ticket_service::TicketService;
use crate::app::worker::QueueWorker;
use crate::cli::{BulkClassifyArgs, CategorizeArgs, CreateArgs, ListArgs, UpdateArgs, WorkArgs};
use crate::domain::entities::{
    Category, NewTicket, Ticket, TicketChanges, TicketFilter, TicketId, TicketPage, TicketStats,
    TicketStatus,
};
use crate::domain::ports::{CompletionClient, LimiterStore, TaskQueue, TicketRepository};
use crate::error::AppError;

/// Number of tickets listed in a dry run
const SAMPLE_SIZE: usize = 5;
const SAMPLE_SUBJECT_CHARS: usize = 50;

// ============================================================================
// bulk-classify
// ============================================================================

/// Plan, confirm and dispatch a bulk classification run
pub async fn bulk_classify<TR, Q, S>(
    service: &BulkClassifyService<TR, Q, S>,
    args: &BulkClassifyArgs,
    out: &mut impl Write,
    input: &mut impl BufRead,
    progress_target: ProgressDrawTarget,
) -> Result<(), AppError>
where
    TR: TicketRepository,
    Q: TaskQueue,
    S: LimiterStore,
{
    let options = BulkOptions::new(args.batch_size(), args.delay, args.force);
    let plan = service.plan(&options).await?;

    if plan.is_empty() {
        writeln!(out, "No tickets found that need classification.")?;
        return Ok(());
    }

    if args.dry_run {
        write!(out, "{}", render_dry_run(&plan))?;
        return Ok(());
    }

    writeln!(out, "Found {} tickets to classify.", plan.total())?;
    writeln!(out, "Rate limit: {} calls/minute", plan.rate_limit)?;
    writeln!(out, "Batch size: {}", plan.batch_size)?;
    writeln!(out, "Delay between batches: {} seconds", plan.delay.as_secs())?;

    if !args.yes && !confirm(out, input, "Do you want to proceed?")? {
        writeln!(out, "Operation cancelled.")?;
        return Ok(());
    }

    let progress = TerminalProgress::new(plan.total() as u64, progress_target);
    let report = service.dispatch(&plan, &progress).await;
    progress.finish();

    writeln!(out)?;
    writeln!(out, "Bulk classification completed!")?;
    writeln!(out, "Processed: {} tickets", report.processed)?;
    if report.errors > 0 {
        writeln!(out, "Errors: {} tickets failed to queue", report.errors)?;
    }

    Ok(())
}

/// Ask a yes/no question; anything but y/yes is a no
fn confirm(out: &mut impl Write, input: &mut impl BufRead, question: &str) -> Result<bool, AppError> {
    write!(out, "{} (y/N) ", question)?;
    out.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    let answer = answer.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}

/// Summary table and sample tickets shown by `--dry-run`
pub fn render_dry_run(plan: &DispatchPlan) -> String {
    let mut text = String::new();
    text.push_str("DRY RUN MODE - No tickets will be actually classified\n");
    text.push_str(&format!(
        "Found {} tickets that would be processed:\n\n",
        plan.total()
    ));

    let rows = [
        ("Total tickets", plan.total().to_string()),
        ("Batch size", plan.batch_size.to_string()),
        ("Number of batches", plan.batch_count().to_string()),
        ("Rate limit", format!("{}/minute", plan.rate_limit)),
        ("Delay between batches", format!("{}s", plan.delay.as_secs())),
        (
            "Estimated time",
            format_duration(plan.estimated_duration().as_secs()),
        ),
    ];
    text.push_str(&format!("{:<24}{}\n", "Metric", "Value"));
    for (metric, value) in rows {
        text.push_str(&format!("{:<24}{}\n", metric, value));
    }

    text.push_str("\nSample tickets to be classified:\n");
    for ticket in plan.tickets.iter().take(SAMPLE_SIZE) {
        text.push_str(&sample_line(ticket));
        text.push('\n');
    }
    if plan.total() > SAMPLE_SIZE {
        text.push_str(&format!(
            "... and {} more tickets\n",
            plan.total() - SAMPLE_SIZE
        ));
    }

    text
}

fn sample_line(ticket: &Ticket) -> String {
    let subject: String = ticket.subject.chars().take(SAMPLE_SUBJECT_CHARS).collect();
    format!("- {}: {}...", ticket.id, subject)
}

/// Human duration: `45s`, `2m 5s`, `3m`, `1h 3m`, `2h`
pub fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        return format!("{}s", seconds);
    }

    let minutes = seconds / 60;
    let remaining_seconds = seconds % 60;
    if minutes < 60 {
        return if remaining_seconds > 0 {
            format!("{}m {}s", minutes, remaining_seconds)
        } else {
            format!("{}m", minutes)
        };
    }

    let hours = minutes / 60;
    let remaining_minutes = minutes % 60;
    if remaining_minutes > 0 {
        format!("{}h {}m", hours, remaining_minutes)
    } else {
        format!("{}h", hours)
    }
}

/// Progress bar fed by the dispatch loop
pub struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    pub fn new(len: u64, target: ProgressDrawTarget) -> Self {
        let bar = ProgressBar::with_draw_target(Some(len), target);
        bar.set_style(
            ProgressStyle::with_template(
                "[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} tickets ({eta}) {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl DispatchProgress for TerminalProgress {
    fn ticket_done(&self, ticket: &Ticket, queued: bool) {
        if !queued {
            self.bar
                .println(format!("Failed to queue ticket {}", ticket.id));
        }
        self.bar.inc(1);
    }

    fn rate_limited(&self, wait: Duration) {
        self.bar.println(format!(
            "Rate limit exceeded. Waiting {} seconds before continuing...",
            ceil_secs(wait)
        ));
    }

    fn batch_pause(&self, delay: Duration) {
        self.bar
            .set_message(format!("pausing {}s between batches", delay.as_secs()));
    }
}

// ============================================================================
// classify / categorize
// ============================================================================

fn parse_ticket_id(raw: &str) -> Result<TicketId, AppError> {
    raw.parse().map_err(AppError::BadRequest)
}

fn parse_category(raw: &str) -> Result<Category, AppError> {
    raw.parse().map_err(|e| {
        let valid: Vec<&str> = Category::ALL.iter().map(|c| c.key()).collect();
        AppError::BadRequest(format!("{} (expected one of: {})", e, valid.join(", ")))
    })
}

fn parse_status(raw: &str) -> Result<TicketStatus, AppError> {
    raw.parse().map_err(|e| {
        let valid: Vec<String> = TicketStatus::ALL.iter().map(|s| s.to_string()).collect();
        AppError::BadRequest(format!("{} (expected one of: {})", e, valid.join(", ")))
    })
}

pub async fn classify<TR, Q>(
    service: &TicketService<TR, Q>,
    ticket_id: &str,
    out: &mut impl Write,
) -> Result<(), AppError>
where
    TR: TicketRepository,
    Q: TaskQueue,
{
    let id = parse_ticket_id(ticket_id)?;
    let job_id = service.queue_classification(&id).await?;
    writeln!(out, "Queued classification job {} for ticket {}", job_id, id)?;
    Ok(())
}

pub async fn categorize<TR, Q>(
    service: &TicketService<TR, Q>,
    args: &CategorizeArgs,
    out: &mut impl Write,
) -> Result<(), AppError>
where
    TR: TicketRepository,
    Q: TaskQueue,
{
    let id = parse_ticket_id(&args.ticket_id)?;

    if args.release {
        service.release_manual_category(&id).await?;
        writeln!(out, "Manual category released for ticket {}", id)?;
        return Ok(());
    }

    let raw = args
        .category
        .as_deref()
        .ok_or_else(|| AppError::BadRequest("Category is required".to_string()))?;
    let ticket = service.categorize(&id, parse_category(raw)?).await?;
    let label = ticket.category.map(|c| c.label()).unwrap_or("-");
    writeln!(out, "Ticket {} categorized as {} (manual)", id, label)?;
    Ok(())
}

// ============================================================================
// create / list / stats / update / seed
// ============================================================================

const LIST_SUBJECT_CHARS: usize = 40;

fn write_json(out: &mut impl Write, value: &impl Serialize) -> Result<(), AppError> {
    serde_json::to_writer_pretty(&mut *out, value).map_err(std::io::Error::from)?;
    writeln!(out)?;
    Ok(())
}

pub async fn create<TR, Q>(
    service: &TicketService<TR, Q>,
    args: &CreateArgs,
    out: &mut impl Write,
) -> Result<(), AppError>
where
    TR: TicketRepository,
    Q: TaskQueue,
{
    let ticket = service
        .create(NewTicket {
            subject: args.subject.clone(),
            body: args.body.clone(),
            status: parse_status(&args.status)?,
            note: args.note.clone(),
        })
        .await?;
    writeln!(out, "Created ticket {}", ticket.id)?;
    Ok(())
}

pub async fn list<TR, Q>(
    service: &TicketService<TR, Q>,
    args: &ListArgs,
    out: &mut impl Write,
) -> Result<(), AppError>
where
    TR: TicketRepository,
    Q: TaskQueue,
{
    let filter = TicketFilter {
        search: args.search.clone(),
        status: args.status.as_deref().map(parse_status).transpose()?,
        category: args.category.as_deref().map(parse_category).transpose()?,
    };
    let page = service.list(&filter, &args.page_request()).await?;

    if args.json {
        return write_json(out, &page);
    }
    write!(out, "{}", render_page(&page))?;
    Ok(())
}

/// Ticket table followed by the page position
pub fn render_page(page: &TicketPage) -> String {
    let mut text = String::new();
    text.push_str(&format!(
        "{:<38}{:<13}{:<18}{:<7}{}\n",
        "ID", "Status", "Category", "Conf", "Subject"
    ));
    for ticket in &page.tickets {
        let category = match (ticket.category, ticket.manually_categorized) {
            (Some(c), true) => format!("{}*", c.key()),
            (Some(c), false) => c.key().to_string(),
            (None, _) => "-".to_string(),
        };
        let confidence = ticket
            .confidence
            .map(|c| format!("{:.2}", c))
            .unwrap_or_else(|| "-".to_string());
        let subject: String = ticket.subject.chars().take(LIST_SUBJECT_CHARS).collect();
        text.push_str(&format!(
            "{:<38}{:<13}{:<18}{:<7}{}\n",
            ticket.id.to_string(),
            ticket.status.to_string(),
            category,
            confidence,
            subject
        ));
    }
    text.push_str(&format!(
        "Page {} of {} ({} tickets)\n",
        page.page,
        page.last_page(),
        page.total
    ));
    text
}

pub async fn stats<TR, Q>(
    service: &TicketService<TR, Q>,
    json: bool,
    out: &mut impl Write,
) -> Result<(), AppError>
where
    TR: TicketRepository,
    Q: TaskQueue,
{
    let stats = service.stats().await?;
    if json {
        return write_json(out, &stats);
    }
    write!(out, "{}", render_stats(&stats))?;
    Ok(())
}

pub fn render_stats(stats: &TicketStats) -> String {
    let mut text = String::new();
    text.push_str(&format!("{:<24}{}\n", "Total tickets", stats.total_tickets));
    text.push_str(&format!("{:<24}{}\n", "Classified", stats.classified_tickets));
    let average = stats
        .average_confidence
        .map(|c| format!("{:.2}", c))
        .unwrap_or_else(|| "-".to_string());
    text.push_str(&format!("{:<24}{}\n", "Average confidence", average));

    text.push_str("\nBy status:\n");
    for status in TicketStatus::ALL {
        let count = stats.by_status.get(&status.to_string()).copied().unwrap_or(0);
        text.push_str(&format!("  {:<22}{}\n", status.to_string(), count));
    }

    text.push_str("\nBy category:\n");
    for category in Category::ALL {
        let count = stats.by_category.get(category.key()).copied().unwrap_or(0);
        text.push_str(&format!("  {:<22}{}\n", category.label(), count));
    }
    text
}

pub async fn update<TR, Q>(
    service: &TicketService<TR, Q>,
    args: &UpdateArgs,
    out: &mut impl Write,
) -> Result<(), AppError>
where
    TR: TicketRepository,
    Q: TaskQueue,
{
    let id = parse_ticket_id(&args.ticket_id)?;
    let changes = TicketChanges {
        status: args.status.as_deref().map(parse_status).transpose()?,
        note: args.note_change(),
    };
    let category = args.category.as_deref().map(parse_category).transpose()?;

    let ticket = service.update(&id, &changes, category).await?;
    let label = ticket.category.map(|c| c.label()).unwrap_or("-");
    writeln!(
        out,
        "Ticket {} updated: status {}, category {}{}",
        id,
        ticket.status,
        label,
        if ticket.manually_categorized { " (manual)" } else { "" }
    )?;
    Ok(())
}

pub async fn seed<TR, Q>(
    service: &TicketService<TR, Q>,
    count: usize,
    out: &mut impl Write,
) -> Result<(), AppError>
where
    TR: TicketRepository,
    Q: TaskQueue,
{
    let samples = sample_tickets(&mut StdRng::from_entropy(), count);
    let created = service.seed(samples).await?;
    let classified = created.iter().filter(|t| t.category.is_some()).count();
    writeln!(
        out,
        "Seeded {} tickets ({} already classified)",
        created.len(),
        classified
    )?;
    Ok(())
}

// ============================================================================
// work / migrate
// ============================================================================

pub async fn work<Q, TR, C>(
    worker: &QueueWorker<Q, TR, C>,
    args: &WorkArgs,
    out: &mut impl Write,
) -> Result<(), AppError>
where
    Q: TaskQueue,
    TR: TicketRepository,
    C: CompletionClient,
{
    if args.once {
        let report = worker.drain().await?;
        writeln!(
            out,
            "Classified: {}, Skipped: {}, Failed: {}",
            report.classified, report.skipped, report.failed
        )?;
        return Ok(());
    }

    tokio::select! {
        _ = worker.run(Duration::from_secs(args.idle)) => {}
        signal = tokio::signal::ctrl_c() => {
            signal?;
            tracing::info!("Worker stopped");
        }
    }
    Ok(())
}

pub async fn migrate(db: &DatabaseConnection, out: &mut impl Write) -> Result<(), AppError> {
    create_tables(db).await?;
    writeln!(out, "Tables are ready.")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryLimiterStore;
    use crate::app::rate_limiter::{LimiterConfig, RateLimiter};
    use crate::domain::entities::Task;
    use crate::test_utils::{
        test_ticket, test_ticket_categorized, test_tickets, InMemoryTaskQueue,
        InMemoryTicketRepository,
    };
    use std::sync::Arc;

    type Service =
        BulkClassifyService<InMemoryTicketRepository, InMemoryTaskQueue, InMemoryLimiterStore>;

    fn bulk_service(tickets: Vec<Ticket>, queue: Arc<InMemoryTaskQueue>) -> Service {
        let repo = tickets
            .into_iter()
            .fold(InMemoryTicketRepository::new(), |repo, t| repo.with_ticket(t));
        let limiter = RateLimiter::new(
            Arc::new(InMemoryLimiterStore::new()),
            LimiterConfig::with_limits(30, 1),
        );
        BulkClassifyService::new(Arc::new(repo), queue, limiter)
    }

    fn args(dry_run: bool, yes: bool) -> BulkClassifyArgs {
        BulkClassifyArgs {
            batch_size: 10,
            rate_limit: 30,
            delay: 1,
            force: false,
            dry_run,
            yes,
        }
    }

    async fn run(service: &Service, args: &BulkClassifyArgs, answer: &str) -> String {
        let mut out = Vec::new();
        let mut input = answer.as_bytes();
        bulk_classify(service, args, &mut out, &mut input, ProgressDrawTarget::hidden())
            .await
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn format_duration_units() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(11), "11s");
        assert_eq!(format_duration(60), "1m");
        assert_eq!(format_duration(125), "2m 5s");
        assert_eq!(format_duration(3600), "1h");
        assert_eq!(format_duration(3780), "1h 3m");
    }

    #[test]
    fn sample_line_cuts_subject_at_fifty_chars() {
        let ticket = Ticket {
            subject: "x".repeat(80),
            ..test_ticket()
        };

        let line = sample_line(&ticket);

        assert_eq!(line, format!("- {}: {}...", ticket.id, "x".repeat(50)));
    }

    #[tokio::test]
    async fn dry_run_prints_table_and_dispatches_nothing() {
        let queue = Arc::new(InMemoryTaskQueue::new());
        let service = bulk_service(test_tickets(5), queue.clone());

        let output = run(&service, &args(true, false), "").await;

        assert!(output.contains("Found 5 tickets that would be processed"));
        assert!(output.contains(&format!("{:<24}{}", "Number of batches", 1)));
        assert!(output.contains(&format!("{:<24}{}", "Rate limit", "30/minute")));
        assert!(output.contains(&format!("{:<24}{}", "Estimated time", "11s")));
        assert_eq!(output.matches("\n- ").count(), 5);
        assert!(!output.contains("more tickets"));
        assert!(queue.enqueued().is_empty());
    }

    #[tokio::test]
    async fn dry_run_mentions_remaining_tickets() {
        let service = bulk_service(test_tickets(8), Arc::new(InMemoryTaskQueue::new()));

        let output = run(&service, &args(true, false), "").await;

        assert_eq!(output.matches("\n- ").count(), 5);
        assert!(output.contains("... and 3 more tickets"));
    }

    #[tokio::test]
    async fn dry_run_with_huge_delay_still_renders() {
        let service = bulk_service(test_tickets(3), Arc::new(InMemoryTaskQueue::new()));
        let args = BulkClassifyArgs {
            batch_size: 1,
            delay: 9_223_372_036_854_775_807,
            ..args(true, false)
        };

        let output = run(&service, &args, "").await;

        assert!(output.contains(&format!(
            "{:<24}{}",
            "Estimated time",
            format_duration(u64::MAX)
        )));
    }

    #[tokio::test]
    async fn nothing_to_do_skips_prompt() {
        let queue = Arc::new(InMemoryTaskQueue::new());
        let service = bulk_service(vec![], queue.clone());

        let output = run(&service, &args(false, false), "").await;

        assert_eq!(output, "No tickets found that need classification.\n");
    }

    #[tokio::test]
    async fn declined_prompt_cancels_run() {
        let queue = Arc::new(InMemoryTaskQueue::new());
        let service = bulk_service(test_tickets(2), queue.clone());

        let output = run(&service, &args(false, false), "n\n").await;

        assert!(output.contains("Do you want to proceed? (y/N)"));
        assert!(output.contains("Operation cancelled."));
        assert!(queue.enqueued().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn confirmed_run_reports_counts() {
        let tickets = test_tickets(3);
        let queue = Arc::new(InMemoryTaskQueue::new().failing_for(tickets[0].id));
        let service = bulk_service(tickets, queue.clone());

        let output = run(&service, &args(false, false), "yes\n").await;

        assert!(output.contains("Processed: 2 tickets"));
        assert!(output.contains("Errors: 1 tickets failed to queue"));
        assert_eq!(queue.enqueued().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn yes_flag_skips_prompt() {
        let queue = Arc::new(InMemoryTaskQueue::new());
        let service = bulk_service(test_tickets(2), queue.clone());

        let output = run(&service, &args(false, true), "").await;

        assert!(!output.contains("proceed?"));
        assert!(output.contains("Processed: 2 tickets"));
        assert!(!output.contains("Errors:"));
    }

    #[tokio::test]
    async fn categorize_rejects_unknown_category() {
        let ticket = test_ticket();
        let service = TicketService::new(
            Arc::new(InMemoryTicketRepository::new().with_ticket(ticket.clone())),
            Arc::new(InMemoryTaskQueue::new()),
        );
        let args = CategorizeArgs {
            ticket_id: ticket.id.to_string(),
            category: Some("refunds".to_string()),
            release: false,
        };

        let err = categorize(&service, &args, &mut Vec::new()).await.unwrap_err();

        assert!(matches!(err, AppError::BadRequest(_)));
        assert!(err.to_string().contains("feature_request"));
    }

    #[tokio::test]
    async fn classify_command_queues_task() {
        let ticket = test_ticket();
        let queue = Arc::new(InMemoryTaskQueue::new());
        let service = TicketService::new(
            Arc::new(InMemoryTicketRepository::new().with_ticket(ticket.clone())),
            queue.clone(),
        );
        let mut out = Vec::new();

        classify(&service, &ticket.id.to_string(), &mut out).await.unwrap();

        assert_eq!(queue.enqueued(), vec![Task::classify(ticket.id)]);
        assert!(String::from_utf8(out).unwrap().contains("Queued classification job"));
    }

    #[tokio::test]
    async fn classify_command_rejects_bad_id() {
        let service = TicketService::new(
            Arc::new(InMemoryTicketRepository::new()),
            Arc::new(InMemoryTaskQueue::new()),
        );

        let err = classify(&service, "not-a-uuid", &mut Vec::new()).await.unwrap_err();

        assert!(matches!(err, AppError::BadRequest(_)));
    }

    fn ticket_service(
        repo: InMemoryTicketRepository,
    ) -> TicketService<InMemoryTicketRepository, InMemoryTaskQueue> {
        TicketService::new(Arc::new(repo), Arc::new(InMemoryTaskQueue::new()))
    }

    fn list_args() -> ListArgs {
        ListArgs {
            search: None,
            status: None,
            category: None,
            page: 1,
            per_page: 10,
            json: false,
        }
    }

    #[tokio::test]
    async fn create_command_stores_ticket() {
        let repo = Arc::new(InMemoryTicketRepository::new());
        let service = TicketService::new(repo.clone(), Arc::new(InMemoryTaskQueue::new()));
        let args = CreateArgs {
            subject: "Printer on fire".to_string(),
            body: "Smoke everywhere".to_string(),
            status: "in_progress".to_string(),
            note: Some("Call facilities".to_string()),
        };
        let mut out = Vec::new();

        create(&service, &args, &mut out).await.unwrap();

        let page = service
            .list(&TicketFilter::default(), &Default::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.tickets[0].status, TicketStatus::InProgress);
        assert!(String::from_utf8(out).unwrap().starts_with("Created ticket "));
    }

    #[tokio::test]
    async fn create_command_rejects_unknown_status() {
        let service = ticket_service(InMemoryTicketRepository::new());
        let args = CreateArgs {
            subject: "Hi".to_string(),
            body: "Help".to_string(),
            status: "pending".to_string(),
            note: None,
        };

        let err = create(&service, &args, &mut Vec::new()).await.unwrap_err();

        assert!(matches!(err, AppError::BadRequest(_)));
        assert!(err.to_string().contains("in_progress"));
    }

    #[tokio::test]
    async fn list_command_filters_and_shows_page() {
        let billing = Ticket {
            subject: "Invoice is wrong".to_string(),
            ..test_ticket_categorized(Category::Billing, 0.82)
        };
        let repo = test_tickets(3)
            .into_iter()
            .fold(InMemoryTicketRepository::new(), |repo, t| repo.with_ticket(t))
            .with_ticket(billing.clone());
        let service = ticket_service(repo);
        let mut out = Vec::new();

        let args = ListArgs {
            category: Some("billing".to_string()),
            ..list_args()
        };
        list(&service, &args, &mut out).await.unwrap();

        let output = String::from_utf8(out).unwrap();
        assert!(output.contains(&billing.id.to_string()));
        assert!(output.contains("0.82"));
        assert!(!output.contains("Ticket number"));
        assert!(output.ends_with("Page 1 of 1 (1 tickets)\n"));
    }

    #[tokio::test]
    async fn list_command_prints_json() {
        let repo = test_tickets(3)
            .into_iter()
            .fold(InMemoryTicketRepository::new(), |repo, t| repo.with_ticket(t));
        let service = ticket_service(repo);
        let mut out = Vec::new();

        let args = ListArgs {
            per_page: 2,
            json: true,
            ..list_args()
        };
        list(&service, &args, &mut out).await.unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["total"], 3);
        assert_eq!(value["per_page"], 2);
        assert_eq!(value["tickets"].as_array().unwrap().len(), 2);
        assert_eq!(value["tickets"][0]["subject"], "Ticket number 3");
    }

    #[tokio::test]
    async fn stats_command_lists_every_status() {
        let repo = InMemoryTicketRepository::new()
            .with_ticket(test_ticket())
            .with_ticket(test_ticket_categorized(Category::Technical, 0.5));
        let service = ticket_service(repo);
        let mut out = Vec::new();

        stats(&service, false, &mut out).await.unwrap();

        let output = String::from_utf8(out).unwrap();
        assert!(output.contains(&format!("{:<24}{}", "Total tickets", 2)));
        assert!(output.contains(&format!("{:<24}{}", "Average confidence", "0.50")));
        assert!(output.contains(&format!("  {:<22}{}", "in_progress", 0)));
        assert!(output.contains(&format!("  {:<22}{}", "open", 2)));
    }

    #[tokio::test]
    async fn update_command_applies_changes() {
        let ticket = test_ticket();
        let repo = Arc::new(InMemoryTicketRepository::new().with_ticket(ticket.clone()));
        let service = TicketService::new(repo.clone(), Arc::new(InMemoryTaskQueue::new()));
        let args = UpdateArgs {
            ticket_id: ticket.id.to_string(),
            status: Some("resolved".to_string()),
            category: Some("billing".to_string()),
            note: Some("Refunded".to_string()),
            clear_note: false,
        };
        let mut out = Vec::new();

        update(&service, &args, &mut out).await.unwrap();

        let stored = repo.get(&ticket.id).unwrap();
        assert_eq!(stored.status, TicketStatus::Resolved);
        assert_eq!(stored.category, Some(Category::Billing));
        assert!(stored.manually_categorized);
        assert_eq!(stored.note.as_deref(), Some("Refunded"));
        assert!(String::from_utf8(out).unwrap().contains("(manual)"));
    }

    #[tokio::test]
    async fn seed_command_reports_count() {
        let repo = Arc::new(InMemoryTicketRepository::new());
        let service = TicketService::new(repo.clone(), Arc::new(InMemoryTaskQueue::new()));
        let mut out = Vec::new();

        seed(&service, 12, &mut out).await.unwrap();

        assert_eq!(service.stats().await.unwrap().total_tickets, 12);
        assert!(String::from_utf8(out).unwrap().starts_with("Seeded 12 tickets"));
    }
}
