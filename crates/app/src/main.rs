use std::fmt;
use std::io::{self, BufRead, Write};

use tracing::warn;

use interview_core::catalog::Catalog;
use interview_core::model::{Grade, TopicFilter};
use services::{Clock, InterviewService, QuestionView, Step};
use storage::repository::SnapshotStore;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

struct Args {
    db_url: String,
    questions_path: String,
    topics: Option<Vec<String>>,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [--questions <path>] [--db <sqlite_url>] [--topics a,b,c]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --questions questions.json");
    eprintln!("  --db sqlite:interview.sqlite3");
    eprintln!("  --topics (all topics)");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  INTERVIEW_DB_URL, INTERVIEW_QUESTIONS");
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("INTERVIEW_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://interview.sqlite3".into(), normalize_sqlite_url);
        let mut questions_path = std::env::var("INTERVIEW_QUESTIONS")
            .ok()
            .unwrap_or_else(|| "questions.json".into());
        let mut topics = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--questions" => {
                    questions_path = require_value(args, "--questions")?;
                }
                "--topics" => {
                    let value = require_value(args, "--topics")?;
                    topics = Some(
                        value
                            .split(',')
                            .map(str::trim)
                            .filter(|t| !t.is_empty())
                            .map(str::to_owned)
                            .collect(),
                    );
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            questions_path,
            topics,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

/// Open durable storage, degrading to in-memory when SQLite is unusable.
///
/// The interview keeps running either way; only resume-across-restarts is
/// lost in degraded mode.
async fn open_store(db_url: &str) -> SnapshotStore {
    if let Err(error) = prepare_sqlite_file(db_url) {
        warn!(%error, "cannot prepare database file; running without persistence");
        return SnapshotStore::in_memory();
    }
    match SnapshotStore::sqlite(db_url).await {
        Ok(store) => store,
        Err(error) => {
            warn!(%error, "cannot open database; running without persistence");
            SnapshotStore::in_memory()
        }
    }
}

fn render_question(view: &QuestionView) {
    println!();
    println!("── {} ──", view.prompt);
    println!("   {} • {}", view.category, view.difficulty);
    for descriptor in &view.descriptors {
        println!("   [{}] {}", descriptor.grade, descriptor.text);
    }
    if let Some(existing) = &view.existing {
        let grade = existing
            .grade
            .map_or_else(|| "—".to_string(), |g| g.to_string());
        println!("   (previously answered: grade {grade}, notes: {})", existing.notes);
    }
    println!("grade 0-4 [notes], or: back / summary / report / reset / quit");
}

fn render_summary(service: &InterviewService) {
    let Ok(metrics) = service.request_summary() else {
        return;
    };

    println!();
    println!("── Summary ──");
    println!("graded answers: {}", metrics.total_questions);
    match metrics.average_score {
        Some(avg) => println!("average score: {avg:.2}"),
        None => println!("average score: —"),
    }
    match metrics.consistency.std_dev {
        Some(std_dev) => println!(
            "consistency (last {}): {} (std dev {std_dev:.2})",
            metrics.consistency.window, metrics.consistency.label
        ),
        None => println!("consistency: {}", metrics.consistency.label),
    }
    for topic in &metrics.topic_averages {
        println!("  {}: {:.2} over {} answers", topic.topic, topic.average, topic.count);
    }
    for response in service.ledger().responses() {
        let grade = response
            .grade
            .map_or_else(|| "—".to_string(), |g| g.to_string());
        let prompt = response.prompt.as_deref().unwrap_or("(no prompt)");
        println!("  {grade}  {prompt}");
    }
}

fn print_report(service: &InterviewService) {
    match service.export_report().map(|r| r.to_json_string()) {
        Ok(Ok(json)) => println!("{json}"),
        Ok(Err(error)) => eprintln!("report encoding failed: {error}"),
        Err(error) => eprintln!("{error}"),
    }
}

fn parse_command(line: &str) -> Option<(Grade, String)> {
    let mut parts = line.splitn(2, ' ');
    let head = parts.next()?;
    let grade = head.parse::<u8>().ok().and_then(|v| Grade::from_u8(v).ok())?;
    let notes = parts.next().unwrap_or("").to_string();
    Some((grade, notes))
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let args = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let json = std::fs::read_to_string(&args.questions_path)?;
    let catalog = Catalog::from_json_str(&json)?;

    let store = open_store(&args.db_url).await;
    let mut service = InterviewService::new(Clock::default_clock(), store);
    service.install_catalog(catalog);

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    let mut step = if service.has_restorable_progress().await {
        print!("resume previous session? [y/N] ");
        io::stdout().flush()?;
        let answer = lines.next().transpose()?.unwrap_or_default();
        if answer.trim().eq_ignore_ascii_case("y") {
            match service.resume().await? {
                Some(step) => step,
                None => start(&mut service, args.topics.clone()).await?,
            }
        } else {
            start(&mut service, args.topics.clone()).await?
        }
    } else {
        start(&mut service, args.topics.clone()).await?
    };

    loop {
        match &step {
            Step::Question(view) => render_question(view),
            Step::SummaryReady => {
                render_summary(&service);
                println!("report / reset / quit");
            }
            Step::Idle => {
                println!("(back at the start; 'reset' to clear, 'quit' to leave)");
            }
        }

        let Some(line) = lines.next().transpose()? else {
            break;
        };
        let line = line.trim().to_string();

        match line.as_str() {
            "quit" | "q" => break,
            "back" => step = service.back().await?,
            "summary" => {
                render_summary(&service);
            }
            "report" => print_report(&service),
            "reset" => {
                service.reset().await?;
                step = start(&mut service, args.topics.clone()).await?;
            }
            "" => {}
            other => match parse_command(other) {
                Some((grade, notes)) => step = service.submit_grade(grade, &notes).await?,
                None => println!("unrecognized input: {other}"),
            },
        }
    }

    Ok(())
}

async fn start(
    service: &mut InterviewService,
    topics: Option<Vec<String>>,
) -> Result<Step, Box<dyn std::error::Error>> {
    let filter = match topics {
        Some(topics) => TopicFilter::subset(topics),
        None => TopicFilter::all(Vec::new()),
    };
    Ok(service.start_fresh(filter).await?)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
