use std::fmt;
use std::time::Duration;

use quiz_core::flashcards::FlashcardDeck;
use quiz_core::model::{Lesson, LessonId, QuizSettings};
use services::{AppServices, Clock, SessionInput, Step};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::time::MissedTickBehavior;

mod terminal;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidLessonId { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidLessonId { raw } => write!(f, "invalid --lesson value: {raw}"),
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
    lesson_id: Option<LessonId>,
    in_memory: bool,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [play]     [--db <sqlite_url>] [--lesson <id>] [--memory]");
    eprintln!("  cargo run -p app -- lessons    [--db <sqlite_url>] [--memory]");
    eprintln!("  cargo run -p app -- stats      [--db <sqlite_url>] [--memory]");
    eprintln!("  cargo run -p app -- flashcards [--db <sqlite_url>] [--memory]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://quiz.sqlite3");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_LESSON_ID, RUST_LOG");
    eprintln!();
    eprintln!("While playing: :skip gives up a question, :more adds time, :q pauses.");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Play,
    Lessons,
    Stats,
    Flashcards,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "play" => Some(Self::Play),
            "lessons" => Some(Self::Lessons),
            "stats" => Some(Self::Stats),
            "flashcards" => Some(Self::Flashcards),
            _ => None,
        }
    }
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("QUIZ_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://quiz.sqlite3".into(), normalize_sqlite_url);
        let mut lesson_id = std::env::var("QUIZ_LESSON_ID")
            .ok()
            .and_then(|value| value.parse::<LessonId>().ok());
        let mut in_memory = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--lesson" => {
                    let value = require_value(args, "--lesson")?;
                    let parsed = value
                        .parse::<LessonId>()
                        .map_err(|_| ArgsError::InvalidLessonId { raw: value.clone() })?;
                    lesson_id = Some(parsed);
                }
                "--memory" => in_memory = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            lesson_id,
            in_memory,
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

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with_writer(std::io::stderr)
        .init();
}

type StdinLines = Lines<BufReader<Stdin>>;

async fn prompt(lines: &mut StdinLines, question: &str) -> std::io::Result<Option<String>> {
    println!("{question}");
    lines.next_line().await
}

async fn choose_lesson<'a>(
    lines: &mut StdinLines,
    lessons: &'a [Lesson],
) -> std::io::Result<Option<&'a Lesson>> {
    print!("{}", terminal::render_lessons(lessons));
    loop {
        let Some(line) = prompt(lines, "Pick a lesson id (empty to quit):").await? else {
            return Ok(None);
        };
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let picked = line
            .parse::<LessonId>()
            .ok()
            .and_then(|id| lessons.iter().find(|l| l.id() == id));
        if picked.is_some() {
            return Ok(picked);
        }
        println!("no lesson {line}");
    }
}

async fn play(
    services: &AppServices,
    requested: Option<LessonId>,
) -> Result<(), Box<dyn std::error::Error>> {
    let lessons = services.catalog().lessons().await;
    let lesson_loop = services.lesson_loop();
    let mut controller = lesson_loop.controller();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let saved = match requested {
        Some(_) => None,
        None => lesson_loop.saved_lesson().await,
    };
    let mut resumed = false;
    if let Some(lesson_id) = saved {
        let title = lessons
            .iter()
            .find(|l| l.id() == lesson_id)
            .map_or("an unknown lesson", Lesson::title);
        let answer = prompt(&mut lines, &format!("Resume your attempt at {title}? [Y/n]")).await?;
        if answer.is_some_and(|a| !a.trim().eq_ignore_ascii_case("n")) {
            resumed = lesson_loop.resume_saved(&mut controller, &lessons).await == Step::Resumed;
        }
    }

    if !resumed {
        let lesson = match requested {
            Some(id) => lessons
                .iter()
                .find(|l| l.id() == id)
                .ok_or_else(|| format!("no lesson with id {id}"))?,
            None => match choose_lesson(&mut lines, &lessons).await? {
                Some(lesson) => lesson,
                None => return Ok(()),
            },
        };
        lesson_loop.start(&mut controller, lesson).await;
    }

    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;
    print!("{}", terminal::render_view(&controller.view()));

    loop {
        let input = tokio::select! {
            _ = ticker.tick() => match controller.active_timer() {
                Some(handle) => SessionInput::Tick(handle),
                None => continue,
            },
            line = lines.next_line() => match line? {
                Some(line) => match terminal::parse_input(&line, &controller.view()) {
                    Some(input) => input,
                    None => continue,
                },
                None => SessionInput::Abandon,
            },
        };

        let outcome = lesson_loop.handle(&mut controller, input).await;
        if let Some(feedback) = terminal::render_step(&outcome.step) {
            println!("{feedback}");
        }
        if let Some(result) = &outcome.result {
            print!("{}", terminal::render_result(result));
            return Ok(());
        }
        match outcome.step {
            Step::Abandoned => return Ok(()),
            Step::Ignored | Step::Ticked { .. } | Step::Incorrect | Step::PairRejected => {}
            _ => print!("{}", terminal::render_view(&controller.view())),
        }
    }
}

async fn stats(services: &AppServices) {
    let lessons = services.catalog().lessons().await;
    let statistics = services.statistics();
    let dashboard = statistics.dashboard(&lessons).await;
    let challenging = statistics.most_challenging().await;
    print!("{}", terminal::render_dashboard(&dashboard, &challenging));
    if let Some(last) = statistics.last_result().await {
        print!("\nLast result:{}", terminal::render_result(&last));
    }
}

async fn flashcards(services: &AppServices) -> std::io::Result<()> {
    let mut deck = FlashcardDeck::new(services.catalog().vocabulary_sets());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    for (i, set) in deck.sets().iter().enumerate() {
        println!("{:>3}  {} ({} words)", i + 1, set.title, set.words.len());
    }
    println!("enter: flip, n: next, p: previous, s <n>: switch set, q: quit");

    loop {
        print!("{}", terminal::render_card(&deck));
        let Some(line) = lines.next_line().await? else {
            return Ok(());
        };
        match line.trim() {
            "" | "f" => deck.flip(),
            "n" => deck.next(),
            "p" => deck.previous(),
            "q" => return Ok(()),
            other => {
                let picked = other
                    .strip_prefix('s')
                    .and_then(|n| n.trim().parse::<usize>().ok())
                    .and_then(|n| n.checked_sub(1));
                if !picked.is_some_and(|i| deck.select_set(i)) {
                    println!("unknown command: {other}");
                }
            }
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Playing is the default when no subcommand is provided.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Play,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Play,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let parsed = Args::parse(&mut argv.into_iter()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    init_tracing();
    tracing::debug!(?cmd, in_memory = parsed.in_memory, "starting");

    let clock = Clock::default_clock();
    let settings = QuizSettings::default();
    let services = if parsed.in_memory {
        AppServices::in_memory(clock, settings)?
    } else {
        prepare_sqlite_file(&parsed.db_url)?;
        AppServices::new_sqlite(&parsed.db_url, clock, settings).await?
    };

    match cmd {
        Command::Play => play(&services, parsed.lesson_id).await,
        Command::Lessons => {
            print!(
                "{}",
                terminal::render_lessons(&services.catalog().lessons().await)
            );
            Ok(())
        }
        Command::Stats => {
            stats(&services).await;
            Ok(())
        }
        Command::Flashcards => Ok(flashcards(&services).await?),
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, ArgsError> {
        Args::parse(&mut args.iter().map(|s| (*s).to_owned()))
    }

    #[test]
    fn flags_override_defaults() {
        let args = parse(&["--db", "sqlite::memory:", "--lesson", "3", "--memory"]).unwrap();
        assert_eq!(args.db_url, "sqlite::memory:");
        assert_eq!(args.lesson_id, Some(LessonId::new(3)));
        assert!(args.in_memory);
    }

    #[test]
    fn bad_flags_are_reported() {
        assert!(matches!(
            parse(&["--lesson", "three"]),
            Err(ArgsError::InvalidLessonId { .. })
        ));
        assert!(matches!(
            parse(&["--db"]),
            Err(ArgsError::MissingValue { flag: "--db" })
        ));
        assert!(matches!(parse(&["--wat"]), Err(ArgsError::UnknownArg(_))));
    }

    #[test]
    fn relative_paths_become_sqlite_urls() {
        let url = normalize_sqlite_url("sqlite:data/quiz.db".into());
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("data/quiz.db"));
        assert_eq!(
            normalize_sqlite_url("sqlite://already.db".into()),
            "sqlite://already.db"
        );
    }

    #[test]
    fn subcommands_parse() {
        assert_eq!(Command::from_arg("stats"), Some(Command::Stats));
        assert_eq!(Command::from_arg("flashcards"), Some(Command::Flashcards));
        assert_eq!(Command::from_arg("ui"), None);
    }
}
