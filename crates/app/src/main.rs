use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::info;

use quiz_core::domains::generator_for;
use quiz_core::error::ConfigError;
use quiz_core::feedback::PlainFeedback;
use quiz_core::model::{
    AgeGroup, Answer, Difficulty, Domain, EngineSettings, LearnerId, Problem, SessionConfig,
};
use quiz_core::ParseKeyError;
use services::{Clock, EngineError, LearnerService, NextStep};
use storage::repository::{SessionResultRepository, Storage, StorageError};
use storage::sqlite::SqliteInitError;

mod logging;

#[derive(Debug, Error)]
enum ArgsError {
    #[error("{flag} requires a value")]
    MissingValue { flag: &'static str },
    #[error("unknown argument: {0}")]
    UnknownArg(String),
    #[error("invalid {flag} value: {raw}")]
    InvalidNumber { flag: &'static str, raw: String },
    #[error("invalid --db value: {raw}")]
    InvalidDbUrl { raw: String },
    #[error(transparent)]
    Key(#[from] ParseKeyError),
}

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Args(#[from] ArgsError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    SqliteInit(#[from] SqliteInitError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_number<T: std::str::FromStr>(flag: &'static str, raw: String) -> Result<T, ArgsError> {
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidNumber { flag, raw })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- play    [--db <sqlite_url>] [--learner <id>] [--domain <name>]");
    eprintln!("                              [--questions <n>] [--difficulty <level>] [--age <group>]");
    eprintln!("                              [--seed <n>] [--accuracy <0..1>]");
    eprintln!("  cargo run -p app -- history [--db <sqlite_url>] [--learner <id>]");
    eprintln!();
    eprintln!("Defaults for play:");
    eprintln!("  --db sqlite:arcade.sqlite3 --learner 1 --domain arithmetic");
    eprintln!("  --questions 10 --difficulty easy --age kindergarten --accuracy 0.75");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  ARCADE_DATABASE_URL, ARCADE_LEARNER, ARCADE_DOMAIN, ARCADE_QUESTIONS,");
    eprintln!("  ARCADE_DIFFICULTY, ARCADE_SEED, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Play,
    History,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "play" => Some(Self::Play),
            "history" => Some(Self::History),
            _ => None,
        }
    }
}

/// Settings for one run, from environment defaults overridden by flags.
#[derive(Debug, Clone)]
struct AppConfig {
    db_url: String,
    learner: LearnerId,
    domain: Domain,
    questions: u32,
    difficulty: Difficulty,
    age_group: AgeGroup,
    seed: Option<u64>,
    accuracy: f64,
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    fn from_env() -> Result<Self, ArgsError> {
        let mut config = Self {
            db_url: env_var("ARCADE_DATABASE_URL")
                .map_or_else(|| normalize_sqlite_url("arcade.sqlite3".into()), normalize_sqlite_url),
            learner: LearnerId::new(1),
            domain: Domain::Arithmetic,
            questions: 10,
            difficulty: Difficulty::Easy,
            age_group: AgeGroup::default(),
            seed: None,
            accuracy: 0.75,
        };
        if let Some(raw) = env_var("ARCADE_LEARNER") {
            config.learner = LearnerId::new(parse_number("ARCADE_LEARNER", raw)?);
        }
        if let Some(raw) = env_var("ARCADE_DOMAIN") {
            config.domain = raw.parse()?;
        }
        if let Some(raw) = env_var("ARCADE_QUESTIONS") {
            config.questions = parse_number("ARCADE_QUESTIONS", raw)?;
        }
        if let Some(raw) = env_var("ARCADE_DIFFICULTY") {
            config.difficulty = raw.parse()?;
        }
        if let Some(raw) = env_var("ARCADE_SEED") {
            config.seed = Some(parse_number("ARCADE_SEED", raw)?);
        }
        Ok(config)
    }

    fn apply_args(mut self, args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    self.db_url = normalize_sqlite_url(value);
                }
                "--learner" => {
                    let value = require_value(args, "--learner")?;
                    self.learner = LearnerId::new(parse_number("--learner", value)?);
                }
                "--domain" => self.domain = require_value(args, "--domain")?.parse()?,
                "--questions" => {
                    self.questions = parse_number("--questions", require_value(args, "--questions")?)?;
                }
                "--difficulty" => {
                    self.difficulty = require_value(args, "--difficulty")?.parse()?;
                }
                "--age" => self.age_group = require_value(args, "--age")?.parse()?,
                "--seed" => {
                    self.seed = Some(parse_number("--seed", require_value(args, "--seed")?)?);
                }
                "--accuracy" => {
                    let raw = require_value(args, "--accuracy")?;
                    let value: f64 = parse_number("--accuracy", raw.clone())?;
                    if !(0.0..=1.0).contains(&value) {
                        return Err(ArgsError::InvalidNumber {
                            flag: "--accuracy",
                            raw,
                        });
                    }
                    self.accuracy = value;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }
        Ok(self)
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
    let path = Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), AppError> {
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

    let path = Path::new(path);
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

/// Stand-in for a child at the keyboard: right with probability `accuracy`.
struct SimulatedLearner {
    rng: StdRng,
    accuracy: f64,
}

impl SimulatedLearner {
    fn answer(&mut self, problem: &Problem) -> (Answer, u64) {
        let expected = u64::from(problem.expected_answer_ms.unwrap_or(8_000));
        let time_taken = self.rng.random_range(expected / 3..=expected * 3 / 2);
        let answer = if self.rng.random_bool(self.accuracy) {
            problem.correct_answer.clone()
        } else {
            problem
                .distractors
                .first()
                .cloned()
                .unwrap_or_else(|| Answer::text("?"))
        };
        (answer, time_taken)
    }
}

async fn play(config: &AppConfig, storage: &Storage) -> Result<(), AppError> {
    let learners = LearnerService::from_storage(Clock::default(), storage);
    if learners.pending_writes() > 0 {
        learners.flush_pending().await?;
    }

    let settings = EngineSettings::default().with_age_group(config.age_group);
    let mut engine = learners
        .open_engine(config.learner, generator_for(config.domain), settings)
        .await?
        .with_feedback(PlainFeedback);
    if let Some(seed) = config.seed {
        engine = engine.with_seed(seed);
    }
    engine.on_event(|event| tracing::trace!(?event, "session event"));

    let mut learner = SimulatedLearner {
        rng: config
            .seed
            .map_or_else(StdRng::from_os_rng, |s| StdRng::seed_from_u64(s ^ 0x5eed)),
        accuracy: config.accuracy,
    };

    let mut problem = engine.start(SessionConfig::new(config.questions, config.difficulty))?;
    loop {
        let (answer, time_taken) = learner.answer(&problem);
        let outcome = engine.submit_answer(problem.id, &answer, time_taken)?;
        println!(
            "[{:>11}] {:<60} -> {:<8} {} {}",
            problem.difficulty.key(),
            problem.prompt,
            answer.to_string(),
            if outcome.correct { "✓" } else { "✗" },
            outcome.feedback.unwrap_or_default(),
        );

        match engine.next_problem()? {
            NextStep::Problem(next) => problem = next,
            NextStep::Complete(_) => break,
        }
    }

    let finished = learners.finish(config.learner, &mut engine).await?;
    let result = &finished.result;
    println!();
    println!(
        "{} session: {}/{} correct ({:.0}%), longest streak {}, finished at {}",
        result.domain(),
        result.correct_count(),
        result.questions_asked(),
        result.accuracy() * 100.0,
        result.longest_streak(),
        result.final_difficulty(),
    );
    for mastery in result.mastery() {
        println!(
            "  {:<36} level {}  ({}/{})",
            mastery.skill_key().as_str(),
            mastery.level(),
            mastery.successes(),
            mastery.attempts()
        );
    }
    if !finished.persisted {
        eprintln!("warning: results could not be saved; they will be retried next run");
    }
    Ok(())
}

async fn history(config: &AppConfig, storage: &Storage) -> Result<(), AppError> {
    let rows = storage.results.list_results(config.learner, 20).await?;
    if rows.is_empty() {
        println!("no sessions recorded for learner {}", config.learner);
    }
    for row in rows {
        let r = &row.result;
        println!(
            "#{:<4} {} {:<10} {:>2}/{:<2} streak {:<2} ended at {}",
            row.id,
            r.completed_at().format("%Y-%m-%d %H:%M"),
            r.domain(),
            r.correct_count(),
            r.questions_asked(),
            r.longest_streak(),
            r.final_difficulty(),
        );
    }
    Ok(())
}

async fn run() -> Result<(), AppError> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None => Command::Play,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Play,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            print_usage();
            ArgsError::UnknownArg(first.to_string())
        })?,
    };
    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let config = AppConfig::from_env()?.apply_args(&mut argv.into_iter())?;

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&config.db_url)?;
    let storage = Storage::sqlite(&config.db_url).await?;
    info!(db = %config.db_url, learner = %config.learner, ?cmd, "storage ready");

    match cmd {
        Command::Play => play(&config, &storage).await,
        Command::History => history(&config, &storage).await,
    }
}

#[tokio::main]
async fn main() {
    logging::init_tracing("info");
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
