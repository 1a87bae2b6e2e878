use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dialect_coach::http::ScoreResponse;
use dialect_coach::lessons::{self, LessonCard, LessonGenerator, NatsLessonGenerator};
use dialect_coach::session::{PracticeSession, SessionLedger, SessionRunner, UtterancePipeline};
use dialect_coach::{
    create_router, AppState, AudioBackendFactory, AudioCapture, AudioSource, Config, Dialect,
    Evaluator, NatsClient, NatsSpeechOracle, TranscriptionService,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dialect-coach", version, about = "Thai dialect speaking practice")]
struct Cli {
    /// Config file (extension optional)
    #[arg(long, default_value = "config/dialect-coach")]
    config: String,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the practice session and its control API
    Serve {
        /// Lesson file; overrides `lessons.path`
        #[arg(long)]
        lessons: Option<PathBuf>,

        /// Generate the lesson set for this topic instead of loading one
        #[arg(long)]
        generate: Option<String>,

        /// Number of cards to generate
        #[arg(long, default_value_t = 5)]
        count: usize,

        /// Audio source (`microphone`, `silence`, `file:<path>`); overrides `audio.source`
        #[arg(long)]
        source: Option<String>,
    },

    /// Generate a lesson set and save it as JSON
    Generate {
        #[arg(long)]
        topic: String,

        #[arg(long, default_value_t = 5)]
        count: usize,

        #[arg(long)]
        out: PathBuf,
    },

    /// Score a transcript offline and print the verdict
    Score {
        #[arg(long)]
        text: String,

        #[arg(long, default_value = "central")]
        dialect: String,

        /// Accepted phrase; repeat for more
        #[arg(long = "expect", required = true)]
        expected: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cfg = Config::load(&cli.config)?;
    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Serve {
            lessons,
            generate,
            count,
            source,
        } => serve(cfg, lessons, generate, count, source).await,
        Command::Generate { topic, count, out } => {
            let nats = connect_nats(&cfg).await?;
            let generator = NatsLessonGenerator::new(nats, cfg.nats.generate_subject.clone());
            let cards = generator.generate(&topic, count).await?;
            lessons::save_json(&out, &cards)?;
            info!("Wrote {} lessons to {}", cards.len(), out.display());
            Ok(())
        }
        Command::Score {
            text,
            dialect,
            expected,
        } => {
            let dialect: Dialect = dialect.parse()?;
            let evaluator = Evaluator::new(cfg.normalization_table(), cfg.scoring);
            let text: String = text.chars().filter(|c| !c.is_whitespace()).collect();

            let response = ScoreResponse {
                dialect,
                normalized: evaluator.normalize(&text, dialect),
                verdict: evaluator.evaluate(&text, dialect, &expected),
            };
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
    }
}

async fn connect_nats(cfg: &Config) -> Result<Arc<NatsClient>> {
    let client = NatsClient::connect(
        &cfg.nats.url,
        format!("practice-{}", uuid::Uuid::new_v4()),
        cfg.nats.request_timeout(),
    )
    .await
    .context("Failed to connect to NATS")?;

    Ok(Arc::new(client))
}

/// Generated, loaded or built-in lessons, in that order of preference.
/// Failures fall back to the built-in set.
async fn resolve_lessons(
    cfg: &Config,
    nats: &Arc<NatsClient>,
    path: Option<PathBuf>,
    topic: Option<String>,
    count: usize,
) -> Vec<LessonCard> {
    if let Some(topic) = topic {
        let generator = NatsLessonGenerator::new(Arc::clone(nats), cfg.nats.generate_subject.clone());
        match generator.generate(&topic, count).await {
            Ok(cards) => return cards,
            Err(e) => warn!("Lesson generation failed, using built-in set: {:#}", e),
        }
        return lessons::default_lessons();
    }

    match path.or_else(|| cfg.lessons.path()) {
        Some(path) => lessons::load_json(&path).unwrap_or_else(|e| {
            warn!("Could not load lessons, using built-in set: {:#}", e);
            lessons::default_lessons()
        }),
        None => lessons::default_lessons(),
    }
}

async fn serve(
    cfg: Config,
    lessons_path: Option<PathBuf>,
    topic: Option<String>,
    count: usize,
    source: Option<String>,
) -> Result<()> {
    let nats = connect_nats(&cfg).await?;
    let lessons = resolve_lessons(&cfg, &nats, lessons_path, topic, count).await;

    let source: AudioSource = match source {
        Some(source) => source.parse()?,
        None => cfg.audio.source()?,
    };
    let backend = AudioBackendFactory::create(source, cfg.audio.backend_config())
        .context("Failed to create audio backend")?;
    let capture = AudioCapture::new(backend, cfg.audio.capture_config());

    let evaluator = Arc::new(Evaluator::new(cfg.normalization_table(), cfg.scoring));
    let oracle = NatsSpeechOracle::new(Arc::clone(&nats), cfg.nats.transcribe_subject.clone());
    let pipeline = Arc::new(UtterancePipeline::new(
        TranscriptionService::new(Arc::new(oracle)),
        Arc::clone(&evaluator),
    ));

    let session = PracticeSession::new(capture, pipeline, lessons, cfg.session_config());
    let (runner, handle) = SessionRunner::new(session, SessionLedger::default(), cfg.session.tick_interval());
    let runner_task = runner.spawn();

    let app = create_router(AppState::new(handle, evaluator));
    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Control API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;

    let progress = runner_task.await.context("Session runner panicked")?;
    info!(
        "Final progress: {} XP, streak {}, best {}",
        progress.experience, progress.streak, progress.best_streak
    );

    Ok(())
}
