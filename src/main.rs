use blitzquiz::db::Db;
use blitzquiz::llm::Generator;
use blitzquiz::services::quiz::QuizService;
use blitzquiz::session::SessionStore;
use blitzquiz::AppState;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Postgres connection string.
    #[clap(env)]
    database_url: String,

    /// API key for the question-generation provider.
    #[clap(env)]
    llm_api_key: String,

    /// OpenAI-compatible chat completions base URL.
    #[arg(long, env, default_value = "https://api.cerebras.ai/v1")]
    llm_base_url: String,

    /// Model used for question generation.
    #[arg(long, env, default_value = "llama3.1-70b")]
    llm_model: String,

    /// The address to bind to.
    #[arg(short, long, env, default_value = "127.0.0.1:1414")]
    address: String,

    /// Mark session cookies Secure (set this behind HTTPS).
    #[arg(long, env)]
    secure_cookies: bool,

    /// Render generated questions with answers inline instead of the
    /// interactive answering flow.
    #[arg(long, env)]
    display_only: bool,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "tracing=info,blitzquiz=debug".to_owned());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE)
        .init();

    let args = Args::parse();

    let db = Db::new(&args.database_url).await?;
    let generator = Generator::new(args.llm_base_url, args.llm_api_key, args.llm_model);

    let state = AppState {
        quiz: QuizService::new(generator, db),
        sessions: SessionStore::new(),
        secure_cookies: args.secure_cookies,
        display_only: args.display_only,
    };
    let app = blitzquiz::router(state);

    let listener = tokio::net::TcpListener::bind(&args.address).await?;
    tracing::info!("listening on {}", args.address);
    axum::serve(listener, app).await?;

    Ok(())
}
