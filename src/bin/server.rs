use std::{
    env::{self},
    fs::OpenOptions,
    net::SocketAddr,
    sync::Arc,
};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    http::{HeaderValue, Method, header},
    middleware,
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{EnvFilter, Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use fiscora::{
    AppState, DemoProvider, IdentityProvider, IdentityProviders, build_router,
    endpoints::{self, format_provider_endpoint},
    graceful_shutdown, logging_middleware,
};

/// The REST API server for Fiscora.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The port to serve the API from.
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// The URL of the web frontend, used for CORS and the redirect after logging in.
    #[arg(long, default_value = "http://localhost:5173")]
    frontend_url: String,

    /// Only send cookies over HTTPS. Use this in production.
    #[arg(long)]
    secure_cookies: bool,

    /// Allow logging in as the demo user without an identity provider.
    #[arg(long)]
    allow_demo_log_in: bool,
}

#[tokio::main]
async fn main() {
    setup_logging();

    let args = Args::parse();

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));

    let secret = env::var("SECRET").expect("The environment variable 'SECRET' must be set");

    let mut providers: Vec<Arc<dyn IdentityProvider>> = Vec::new();
    if args.allow_demo_log_in {
        let callback_url = format!(
            "http://localhost:{}{}",
            args.port,
            format_provider_endpoint(endpoints::AUTH_CALLBACK, DemoProvider::NAME)
        );
        providers.push(Arc::new(DemoProvider::new(&callback_url)));
    }
    let providers = IdentityProviders::new(providers);
    if providers.is_empty() {
        tracing::warn!("No identity providers are registered, nobody will be able to log in.");
    }

    let conn = Connection::open(&args.db_path).expect("Could not open the database.");
    let app_state = AppState::new(conn, &secret, &args.frontend_url, providers)
        .expect("Could not initialise the database.")
        .with_secure_cookies(args.secure_cookies);

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = build_router(app_state)
        .layer(middleware::from_fn(logging_middleware))
        .layer(cors_layer(&args.frontend_url));
    let router = add_tracing_layer(router);

    tracing::info!("HTTP server listening on {}", addr);
    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
        .expect("The server stopped unexpectedly.");
}

fn setup_logging() {
    let stdout_log = tracing_subscriber::fmt::layer().pretty();

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")
        .expect("Could not create log file");

    let debug_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(Arc::new(log_file));

    match EnvFilter::try_from_default_env() {
        Ok(env_filter) => tracing_subscriber::registry()
            .with(stdout_log.and_then(debug_log).with_filter(env_filter))
            .init(),
        Err(_) => tracing_subscriber::registry()
            .with(
                stdout_log
                    .with_filter(filter::LevelFilter::INFO)
                    .and_then(debug_log)
                    .with_filter(filter::LevelFilter::DEBUG),
            )
            .init(),
    }
}

fn cors_layer(frontend_url: &str) -> CorsLayer {
    let origin: HeaderValue = frontend_url
        .parse()
        .expect("The frontend URL is not a valid origin.");

    CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // Errors are logged where they are converted into responses.
        .on_failure(());

    router.layer(tracing_layer)
}
