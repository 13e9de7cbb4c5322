use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use docscan::api;
use docscan::cli::process_file;
use docscan::models::{self, AppConfig};
use docscan::server;
use docscan::services;
use scan_imaging::FilterKind;

#[derive(Parser)]
#[command(name = "docscan")]
#[command(about = "Docscan - document scan unwarp/filter job server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server and the reminder scheduler
    Serve,
    /// Run one job on local files
    Process {
        /// Input image (JPEG or PNG)
        #[arg(short, long)]
        input: PathBuf,

        /// Output image; a .png or .jpg extension picks the format
        #[arg(short, long)]
        output: PathBuf,

        /// Filter to apply: grayscale, blackAndWhite, enhanced or document
        #[arg(short, long, conflicts_with = "corners", required_unless_present = "corners")]
        filter: Option<String>,

        /// Page corners as "dx,dy;dx,dy;dx,dy;dx,dy" (top-left, top-right,
        /// bottom-right, bottom-left), fractions of the image size
        #[arg(short, long)]
        corners: Option<String>,
    },
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Docscan API",
        description = "Document scan unwarp/filter jobs and push notifications",
        version = "0.1.0",
        license(name = "MIT")
    ),
    paths(
        api::handle_submit_job,
        api::handle_cancel_job,
        api::handle_publish,
        api::handle_put_preferences,
        api::handle_create_reminder,
        api::handle_run_reminders,
    ),
    components(schemas(
        models::JobRequest,
        models::JobResponse,
        models::JobStatus,
        models::PerspectivePayload,
        models::FilterPayload,
        models::WireCorner,
        models::ImageSize,
        models::Notification,
        models::NotificationPreferences,
        models::Reminder,
        models::Frequency,
        api::CancelResponse,
        api::PublishResponse,
        api::ReminderCreated,
        services::DispatchOutcome,
        services::SkipReason,
        services::ReminderRunReport,
    )),
    tags(
        (name = "Jobs", description = "Perspective correction and filter jobs"),
        (name = "Notifications", description = "Notification publishing and preferences"),
        (name = "Reminders", description = "Scheduled reminders")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Process {
            input,
            output,
            filter,
            corners,
        }) => run_process_command(&input, &output, filter.as_deref(), corners.as_deref()).await,
        Some(Commands::Serve) => run_server().await,
        None => {
            run_status_command();
            Ok(())
        }
    }
}

/// Run one job on local files (no server needed)
async fn run_process_command(
    input: &Path,
    output: &Path,
    filter: Option<&str>,
    corners: Option<&str>,
) -> anyhow::Result<()> {
    // Minimal logging for CLI
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docscan=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    let config = AppConfig::from_env();
    let written = process_file(&config.jobs, input, output, filter, corners).await?;

    println!("Wrote {} ({written} bytes)", output.display());
    Ok(())
}

/// Run the HTTP server
async fn run_server() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docscan=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();
    let bind_addr = config.server.bind_addr.clone();
    let reminders_enabled = config.reminders.enabled;

    tracing::info!(
        max_concurrent = config.jobs.max_concurrent,
        output_format = ?config.jobs.output_format,
        jpeg_quality = config.jobs.jpeg_quality,
        reminders = reminders_enabled,
        "Configuration loaded"
    );

    // Create application state using shared server module
    let state = server::create_app_state(config);

    if reminders_enabled {
        tokio::spawn(state.scheduler.clone().run());
    } else {
        tracing::info!("Reminder scheduler disabled");
    }

    // Build router: start with shared API routes, add production-only routes
    let app = server::build_router(state)
        // OpenAPI documentation (production only)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "Docscan server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Print version, environment and effective configuration
fn run_status_command() {
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    let bind_addr = std::env::var("BIND_ADDR").ok();
    let config_file = std::env::var("CONFIG_FILE").ok();

    println!("Docscan v{VERSION}");
    println!("Document scan unwarp/filter job server\n");

    println!("Environment Variables:");
    println!(
        "  BIND_ADDR   = {}",
        bind_addr.as_deref().unwrap_or("(not set)")
    );
    println!(
        "  CONFIG_FILE = {}",
        config_file
            .as_deref()
            .unwrap_or("(not set, using config.yaml if present)")
    );

    let path = models::config::config_path();
    let config = if path.exists() {
        AppConfig::load(&path)
    } else {
        AppConfig::default()
    };

    println!("\nConfiguration:");
    println!(
        "  source         = {}",
        if path.exists() {
            path.display().to_string()
        } else {
            "defaults".to_string()
        }
    );
    println!(
        "  bind_addr      = {}",
        bind_addr.as_deref().unwrap_or(&config.server.bind_addr)
    );
    println!("  max_concurrent = {}", config.jobs.max_concurrent);
    println!("  output_format  = {:?}", config.jobs.output_format);
    println!("  jpeg_quality   = {}", config.jobs.jpeg_quality);
    println!("  reminders      = {}", config.reminders.enabled);

    println!("\nFilters:");
    for kind in FilterKind::ALL {
        println!("  {kind}");
    }

    println!("\nUsage:");
    println!("  docscan serve                                   Start the server");
    println!("  docscan process -i IN -o OUT --filter NAME      Filter one image");
    println!("  docscan process -i IN -o OUT --corners QUAD     Unwarp one image");
}
