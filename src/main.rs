use booker_client::booker::{BookerClient, Booking, BookingDates};
use booker_client::{ApiClient, RetryPolicy, Timeouts};
use chrono::{Days, Local};
use clap::{Parser, ValueEnum};
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// booker-sanity - end-to-end sanity check against a Restful-Booker deployment
///
/// Authenticates, creates a booking and reports the result. Every option can also
/// be set through the environment variable shown in `--help`.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Base URL of the target API
    #[arg(long, env = "BASE_URL", value_name = "URL")]
    base_url: String,

    /// Deployment environment
    #[arg(long, env = "APP_ENV", value_enum, default_value_t = AppEnv::Dev)]
    app_env: AppEnv,

    /// Log filter (error, warn, info, debug, trace or a tracing directive)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Username for the booking API
    #[arg(long, env = "BOOKER_USERNAME")]
    username: String,

    /// Password for the booking API
    #[arg(long, env = "BOOKER_PASSWORD", hide_env_values = true)]
    password: String,

    /// Retries after the first attempt for transient failures
    #[arg(long, env = "BOOKER_MAX_RETRIES", default_value_t = 3)]
    max_retries: usize,

    /// Connect timeout in seconds
    #[arg(long, env = "BOOKER_CONNECT_TIMEOUT", default_value_t = 5)]
    connect_timeout: u64,

    /// Read timeout in seconds
    #[arg(long, env = "BOOKER_READ_TIMEOUT", default_value_t = 30)]
    read_timeout: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum AppEnv {
    Dev,
    Test,
    Prod,
}

impl Cli {
    fn build_client(&self) -> booker_client::Result<BookerClient> {
        let api = ApiClient::builder()
            .base_url(&self.base_url)?
            .default_header("Accept", "application/json")?
            .retry_policy(RetryPolicy::default().with_total(self.max_retries))
            .timeouts(Timeouts::new(
                Duration::from_secs(self.connect_timeout),
                Duration::from_secs(self.read_timeout),
            ))
            .build()?;
        Ok(BookerClient::from_api(api))
    }
}

fn sample_booking() -> Booking {
    let today = Local::now().date_naive();
    Booking {
        first_name: "Ivan".to_string(),
        last_name: "Automator".to_string(),
        total_price: 120,
        deposit_paid: true,
        booking_dates: BookingDates {
            checkin: today + Days::new(1),
            checkout: today + Days::new(5),
        },
        additional_needs: Some("Quiet Room".to_string()),
    }
}

fn masked(token: &str) -> String {
    let visible: String = token.chars().take(5).collect();
    format!("{}***", visible)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!(
        env = ?cli.app_env,
        log_level = %cli.log_level,
        target_url = %cli.base_url,
        "Starting sanity check"
    );

    let client = match cli.build_client() {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "Invalid client configuration");
            return ExitCode::FAILURE;
        }
    };

    let token = match client.create_auth_token(&cli.username, &cli.password).await {
        Ok(token) => token,
        Err(e) => {
            tracing::error!(
                error = %e,
                status = ?e.status_code(),
                "Authentication failed, check BOOKER_USERNAME/BOOKER_PASSWORD"
            );
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(token = %masked(&token), "Authentication successful");

    let booking = sample_booking();
    tracing::info!(first_name = %booking.first_name, "Creating booking");

    match client.create_booking(&booking).await {
        Ok(created) => {
            tracing::info!(
                booking_id = created.booking_id,
                first_name = %created.booking.first_name,
                checkin = %created.booking.booking_dates.checkin,
                "Booking created"
            );
        }
        Err(e) => {
            tracing::error!(
                error = %e,
                status = ?e.status_code(),
                payload = ?e.payload(),
                "Booking creation failed"
            );
            return ExitCode::FAILURE;
        }
    }

    client.close();
    tracing::info!("Sanity check completed successfully");
    ExitCode::SUCCESS
}
