use crate::Environment;
use tracing::{debug, info};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Install color-eyre with a project-standard configuration.
///
/// Call this early in main() before any fallible operations. Safe to call
/// multiple times.
///
/// Configuration:
/// - Shows file:line where errors occur
/// - Hides environment variables (they may carry database credentials)
pub fn install_color_eyre() {
    let _ = color_eyre::config::HookBuilder::default()
        .display_location_section(true)
        .display_env_section(false)
        .install();
}

/// Default filter when `RUST_LOG` is not set.
fn default_filter(environment: &Environment) -> EnvFilter {
    if environment.is_production() {
        EnvFilter::new("info,sea_orm=warn,sqlx=warn,tower_http=info")
    } else {
        EnvFilter::new("debug,users_api=trace,domain_users=trace,sqlx=info,hyper=info")
    }
}

/// Initialize tracing with environment-aware configuration and error span capture.
///
/// - **Production** (`APP_ENV=production`):
///   - JSON format, one flattened object per event
///   - Module targets hidden
///   - ErrorLayer for span trace capture
///
/// - **Development** (default):
///   - Pretty-printed format
///   - ErrorLayer for span trace capture
///
/// Environment variables:
/// - `APP_ENV`: Set to "production" for JSON logs (default: "development")
/// - `RUST_LOG`: Override log levels (e.g., "debug", "domain_users=trace")
///
/// Audit events are emitted on the `audit` target; route them with
/// `RUST_LOG=audit=info` or a dedicated sink.
///
/// Safe to call more than once; later calls are ignored (common in tests).
///
/// # Example with instrumentation
///
/// ```ignore
/// use tracing::instrument;
///
/// #[instrument(skip(self), fields(user_id = %id))]
/// async fn find_by_id(&self, id: i64) -> UserResult<Option<UserView>> {
///     query::Entity::find_by_id(id).one(&self.txn).await.map_err(Into::into)
/// }
/// ```
pub fn init_tracing(environment: &Environment) {
    let is_production = environment.is_production();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(environment));

    let result = if is_production {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(false)
                    .flatten_event(true),
            )
            .with(tracing_error::ErrorLayer::default())
            .with(filter)
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_file(false)
                    .with_line_number(false)
                    .pretty(),
            )
            .with(tracing_error::ErrorLayer::default())
            .with(filter)
            .try_init()
    };

    match result {
        Ok(_) => {
            info!(
                environment = environment.as_str(),
                "Tracing initialized with ErrorLayer"
            );
        }
        Err(_) => {
            debug!("Tracing already initialized, skipping re-initialization");
        }
    }
}
