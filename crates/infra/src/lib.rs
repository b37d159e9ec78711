mod config;
mod repos;
mod services;
mod system;

pub use config::{Config, DispatcherConfig, EmailProviderConfig, TwilioConfig};
pub use repos::{IReminderRepo, InMemoryReminderRepo, IUserRepo, Repos};
pub use services::*;
use sqlx::migrate::MigrateError;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
pub use system::{FixedSys, ISys, RealSys};
use tracing::warn;

#[derive(Clone)]
pub struct Context {
    pub repos: Repos,
    pub config: Config,
    pub sys: Arc<dyn ISys>,
    pub dispatcher: Arc<dyn IDispatcher>,
    pub messengers: Messengers,
}

struct ContextParams {
    pub postgres_connection_string: String,
}

impl Context {
    async fn create(params: ContextParams) -> Self {
        let repos = Repos::create_postgres(&params.postgres_connection_string)
            .await
            .expect("Postgres credentials must be set and valid");
        let config = Config::new();
        let dispatcher = create_dispatcher(&config);
        let messengers = create_messengers(&config);
        Self {
            repos,
            config,
            sys: Arc::new(RealSys {}),
            dispatcher,
            messengers,
        }
    }

    /// Context with every collaborator replaced by its inmemory double.
    /// Used by tests and local development without external services.
    pub fn create_inmemory() -> Self {
        Self {
            repos: Repos::create_inmemory(),
            config: Config::new(),
            sys: Arc::new(RealSys {}),
            dispatcher: Arc::new(InMemoryDispatcher::new()),
            messengers: Messengers::create_inmemory(),
        }
    }
}

fn create_dispatcher(config: &Config) -> Arc<dyn IDispatcher> {
    match &config.dispatcher {
        Some(dispatcher_config) => Arc::new(HttpDispatcher::new(dispatcher_config)),
        None => {
            warn!(
                "DISPATCHER_BASE_URL is not configured. Triggers will be kept in process \
                 and lost on restart."
            );
            Arc::new(InMemoryDispatcher::new())
        }
    }
}

fn create_messengers(config: &Config) -> Messengers {
    let email: Arc<dyn IMessenger> = match &config.email {
        Some(email_config) => Arc::new(HttpEmailMessenger::new(email_config)),
        None => {
            warn!("Email provider is not configured. Outbound email will only be logged.");
            Arc::new(InMemoryMessenger::new())
        }
    };
    let (sms, voice): (Arc<dyn IMessenger>, Arc<dyn IMessenger>) = match &config.twilio {
        Some(twilio_config) => (
            Arc::new(TwilioSmsMessenger::new(twilio_config)),
            Arc::new(TwilioVoiceMessenger::new(twilio_config)),
        ),
        None => {
            warn!("Twilio is not configured. Outbound SMS/voice will only be logged.");
            (
                Arc::new(InMemoryMessenger::new()),
                Arc::new(InMemoryMessenger::new()),
            )
        }
    };
    Messengers { email, sms, voice }
}

/// Will setup the infrastructure context given the environment
pub async fn setup_context() -> Context {
    Context::create(ContextParams {
        postgres_connection_string: get_psql_connection_string(),
    })
    .await
}

fn get_psql_connection_string() -> String {
    const PSQL_CONNECTION_STRING: &str = "DATABASE_URL";

    std::env::var(PSQL_CONNECTION_STRING)
        .unwrap_or_else(|_| panic!("{} env var to be present.", PSQL_CONNECTION_STRING))
}

pub async fn run_migration() -> Result<(), MigrateError> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&get_psql_connection_string())
        .await
        .expect("TO CONNECT TO POSTGRES");

    sqlx::migrate!("../../migrations").run(&pool).await
}
