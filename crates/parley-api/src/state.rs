//! Application state wiring all services together.
//!
//! Services are generic over repository and credential traits; AppState
//! pins them to the concrete infra implementations.

use std::sync::Arc;

use parley_core::auth::service::AuthService;
use parley_core::chat::context::ContextBuilder;
use parley_core::chat::relay::DEFAULT_RELAY_CAPACITY;
use parley_core::chat::service::ChatService;
use parley_core::chat::turn::{TurnOrchestrator, TurnSettings};
use parley_core::llm::box_provider::BoxLlmProvider;
use parley_core::search::backend::BoxSearchBackend;
use parley_core::search::gate::{GateSettings, RetrievalGate};
use parley_infra::auth::{Argon2PasswordHasher, JwtTokenCodec};
use parley_infra::llm::create_provider;
use parley_infra::search::create_search_backend;
use parley_infra::sqlite::chat::SqliteChatRepository;
use parley_infra::sqlite::pool::{DatabasePool, default_database_url};
use parley_infra::sqlite::user::SqliteUserRepository;
use parley_types::config::AppConfig;
use secrecy::SecretString;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Concrete type aliases for the service generics pinned to infra implementations.
pub type ConcreteChatService = ChatService<SqliteChatRepository>;

pub type ConcreteAuthService = AuthService<
    SqliteUserRepository,
    SqliteChatRepository,
    Argon2PasswordHasher,
    JwtTokenCodec,
>;

pub type ConcreteTurnOrchestrator = TurnOrchestrator<SqliteChatRepository>;

/// Secrets supplied at startup from flags or the environment.
#[derive(Default)]
pub struct Secrets {
    pub gemini_api_key: Option<SecretString>,
    pub jwt_secret: Option<SecretString>,
}

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<ConcreteAuthService>,
    pub chat_service: Arc<ConcreteChatService>,
    pub turns: Arc<ConcreteTurnOrchestrator>,
    /// Cancelled on shutdown; every running turn watches a child token.
    pub shutdown: CancellationToken,
    /// Running turn tasks, drained before the process exits.
    pub tasks: TaskTracker,
    pub relay_capacity: usize,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Connect to the database and build the backends from configuration.
    pub async fn init(
        config: &AppConfig,
        secrets: Secrets,
        shutdown: CancellationToken,
    ) -> anyhow::Result<Self> {
        let db_url = config
            .database
            .url
            .clone()
            .unwrap_or_else(default_database_url);
        let db_pool = DatabasePool::new(&db_url).await?;
        tracing::info!(url = %db_url, "Database ready");

        let provider = create_provider(&config.llm, secrets.gemini_api_key)?;
        let search = create_search_backend(&config.search)?;

        let ttl = config.auth.token_ttl();
        let tokens = match secrets.jwt_secret {
            Some(secret) => JwtTokenCodec::new(&secret, ttl),
            None => {
                tracing::warn!("PARLEY_JWT_SECRET not set; tokens will not survive a restart");
                JwtTokenCodec::ephemeral(ttl)
            }
        };

        Ok(Self::assemble(config, db_pool, provider, search, tokens, shutdown))
    }

    /// Wire services from already-built backends.
    pub fn assemble(
        config: &AppConfig,
        db_pool: DatabasePool,
        provider: BoxLlmProvider,
        search: Option<BoxSearchBackend>,
        tokens: JwtTokenCodec,
        shutdown: CancellationToken,
    ) -> Self {
        let store_timeout = config.turn.store_timeout();
        let provider = Arc::new(provider);

        let auth_service = AuthService::new(
            SqliteUserRepository::new(db_pool.clone()),
            SqliteChatRepository::new(db_pool.clone()),
            Argon2PasswordHasher::new(),
            tokens,
            config.auth.min_password_len,
            store_timeout,
        );

        let chat_service = ChatService::new(SqliteChatRepository::new(db_pool.clone()), store_timeout);

        let gate = RetrievalGate::new(
            provider.clone(),
            search,
            GateSettings {
                router_model: config.llm.router_model.clone(),
                classify_timeout: config.turn.classify_timeout(),
                search_timeout: config.search.timeout(),
                max_results: config.search.max_results,
                max_chars: config.search.max_chars,
            },
        );

        let turns = TurnOrchestrator::new(
            SqliteChatRepository::new(db_pool.clone()),
            provider,
            gate,
            ContextBuilder::new(config.turn.history_window),
            TurnSettings {
                model: config.llm.model.clone(),
                max_tokens: config.llm.max_output_tokens,
                temperature: config.llm.temperature,
                generation_timeout: config.turn.generation_timeout(),
                store_timeout,
            },
        );

        Self {
            auth_service: Arc::new(auth_service),
            chat_service: Arc::new(chat_service),
            turns: Arc::new(turns),
            shutdown,
            tasks: TaskTracker::new(),
            relay_capacity: DEFAULT_RELAY_CAPACITY,
            db_pool,
        }
    }
}
