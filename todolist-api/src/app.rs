/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use todolist_api::{app::AppState, config::Config};
/// use todolist_shared::store::memory::InMemoryStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(Arc::new(InMemoryStore::new()), config);
/// let app = todolist_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::config::Config;
use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use todolist_shared::{
    auth::{
        jwt::TokenCodec,
        middleware::{deny_if_authenticated, require_identity, AuthGuard},
        password::{Argon2Hasher, CredentialHasher},
    },
    models::{Subtask, Task, TodoList},
    ownership::ResourceService,
    store::Store,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor; every field
/// is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Storage backend
    pub store: Arc<dyn Store>,

    /// Ownership-scoped CRUD over lists, tasks and subtasks
    pub service: ResourceService,

    /// Token verification and issuing
    pub auth: AuthGuard,

    /// Password hashing
    pub hasher: Arc<dyn CredentialHasher>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates state with the production Argon2 parameters
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        Self::with_hasher(store, config, Arc::new(Argon2Hasher::new()))
    }

    /// Creates state with a specific password hasher
    pub fn with_hasher(
        store: Arc<dyn Store>,
        config: Config,
        hasher: Arc<dyn CredentialHasher>,
    ) -> Self {
        let auth = AuthGuard::new(TokenCodec::new(&config.jwt.secret))
            .reject_authenticated(config.auth.reject_authenticated);
        let service = ResourceService::new(store.clone(), config.pagination);

        Self {
            store,
            service,
            auth,
            hasher,
            config: Arc::new(config),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET  /health                                    # public
/// ├── POST /register                                  # anonymous-only
/// ├── POST /login                                     # anonymous-only
/// └── /api/                                           # bearer token required
///     ├── GET|POST        /lists
///     ├── GET|PUT|DELETE  /lists/:list_id
///     ├── GET|POST        /lists/:list_id/tasks
///     ├── GET|PUT|DELETE  /lists/:list_id/tasks/:task_id
///     ├── GET|POST        /lists/:list_id/tasks/:task_id/subtasks
///     └── GET|PUT|DELETE  /lists/:list_id/tasks/:task_id/subtasks/:subtask_id
/// ```
///
/// # Middleware Stack
///
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Identity (`require_identity` on `/api`, `deny_if_authenticated` on
///    `/register` and `/login`)
pub fn build_router(state: AppState) -> Router {
    use crate::routes::{auth, health, resources};

    let health_routes = Router::new().route("/health", get(health::health_check));

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .layer(middleware::from_fn_with_state(
            state.auth.clone(),
            deny_if_authenticated,
        ));

    let api_routes = Router::new()
        .route(
            "/lists",
            get(resources::index::<TodoList>).post(resources::create::<TodoList>),
        )
        .route(
            "/lists/:list_id",
            get(resources::show::<TodoList>)
                .put(resources::update::<TodoList>)
                .delete(resources::destroy::<TodoList>),
        )
        .route(
            "/lists/:list_id/tasks",
            get(resources::index::<Task>).post(resources::create::<Task>),
        )
        .route(
            "/lists/:list_id/tasks/:task_id",
            get(resources::show::<Task>)
                .put(resources::update::<Task>)
                .delete(resources::destroy::<Task>),
        )
        .route(
            "/lists/:list_id/tasks/:task_id/subtasks",
            get(resources::index::<Subtask>).post(resources::create::<Subtask>),
        )
        .route(
            "/lists/:list_id/tasks/:task_id/subtasks/:subtask_id",
            get(resources::show::<Subtask>)
                .put(resources::update::<Subtask>)
                .delete(resources::destroy::<Subtask>),
        )
        .layer(middleware::from_fn_with_state(
            state.auth.clone(),
            require_identity,
        ));

    Router::new()
        .merge(health_routes)
        .merge(auth_routes)
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.cors_permissive() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600))
}
