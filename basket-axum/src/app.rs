use std::future::Future;

use axum::extract::{DefaultBodyLimit, Request};
use axum::routing::{get, post};
use axum::Router;
use basket_files::FileService;
use tokio::net::{TcpListener, ToSocketAddrs};
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::AppState;

/// Prefix of the file routes
pub const FILE_ROUTES: &str = "/api/v1/file";

/// The HTTP application: a ready router over one [`FileService`].
#[derive(Clone)]
pub struct BasketApp {
    pub state: AppState,
    pub router: Router<()>,
}

impl BasketApp {
    pub fn new(service: FileService) -> Self {
        let state = AppState::new(service);
        Self {
            router: router(state.clone()),
            state,
        }
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests.
    pub async fn listen<A, F>(self, addr: A, shutdown: F) -> anyhow::Result<()>
    where
        A: ToSocketAddrs,
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(addr).await?;
        tracing::info!(addr = %listener.local_addr()?, "http server listening");
        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }
}

/// Build the router with request-id and trace layers.
pub fn router(state: AppState) -> Router<()> {
    let files = Router::new()
        .route(
            "/upload",
            post(handlers::upload_file).layer(DefaultBodyLimit::disable()),
        )
        .route(
            "/{file_id}",
            get(handlers::get_file)
                .patch(handlers::update_file)
                .delete(handlers::delete_file),
        )
        .route("/{file_id}/download", get(handlers::download_file));

    Router::new()
        .route("/health", get(handlers::health))
        .nest(FILE_ROUTES, files)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(|req: &Request| {
                    let request_id = req
                        .headers()
                        .get("x-request-id")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("-");
                    tracing::info_span!(
                        "http",
                        method = %req.method(),
                        uri = %req.uri(),
                        request_id,
                    )
                }))
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
}
