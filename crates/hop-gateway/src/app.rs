use axum::routing::{get, post, put};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::{
    create_link_handler, delete_link_handler, health_handler, link_stats_handler,
    redirect_handler, search_links_handler, update_link_handler,
};
use crate::state::AppState;

pub struct App {}

impl App {
    pub fn router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .nest(
                "/links",
                Router::new()
                    .route("/shorten", post(create_link_handler))
                    .route("/search", get(search_links_handler))
                    .route("/{code}/stats", get(link_stats_handler))
                    .route(
                        "/{code}",
                        put(update_link_handler).delete(delete_link_handler),
                    ),
            )
            .route("/{code}", get(redirect_handler))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}
