mod middleware;
mod public;
mod webhook;

pub use middleware::RequestContext;
pub use public::{HttpState, build_router};
pub use webhook::WebhookState;

use axum::extract::FromRef;

#[derive(Clone)]
pub struct RouterState {
    pub http: HttpState,
    pub webhook: WebhookState,
}

impl FromRef<RouterState> for HttpState {
    fn from_ref(state: &RouterState) -> Self {
        state.http.clone()
    }
}

impl FromRef<RouterState> for WebhookState {
    fn from_ref(state: &RouterState) -> Self {
        state.webhook.clone()
    }
}
