use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, Query, State},
    http::{HeaderValue, StatusCode, Uri, header::CACHE_CONTROL},
    middleware,
    response::Response,
    routing::{get, post},
};
use serde::Deserialize;

use crate::{
    application::{
        content::ContentService,
        render::RenderService,
        repos::LISTING_LIMIT,
    },
    cache::{CacheState, response_cache_layer},
    config::SiteSettings,
    domain::{media::MediaResolver, types::ResourceKind},
    presentation::views::{
        BlogListContext, BlogListTemplate, LayoutChrome, LayoutContext, PageTemplate, PageView,
        PostDetailContext, PostTemplate, document_title, render_not_found_response,
        render_template_response,
    },
};

use super::{
    RouterState,
    middleware::{log_responses, set_request_context},
    webhook::revalidate,
};

const PAGE_NOT_FOUND: &str = "Page Not Found";
const POST_NOT_FOUND: &str = "Blog Post Not Found";

#[derive(Clone)]
pub struct HttpState {
    pub content: ContentService,
    pub renderer: Arc<dyn RenderService>,
    pub media: MediaResolver,
    pub site: Arc<SiteSettings>,
    pub cache: Option<CacheState>,
}

impl HttpState {
    fn chrome(&self, path: &str) -> LayoutChrome {
        LayoutChrome::new(&self.site, path)
    }

    fn page_size(&self) -> usize {
        self.site.blog_page_size.get() as usize
    }
}

pub fn build_router(state: RouterState) -> Router {
    let cached_routes = Router::new()
        .route("/", get(home))
        .route("/blog", get(blog_index))
        .route("/blog/{slug}", get(blog_detail))
        .route("/{slug}", get(page_detail));

    let cached_routes = if let Some(cache_state) = state.http.cache.clone() {
        cached_routes.layer(middleware::from_fn_with_state(
            cache_state,
            response_cache_layer,
        ))
    } else {
        cached_routes
    };

    let uncached_routes = Router::new()
        .route("/_health", get(health))
        .route("/api/revalidate", post(revalidate));

    cached_routes
        .merge(uncached_routes)
        .fallback(not_found)
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ShowQuery {
    show: Option<String>,
}

async fn home(State(state): State<HttpState>) -> Response {
    let slug = state.site.home_slug.clone();
    render_page(&state, &slug, "/").await
}

async fn page_detail(State(state): State<HttpState>, Path(slug): Path<String>) -> Response {
    let path = ResourceKind::Page.item_path(&slug);
    render_page(&state, &slug, &path).await
}

async fn render_page(state: &HttpState, slug: &str, path: &str) -> Response {
    let chrome = state.chrome(path);
    match state.content.get_page_by_slug(slug).await {
        Some(document) => {
            let title = document_title(&document, ResourceKind::Page);
            let chrome = chrome
                .with_title(&title)
                .with_description(document.excerpt.as_deref());
            let view = LayoutContext::new(
                chrome,
                PageView::from_document(&document, state.renderer.as_ref()),
            );
            render_template_response(PageTemplate { view }, StatusCode::OK)
        }
        None => render_not_found_response(chrome, PAGE_NOT_FOUND),
    }
}

async fn blog_index(State(state): State<HttpState>, Query(query): Query<ShowQuery>) -> Response {
    let step = state.page_size();
    let show = parse_show(query.show.as_deref(), step);
    let chrome = state.chrome(ResourceKind::BlogPost.index_path()).with_title("Blog");

    match state.content.fetch_all(ResourceKind::BlogPost).await {
        Ok(documents) => {
            let content = BlogListContext::new(&documents, show, step, &state.media);
            let view = LayoutContext::new(chrome, content);
            render_template_response(BlogListTemplate { view }, StatusCode::OK)
        }
        Err(_) => {
            // Already logged and counted by the content service.
            let view = LayoutContext::new(chrome, BlogListContext::unavailable());
            let mut response = render_template_response(BlogListTemplate { view }, StatusCode::OK);
            set_no_store(&mut response);
            response
        }
    }
}

async fn blog_detail(State(state): State<HttpState>, Path(slug): Path<String>) -> Response {
    let chrome = state.chrome(&ResourceKind::BlogPost.item_path(&slug));
    match state.content.get_blog_by_slug(&slug).await {
        Some(document) => {
            let content =
                PostDetailContext::from_document(&document, state.renderer.as_ref(), &state.media);
            let chrome = chrome
                .with_title(&content.title)
                .with_description(document.excerpt.as_deref());
            let view = LayoutContext::new(chrome, content);
            render_template_response(PostTemplate { view }, StatusCode::OK)
        }
        None => render_not_found_response(chrome, POST_NOT_FOUND),
    }
}

async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn not_found(State(state): State<HttpState>, uri: Uri) -> Response {
    render_not_found_response(state.chrome(uri.path()), PAGE_NOT_FOUND)
}

/// Number of posts to reveal: at least one page, at most a full listing.
fn parse_show(raw: Option<&str>, step: usize) -> usize {
    raw.and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(step)
        .clamp(step.min(LISTING_LIMIT), LISTING_LIMIT)
}

fn set_no_store(response: &mut Response) {
    let value = HeaderValue::from_static("no-store");
    response.headers_mut().insert(CACHE_CONTROL, value);
}

#[cfg(test)]
mod tests {
    use super::parse_show;

    #[test]
    fn show_defaults_to_one_page() {
        assert_eq!(parse_show(None, 12), 12);
        assert_eq!(parse_show(Some("abc"), 12), 12);
        assert_eq!(parse_show(Some("-5"), 12), 12);
    }

    #[test]
    fn show_is_clamped() {
        assert_eq!(parse_show(Some("3"), 12), 12);
        assert_eq!(parse_show(Some("24"), 12), 24);
        assert_eq!(parse_show(Some("5000"), 12), 100);
    }
}
