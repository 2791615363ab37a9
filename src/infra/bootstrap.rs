//! Wiring of services, caches and HTTP state from resolved settings.

use std::sync::Arc;

use crate::{
    application::{
        content::ContentService,
        render::{LexicalRenderService, RenderService},
        repos::ContentSource,
        revalidation::RevalidationService,
    },
    cache::{CacheConfig, CacheState, ContentCache, DocumentStore, ResponseStore},
    config::Settings,
    domain::media::MediaResolver,
};

use super::{
    cache::CacheRevalidator,
    error::InfraError,
    http::{HttpState, RouterState, WebhookState},
    payload::PayloadClient,
};

/// Everything `serve` and `warm` need.
pub struct ApplicationContext {
    pub content: ContentService,
    pub documents: Option<Arc<DocumentStore>>,
    pub responses: Option<Arc<ResponseStore>>,
    pub router_state: RouterState,
}

/// Content source talking to the configured content API.
pub fn content_source(settings: &Settings) -> Result<Arc<dyn ContentSource>, InfraError> {
    Ok(Arc::new(PayloadClient::new(&settings.content)?))
}

pub fn build_application_context(
    settings: &Settings,
    source: Arc<dyn ContentSource>,
) -> ApplicationContext {
    let cache_config = CacheConfig::from(&settings.cache);

    let documents = cache_config
        .enable_document_cache
        .then(|| Arc::new(DocumentStore::new(&cache_config)));
    let responses = cache_config
        .enable_response_cache
        .then(|| Arc::new(ResponseStore::new(&cache_config)));

    let document_cache = documents
        .clone()
        .map(|store| store as Arc<dyn ContentCache>);
    let content = ContentService::new(source, document_cache);

    let renderer: Arc<dyn RenderService> =
        Arc::new(LexicalRenderService::new(settings.render.unknown_nodes));

    let revalidator = Arc::new(CacheRevalidator::new(documents.clone(), responses.clone()));
    let revalidation = Arc::new(RevalidationService::new(
        settings.revalidation.secret.as_deref(),
        revalidator,
    ));

    let http = HttpState {
        content: content.clone(),
        renderer,
        media: MediaResolver::new(settings.media.base_url.clone()),
        site: Arc::new(settings.site.clone()),
        cache: responses.clone().map(|responses| CacheState {
            config: cache_config.clone(),
            responses,
        }),
    };

    ApplicationContext {
        content,
        documents,
        responses,
        router_state: RouterState {
            http,
            webhook: WebhookState { revalidation },
        },
    }
}
