use crate::application::error::{ErrorReport, HttpError};
use crate::application::render::{RenderService, RichTextView};
use crate::config::SiteSettings;
use crate::domain::{
    entities::ContentDocument,
    media::{MediaResolver, ResolvedMedia},
    types::ResourceKind,
};
use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use time::{OffsetDateTime, format_description::FormatItem, macros::format_description};

pub const UNTITLED_PAGE: &str = "Untitled Page";
pub const UNTITLED_BLOG_POST: &str = "Untitled Blog Post";

/// `05 Mar 2024`
const DISPLAY_DATE: &[FormatItem<'static>] =
    format_description!("[day padding:zero] [month repr:short] [year]");

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

/// 404 page. `title` names what was missing, e.g. "Blog Post Not Found".
pub fn render_not_found_response(chrome: LayoutChrome, title: &str) -> Response {
    let content = ErrorPageView::not_found(title);
    let view = LayoutContext::new(chrome, content);
    let mut response = render_template_response(ErrorTemplate { view }, StatusCode::NOT_FOUND);
    ErrorReport::from_message(
        "presentation::views::render_not_found_response",
        StatusCode::NOT_FOUND,
        "Resource not found",
    )
    .attach(&mut response);
    response
}

#[derive(Clone)]
pub struct BrandView {
    pub title: String,
    pub href: String,
}

#[derive(Clone)]
pub struct NavigationLinkView {
    pub label: String,
    pub href: String,
    pub is_active: bool,
}

#[derive(Clone)]
pub struct NavigationView {
    pub entries: Vec<NavigationLinkView>,
}

#[derive(Clone)]
pub struct FooterView {
    pub copy: String,
}

#[derive(Clone)]
pub struct PageMetaView {
    pub title: String,
    pub description: String,
}

/// Site frame shared by every public page.
#[derive(Clone)]
pub struct LayoutChrome {
    pub brand: BrandView,
    pub navigation: NavigationView,
    pub footer: FooterView,
    pub meta: PageMetaView,
}

impl LayoutChrome {
    pub fn new(site: &SiteSettings, path: &str) -> Self {
        let links = [("Home", "/"), ("Blog", "/blog")];
        let entries = links
            .into_iter()
            .map(|(label, href)| NavigationLinkView {
                label: label.to_string(),
                href: href.to_string(),
                is_active: is_active_link(href, path),
            })
            .collect();

        Self {
            brand: BrandView {
                title: site.name.clone(),
                href: "/".to_string(),
            },
            navigation: NavigationView { entries },
            footer: FooterView {
                copy: site.name.clone(),
            },
            meta: PageMetaView {
                title: site.name.clone(),
                description: String::new(),
            },
        }
    }

    /// Prefix the document title to the site name in `<title>`.
    pub fn with_title(self, title: &str) -> Self {
        let meta = PageMetaView {
            title: format!("{title} | {}", self.brand.title),
            ..self.meta
        };
        Self { meta, ..self }
    }

    pub fn with_description(self, description: Option<&str>) -> Self {
        let meta = PageMetaView {
            description: description.unwrap_or_default().to_string(),
            ..self.meta
        };
        Self { meta, ..self }
    }
}

fn is_active_link(href: &str, path: &str) -> bool {
    match href {
        "/" => path == "/",
        _ => path == href || path.starts_with(&format!("{href}/")),
    }
}

#[derive(Clone)]
pub struct LayoutContext<T> {
    pub brand: BrandView,
    pub navigation: NavigationView,
    pub footer: FooterView,
    pub meta: PageMetaView,
    pub content: T,
}

impl<T> LayoutContext<T> {
    pub fn new(chrome: LayoutChrome, content: T) -> Self {
        Self {
            brand: chrome.brand,
            navigation: chrome.navigation,
            footer: chrome.footer,
            meta: chrome.meta,
            content,
        }
    }
}

pub struct PageView {
    pub title: String,
    pub content_html: String,
    pub contains_code: bool,
}

impl PageView {
    pub fn from_document(document: &ContentDocument, renderer: &dyn RenderService) -> Self {
        let body = RichTextView::load(renderer, document.content.as_ref());
        Self {
            title: document_title(document, ResourceKind::Page),
            content_html: body.html().to_string(),
            contains_code: body.contains_code(),
        }
    }
}

#[derive(Template)]
#[template(path = "page.html")]
pub struct PageTemplate {
    pub view: LayoutContext<PageView>,
}

#[derive(Clone)]
pub struct PostCard {
    pub href: String,
    pub title: String,
    pub excerpt: Option<String>,
    pub image: Option<ResolvedMedia>,
    pub published: Option<String>,
}

impl PostCard {
    pub fn from_document(document: &ContentDocument, media: &MediaResolver) -> Self {
        let title = document_title(document, ResourceKind::BlogPost);
        Self {
            href: ResourceKind::BlogPost.item_path(&document.slug),
            image: document
                .image
                .as_ref()
                .map(|image| media.resolve(image, &title)),
            excerpt: document
                .excerpt
                .as_deref()
                .map(str::trim)
                .filter(|excerpt| !excerpt.is_empty())
                .map(str::to_string),
            published: document.listing_date().and_then(format_display_date),
            title,
        }
    }
}

/// Blog index. `cards` is already cut to the revealed count.
pub struct BlogListContext {
    pub cards: Vec<PostCard>,
    pub has_results: bool,
    /// `?show=` value of the "Load more" link, when more posts exist.
    pub next_show: Option<usize>,
    pub load_failed: bool,
}

impl BlogListContext {
    pub fn new(
        documents: &[ContentDocument],
        show: usize,
        step: usize,
        media: &MediaResolver,
    ) -> Self {
        let cards = documents
            .iter()
            .take(show)
            .map(|document| PostCard::from_document(document, media))
            .collect();
        Self {
            cards,
            has_results: !documents.is_empty(),
            next_show: (documents.len() > show).then(|| show + step),
            load_failed: false,
        }
    }

    /// Listing shown when the content API could not be reached.
    pub fn unavailable() -> Self {
        Self {
            cards: Vec::new(),
            has_results: false,
            next_show: None,
            load_failed: true,
        }
    }
}

#[derive(Template)]
#[template(path = "blog_list.html")]
pub struct BlogListTemplate {
    pub view: LayoutContext<BlogListContext>,
}

pub struct BreadcrumbView {
    pub label: String,
    pub href: Option<String>,
}

pub struct PostDetailContext {
    pub title: String,
    pub breadcrumbs: Vec<BreadcrumbView>,
    pub image: Option<ResolvedMedia>,
    pub posted: Option<String>,
    pub content_html: String,
    pub contains_code: bool,
}

impl PostDetailContext {
    pub fn from_document(
        document: &ContentDocument,
        renderer: &dyn RenderService,
        media: &MediaResolver,
    ) -> Self {
        let title = document_title(document, ResourceKind::BlogPost);
        let body = RichTextView::load(renderer, document.content.as_ref());
        Self {
            breadcrumbs: vec![
                BreadcrumbView {
                    label: "Home".to_string(),
                    href: Some("/".to_string()),
                },
                BreadcrumbView {
                    label: "Blog".to_string(),
                    href: Some(ResourceKind::BlogPost.index_path().to_string()),
                },
                BreadcrumbView {
                    label: title.clone(),
                    href: None,
                },
            ],
            image: document
                .image
                .as_ref()
                .map(|image| media.resolve(image, &title)),
            posted: document
                .created_at
                .or(document.published_at)
                .and_then(format_display_date),
            content_html: body.html().to_string(),
            contains_code: body.contains_code(),
            title,
        }
    }
}

#[derive(Template)]
#[template(path = "blog_detail.html")]
pub struct PostTemplate {
    pub view: LayoutContext<PostDetailContext>,
}

pub struct ErrorPageView {
    pub title: String,
    pub message: String,
    pub primary_action: Option<ErrorAction>,
}

impl ErrorPageView {
    pub fn not_found(title: &str) -> Self {
        Self {
            title: title.to_string(),
            message: "The content you requested does not exist or is no longer published."
                .to_string(),
            primary_action: Some(ErrorAction::home()),
        }
    }
}

pub struct ErrorAction {
    pub href: String,
    pub label: String,
}

impl ErrorAction {
    pub fn home() -> Self {
        Self {
            href: "/".to_string(),
            label: "Back to home".to_string(),
        }
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub view: LayoutContext<ErrorPageView>,
}

/// Display title with the kind's fallback for untitled documents.
pub fn document_title(document: &ContentDocument, kind: ResourceKind) -> String {
    let fallback = match kind {
        ResourceKind::Page => UNTITLED_PAGE,
        ResourceKind::BlogPost => UNTITLED_BLOG_POST,
    };
    document.display_title().unwrap_or(fallback).to_string()
}

pub fn format_display_date(timestamp: OffsetDateTime) -> Option<String> {
    timestamp.format(DISPLAY_DATE).ok()
}
