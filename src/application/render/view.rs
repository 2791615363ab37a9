//! Display state of one rich-text field.

use metrics::counter;
use serde_json::Value;
use tracing::error;

use super::types::{RenderOutput, RenderService};

/// `Uninitialized` renders nothing. A view only becomes `Ready` once the
/// whole tree has been validated and rendered.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RichTextView {
    #[default]
    Uninitialized,
    Ready(RenderOutput),
}

impl RichTextView {
    /// Render `document`. A missing or null document, or one that fails to
    /// render, leaves the view uninitialized.
    pub fn load(renderer: &dyn RenderService, document: Option<&Value>) -> Self {
        let Some(document) = document.filter(|document| !document.is_null()) else {
            return Self::Uninitialized;
        };

        match renderer.render(document) {
            Ok(output) => Self::Ready(output),
            Err(err) => {
                counter!("pressroom_render_failure_total").increment(1);
                error!(
                    target = "application::render",
                    error = %err,
                    "failed to render rich-text document"
                );
                Self::Uninitialized
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// Sanitised HTML, empty while uninitialized.
    pub fn html(&self) -> &str {
        match self {
            Self::Uninitialized => "",
            Self::Ready(output) => &output.html,
        }
    }

    pub fn contains_code(&self) -> bool {
        match self {
            Self::Uninitialized => false,
            Self::Ready(output) => output.contains_code,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::application::render::LexicalRenderService;

    #[test]
    fn missing_document_stays_uninitialized() {
        let renderer = LexicalRenderService::default();
        assert_eq!(RichTextView::load(&renderer, None), RichTextView::Uninitialized);
        assert_eq!(
            RichTextView::load(&renderer, Some(&Value::Null)),
            RichTextView::Uninitialized
        );
        assert_eq!(RichTextView::Uninitialized.html(), "");
    }

    #[test]
    fn invalid_document_stays_uninitialized() {
        let renderer = LexicalRenderService::default();
        let document = json!({"root": {"type": "root", "children": 3}});
        let view = RichTextView::load(&renderer, Some(&document));
        assert!(!view.is_ready());
        assert_eq!(view.html(), "");
    }

    #[test]
    fn valid_document_becomes_ready() {
        let renderer = LexicalRenderService::default();
        let document = json!({"root": {"type": "root", "children": [
            {"type": "code", "children": [{"type": "code-highlight", "text": "let x = 1;"}]}
        ]}});

        let view = RichTextView::load(&renderer, Some(&document));
        assert!(view.is_ready());
        assert!(view.contains_code());
        assert_eq!(view.html(), "<pre><code>let x = 1;</code></pre>");
    }
}
