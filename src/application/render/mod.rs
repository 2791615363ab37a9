//! Rich-text rendering.
//!
//! The pipeline is pure: it takes a serialized editor tree, validates it,
//! walks it through a [`NodeRegistry`] and sanitises the produced HTML.
//! Failures surface as [`RenderError`]; views degrade to rendering nothing.

mod handlers;
mod nodes;
mod registry;
mod service;
mod types;
mod view;

pub use nodes::ContentNode;
pub use registry::{NodeRegistry, RenderContext, RenderFn, RenderedTree};
pub use service::LexicalRenderService;
pub use types::{
    MAX_TREE_DEPTH, NodePath, RenderError, RenderOutput, RenderService, TextFormat,
    UnknownNodePolicy,
};
pub use view::RichTextView;
