mod config;

use tracing::debug;

use crate::application::render::nodes::ContentNode;
use crate::application::render::registry::{NodeRegistry, RenderContext, RenderedTree};
use crate::application::render::types::{
    RenderError, RenderOutput, RenderService, UnknownNodePolicy,
};

use config::build_sanitizer;

/// Lexical-tree rendering pipeline: validate, walk the registry, sanitise.
pub struct LexicalRenderService {
    registry: NodeRegistry,
    policy: UnknownNodePolicy,
    sanitizer: ammonia::Builder<'static>,
}

impl LexicalRenderService {
    pub fn new(policy: UnknownNodePolicy) -> Self {
        Self {
            registry: NodeRegistry::default(),
            policy,
            sanitizer: build_sanitizer(),
        }
    }
}

impl Default for LexicalRenderService {
    fn default() -> Self {
        Self::new(UnknownNodePolicy::default())
    }
}

impl RenderService for LexicalRenderService {
    fn render(&self, document: &serde_json::Value) -> Result<RenderOutput, RenderError> {
        let root = parse_stage(document)?;
        let RenderedTree {
            html,
            contains_code,
            unknown_node_types,
        } = walk_stage(&root, &self.registry, self.policy)?;

        if !unknown_node_types.is_empty() {
            debug!(
                target = "application::render",
                node_types = ?unknown_node_types,
                policy = ?self.policy,
                "rich-text document contains unregistered node types"
            );
        }

        Ok(RenderOutput {
            html: sanitize_stage(&html, &self.sanitizer),
            contains_code,
            unknown_node_types,
        })
    }
}

fn parse_stage(document: &serde_json::Value) -> Result<ContentNode, RenderError> {
    ContentNode::parse_document(document)
}

fn walk_stage(
    root: &ContentNode,
    registry: &NodeRegistry,
    policy: UnknownNodePolicy,
) -> Result<RenderedTree, RenderError> {
    let mut context = RenderContext::new(registry, policy);
    context.render_node(root)?;
    Ok(context.finish())
}

fn sanitize_stage(html: &str, sanitizer: &ammonia::Builder<'static>) -> String {
    sanitizer.clean(html).to_string()
}
