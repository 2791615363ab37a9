//! Node-type dispatch table and the render context handlers write into.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use super::handlers;
use super::nodes::ContentNode;
use super::types::{RenderError, UnknownNodePolicy};

/// Renders one node (and, usually, its children) into the context.
pub type RenderFn = fn(&ContentNode, &mut RenderContext<'_>) -> Result<(), RenderError>;

/// Maps node-type tags to render functions.
#[derive(Clone)]
pub struct NodeRegistry {
    handlers: HashMap<String, RenderFn>,
}

impl NodeRegistry {
    /// A registry with no handlers; every node is treated as unknown.
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register `handler` for `node_type`, replacing any previous one.
    pub fn register(&mut self, node_type: impl Into<String>, handler: RenderFn) -> &mut Self {
        self.handlers.insert(node_type.into(), handler);
        self
    }

    pub fn get(&self, node_type: &str) -> Option<RenderFn> {
        self.handlers.get(node_type).copied()
    }

    pub fn contains(&self, node_type: &str) -> bool {
        self.handlers.contains_key(node_type)
    }

    /// Registered node types, sorted.
    pub fn node_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry
            .register("root", handlers::root)
            .register("paragraph", handlers::paragraph)
            .register("heading", handlers::heading)
            .register("list", handlers::list)
            .register("listitem", handlers::list_item)
            .register("link", handlers::link)
            .register("autolink", handlers::link)
            .register("quote", handlers::quote)
            .register("table", handlers::table)
            .register("tablerow", handlers::table_row)
            .register("tablecell", handlers::table_cell)
            .register("code", handlers::code)
            .register("code-highlight", handlers::code_highlight)
            .register("text", handlers::text)
            .register("linebreak", handlers::line_break)
            .register("tab", handlers::tab)
            .register("horizontalrule", handlers::horizontal_rule);
        registry
    }
}

impl fmt::Debug for NodeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRegistry")
            .field("node_types", &self.node_types())
            .finish()
    }
}

/// Output buffer plus the state handlers need while walking the tree.
pub struct RenderContext<'a> {
    registry: &'a NodeRegistry,
    policy: UnknownNodePolicy,
    out: String,
    in_code: bool,
    contains_code: bool,
    unknown: BTreeSet<String>,
}

/// What a finished walk produced, before sanitisation.
pub struct RenderedTree {
    pub html: String,
    pub contains_code: bool,
    pub unknown_node_types: BTreeSet<String>,
}

impl<'a> RenderContext<'a> {
    pub fn new(registry: &'a NodeRegistry, policy: UnknownNodePolicy) -> Self {
        Self {
            registry,
            policy,
            out: String::new(),
            in_code: false,
            contains_code: false,
            unknown: BTreeSet::new(),
        }
    }

    pub fn render_node(&mut self, node: &ContentNode) -> Result<(), RenderError> {
        match self.registry.get(node.node_type()) {
            Some(handler) => handler(node, self),
            None => {
                self.render_unknown(node);
                Ok(())
            }
        }
    }

    pub fn render_children(&mut self, node: &ContentNode) -> Result<(), RenderError> {
        for child in node.children() {
            self.render_node(child)?;
        }
        Ok(())
    }

    /// Render children wrapped in `<tag>…</tag>`.
    pub fn wrap_children(&mut self, tag: &str, node: &ContentNode) -> Result<(), RenderError> {
        self.open(tag, &[]);
        self.render_children(node)?;
        self.close(tag);
        Ok(())
    }

    /// Write an opening tag. Attribute values are escaped.
    pub fn open(&mut self, tag: &str, attributes: &[(&str, &str)]) {
        self.out.push('<');
        self.out.push_str(tag);
        for (name, value) in attributes {
            self.out.push(' ');
            self.out.push_str(name);
            self.out.push_str("=\"");
            escape_into(&mut self.out, value);
            self.out.push('"');
        }
        self.out.push('>');
    }

    pub fn close(&mut self, tag: &str) {
        self.out.push_str("</");
        self.out.push_str(tag);
        self.out.push('>');
    }

    /// Write a void element such as `<br>`.
    pub fn void(&mut self, tag: &str) {
        self.open(tag, &[]);
    }

    pub fn push_text(&mut self, text: &str) {
        escape_into(&mut self.out, text);
    }

    pub fn in_code(&self) -> bool {
        self.in_code
    }

    /// Run `f` with code-block semantics: line breaks become newlines and
    /// text formatting is dropped.
    pub fn within_code<F>(&mut self, f: F) -> Result<(), RenderError>
    where
        F: FnOnce(&mut Self) -> Result<(), RenderError>,
    {
        let previous = std::mem::replace(&mut self.in_code, true);
        self.contains_code = true;
        let result = f(self);
        self.in_code = previous;
        result
    }

    pub fn finish(self) -> RenderedTree {
        RenderedTree {
            html: self.out,
            contains_code: self.contains_code,
            unknown_node_types: self.unknown,
        }
    }

    fn render_unknown(&mut self, node: &ContentNode) {
        self.unknown.insert(node.node_type().to_string());
        match self.policy {
            UnknownNodePolicy::PlainText => {
                let mut text = String::new();
                node.collect_text(&mut text);
                self.push_text(&text);
            }
            UnknownNodePolicy::Skip => {}
        }
    }
}

fn escape_into(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
}
