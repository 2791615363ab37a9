//! Default render functions, one per editor node type.

use serde_json::{Map, Value};

use super::nodes::ContentNode;
use super::registry::RenderContext;
use super::types::{RenderError, TextFormat};

type RenderResult = Result<(), RenderError>;

const HEADING_TAGS: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "h6"];

pub(super) fn root(node: &ContentNode, ctx: &mut RenderContext<'_>) -> RenderResult {
    ctx.render_children(node)
}

pub(super) fn paragraph(node: &ContentNode, ctx: &mut RenderContext<'_>) -> RenderResult {
    // An empty paragraph is a blank line in the editor.
    if node.children().is_empty() {
        ctx.open("p", &[]);
        ctx.void("br");
        ctx.close("p");
        return Ok(());
    }
    ctx.wrap_children("p", node)
}

pub(super) fn heading(node: &ContentNode, ctx: &mut RenderContext<'_>) -> RenderResult {
    let tag = node
        .str_field("tag")?
        .and_then(|tag| HEADING_TAGS.iter().find(|candidate| **candidate == tag))
        .ok_or_else(|| RenderError::invalid_field(node.path(), "tag", "one of h1..h6"))?;
    ctx.wrap_children(tag, node)
}

pub(super) fn list(node: &ContentNode, ctx: &mut RenderContext<'_>) -> RenderResult {
    let list_type = match node.str_field("listType")? {
        Some(list_type) => list_type,
        None => match node.str_field("tag")? {
            Some("ol") => "number",
            _ => "bullet",
        },
    };

    match list_type {
        "bullet" => ctx.wrap_children("ul", node),
        "check" => {
            ctx.open("ul", &[("class", "checklist")]);
            ctx.render_children(node)?;
            ctx.close("ul");
            Ok(())
        }
        "number" => {
            let start = node.u64_field("start")?.filter(|start| *start != 1);
            match start {
                Some(start) => {
                    let start = start.to_string();
                    ctx.open("ol", &[("start", start.as_str())]);
                }
                None => ctx.open("ol", &[]),
            }
            ctx.render_children(node)?;
            ctx.close("ol");
            Ok(())
        }
        _ => Err(RenderError::invalid_field(
            node.path(),
            "listType",
            "one of bullet, number, check",
        )),
    }
}

pub(super) fn list_item(node: &ContentNode, ctx: &mut RenderContext<'_>) -> RenderResult {
    match node.bool_field("checked")? {
        Some(checked) => {
            let state = if checked { "true" } else { "false" };
            ctx.open("li", &[("role", "checkbox"), ("aria-checked", state)]);
        }
        None => ctx.open("li", &[]),
    }
    ctx.render_children(node)?;
    ctx.close("li");
    Ok(())
}

/// Handles both `link` and `autolink`. Links created by the CMS keep their
/// target in `fields`; plain editor links keep it on the node itself.
pub(super) fn link(node: &ContentNode, ctx: &mut RenderContext<'_>) -> RenderResult {
    let fields = node.object_field("fields")?;
    let href = match fields {
        Some(fields) => link_href(fields).or(node.str_field("url")?.map(str::to_string)),
        None => node.str_field("url")?.map(str::to_string),
    };
    let new_tab = fields
        .and_then(|fields| fields.get("newTab"))
        .and_then(Value::as_bool)
        .unwrap_or(false)
        || node.str_field("target")? == Some("_blank");

    let Some(href) = href.filter(|href| !href.trim().is_empty()) else {
        return ctx.render_children(node);
    };

    if new_tab {
        ctx.open("a", &[("href", href.as_str()), ("target", "_blank")]);
    } else {
        ctx.open("a", &[("href", href.as_str())]);
    }
    ctx.render_children(node)?;
    ctx.close("a");
    Ok(())
}

fn link_href(fields: &Map<String, Value>) -> Option<String> {
    if fields.get("linkType").and_then(Value::as_str) == Some("internal") {
        let doc = fields.get("doc")?;
        let slug = doc
            .get("value")
            .and_then(|value| value.get("slug"))
            .and_then(Value::as_str)?;
        return match doc.get("relationTo").and_then(Value::as_str) {
            Some("blog") => Some(format!("/blog/{slug}")),
            _ => Some(format!("/{slug}")),
        };
    }
    fields
        .get("url")
        .and_then(Value::as_str)
        .map(str::to_string)
}

pub(super) fn quote(node: &ContentNode, ctx: &mut RenderContext<'_>) -> RenderResult {
    ctx.wrap_children("blockquote", node)
}

pub(super) fn table(node: &ContentNode, ctx: &mut RenderContext<'_>) -> RenderResult {
    ctx.open("table", &[]);
    ctx.wrap_children("tbody", node)?;
    ctx.close("table");
    Ok(())
}

pub(super) fn table_row(node: &ContentNode, ctx: &mut RenderContext<'_>) -> RenderResult {
    ctx.wrap_children("tr", node)
}

pub(super) fn table_cell(node: &ContentNode, ctx: &mut RenderContext<'_>) -> RenderResult {
    let tag = match node.u64_field("headerState")? {
        Some(state) if state != 0 => "th",
        _ => "td",
    };

    let col_span = node
        .u64_field("colSpan")?
        .filter(|span| *span > 1)
        .map(|span| span.to_string());
    let row_span = node
        .u64_field("rowSpan")?
        .filter(|span| *span > 1)
        .map(|span| span.to_string());

    let mut attributes = Vec::new();
    if let Some(span) = col_span.as_deref() {
        attributes.push(("colspan", span));
    }
    if let Some(span) = row_span.as_deref() {
        attributes.push(("rowspan", span));
    }

    ctx.open(tag, &attributes);
    ctx.render_children(node)?;
    ctx.close(tag);
    Ok(())
}

pub(super) fn code(node: &ContentNode, ctx: &mut RenderContext<'_>) -> RenderResult {
    let language = node
        .str_field("language")?
        .map(str::trim)
        .filter(|language| !language.is_empty());

    ctx.open("pre", &[]);
    match language {
        Some(language) => ctx.open("code", &[("data-language", language)]),
        None => ctx.open("code", &[]),
    }
    ctx.within_code(|ctx| ctx.render_children(node))?;
    ctx.close("code");
    ctx.close("pre");
    Ok(())
}

pub(super) fn code_highlight(node: &ContentNode, ctx: &mut RenderContext<'_>) -> RenderResult {
    let text = node.str_field("text")?.unwrap_or_default();
    ctx.push_text(text);
    Ok(())
}

pub(super) fn text(node: &ContentNode, ctx: &mut RenderContext<'_>) -> RenderResult {
    let text = node.str_field("text")?.unwrap_or_default();
    let format = node
        .u64_field("format")?
        .map(|bits| TextFormat::from_bits(u32::try_from(bits).unwrap_or(0)))
        .unwrap_or_default();

    if ctx.in_code() || format.is_plain() {
        ctx.push_text(text);
        return Ok(());
    }

    for tag in format.tags() {
        ctx.open(tag, &[]);
    }
    ctx.push_text(text);
    for tag in format.tags().rev() {
        ctx.close(tag);
    }
    Ok(())
}

pub(super) fn line_break(_node: &ContentNode, ctx: &mut RenderContext<'_>) -> RenderResult {
    if ctx.in_code() {
        ctx.push_text("\n");
    } else {
        ctx.void("br");
    }
    Ok(())
}

pub(super) fn tab(_node: &ContentNode, ctx: &mut RenderContext<'_>) -> RenderResult {
    ctx.push_text("\t");
    Ok(())
}

pub(super) fn horizontal_rule(_node: &ContentNode, ctx: &mut RenderContext<'_>) -> RenderResult {
    ctx.void("hr");
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;
    use crate::application::render::registry::NodeRegistry;
    use crate::application::render::types::UnknownNodePolicy;

    fn render(children: Value) -> Result<String, RenderError> {
        let document = json!({"root": {"type": "root", "children": children}});
        let root = ContentNode::parse_document(&document)?;
        let registry = NodeRegistry::default();
        let mut ctx = RenderContext::new(&registry, UnknownNodePolicy::PlainText);
        ctx.render_node(&root)?;
        Ok(ctx.finish().html)
    }

    fn text(value: &str) -> Value {
        json!({"type": "text", "text": value})
    }

    #[test]
    fn formats_nest_outermost_first() {
        let html = render(json!([
            {"type": "paragraph", "children": [
                {"type": "text", "text": "x", "format": 1 | 2 | 16}
            ]}
        ]))
        .unwrap();
        assert_eq!(html, "<p><strong><em><code>x</code></em></strong></p>");
    }

    #[test]
    fn empty_paragraph_keeps_blank_line() {
        let html = render(json!([{"type": "paragraph", "children": []}])).unwrap();
        assert_eq!(html, "<p><br></p>");
    }

    #[test]
    fn heading_requires_valid_tag() {
        let html = render(json!([{"type": "heading", "tag": "h3", "children": [text("T")]}]))
            .unwrap();
        assert_eq!(html, "<h3>T</h3>");

        let err = render(json!([{"type": "heading", "tag": "h9", "children": []}]))
            .expect_err("h9 is invalid");
        assert!(matches!(err, RenderError::InvalidField { field: "tag", .. }));
    }

    #[test]
    fn numbered_list_keeps_start() {
        let html = render(json!([
            {"type": "list", "listType": "number", "start": 3, "children": [
                {"type": "listitem", "children": [text("c")]}
            ]}
        ]))
        .unwrap();
        assert_eq!(html, "<ol start=\"3\"><li>c</li></ol>");
    }

    #[test]
    fn check_list_marks_items() {
        let html = render(json!([
            {"type": "list", "listType": "check", "children": [
                {"type": "listitem", "checked": true, "children": [text("done")]},
                {"type": "listitem", "checked": false, "children": [text("todo")]}
            ]}
        ]))
        .unwrap();
        assert_eq!(
            html,
            "<ul class=\"checklist\">\
             <li role=\"checkbox\" aria-checked=\"true\">done</li>\
             <li role=\"checkbox\" aria-checked=\"false\">todo</li></ul>"
        );
    }

    #[test]
    fn list_type_falls_back_to_tag() {
        let html = render(json!([
            {"type": "list", "tag": "ol", "children": [{"type": "listitem", "children": [text("a")]}]}
        ]))
        .unwrap();
        assert_eq!(html, "<ol><li>a</li></ol>");
    }

    #[test]
    fn cms_links_use_fields() {
        let html = render(json!([
            {"type": "link", "fields": {"url": "https://example.com", "newTab": true}, "children": [text("ext")]},
            {"type": "link", "fields": {"linkType": "internal", "doc": {"relationTo": "blog", "value": {"slug": "cpr"}}}, "children": [text("int")]},
            {"type": "autolink", "url": "https://auto.example.com", "children": [text("auto")]}
        ]))
        .unwrap();
        assert_eq!(
            html,
            "<a href=\"https://example.com\" target=\"_blank\">ext</a>\
             <a href=\"/blog/cpr\">int</a>\
             <a href=\"https://auto.example.com\">auto</a>"
        );
    }

    #[test]
    fn link_without_target_renders_children_only() {
        let html = render(json!([{"type": "link", "children": [text("bare")]}])).unwrap();
        assert_eq!(html, "bare");
    }

    #[test]
    fn table_cells_distinguish_headers() {
        let html = render(json!([
            {"type": "table", "children": [
                {"type": "tablerow", "children": [
                    {"type": "tablecell", "headerState": 1, "children": [text("H")]},
                    {"type": "tablecell", "headerState": 0, "colSpan": 2, "children": [text("D")]}
                ]}
            ]}
        ]))
        .unwrap();
        assert_eq!(
            html,
            "<table><tbody><tr><th>H</th><td colspan=\"2\">D</td></tr></tbody></table>"
        );
    }

    #[test]
    fn code_blocks_use_newlines_and_drop_formatting() {
        let html = render(json!([
            {"type": "code", "language": "rust", "children": [
                {"type": "code-highlight", "text": "fn main() {"},
                {"type": "linebreak"},
                {"type": "tab"},
                {"type": "text", "text": "x < y", "format": 1},
                {"type": "linebreak"},
                {"type": "code-highlight", "text": "}"}
            ]}
        ]))
        .unwrap();
        assert_eq!(
            html,
            "<pre><code data-language=\"rust\">fn main() {\n\tx &lt; y\n}</code></pre>"
        );
    }

    #[test]
    fn breaks_and_rules_outside_code() {
        let html = render(json!([
            {"type": "paragraph", "children": [text("a"), {"type": "linebreak"}, text("b")]},
            {"type": "horizontalrule"}
        ]))
        .unwrap();
        assert_eq!(html, "<p>a<br>b</p><hr>");
    }

    #[test]
    fn bad_field_types_fail_the_render() {
        let err = render(json!([{"type": "text", "text": "x", "format": "bold"}]))
            .expect_err("string format");
        assert!(matches!(err, RenderError::InvalidField { field: "format", .. }));
    }
}
