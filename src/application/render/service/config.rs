use std::collections::HashSet;

use ammonia::Builder as AmmoniaBuilder;

/// Sanitizer for rendered rich text. Only the markup the default handlers
/// emit survives; every link gets `rel="noopener noreferrer"`.
pub(crate) fn build_sanitizer() -> AmmoniaBuilder<'static> {
    let mut builder = AmmoniaBuilder::default();

    let tags: HashSet<&'static str> = HashSet::from([
        "a",
        "blockquote",
        "br",
        "code",
        "em",
        "h1",
        "h2",
        "h3",
        "h4",
        "h5",
        "h6",
        "hr",
        "li",
        "mark",
        "ol",
        "p",
        "pre",
        "s",
        "span",
        "strong",
        "sub",
        "sup",
        "table",
        "tbody",
        "td",
        "th",
        "tr",
        "u",
        "ul",
    ]);
    builder.tags(tags);

    let generic: HashSet<&'static str> =
        HashSet::from(["class", "lang", "dir", "title", "role", "aria-checked"]);
    builder.generic_attributes(generic);

    builder.add_tag_attributes("a", &["target"]);
    builder.add_tag_attributes("code", &["data-language"]);
    builder.add_tag_attributes("ol", &["start"]);
    builder.add_tag_attributes("th", &["colspan", "rowspan"]);
    builder.add_tag_attributes("td", &["colspan", "rowspan"]);

    builder.url_schemes(HashSet::from(["http", "https", "mailto", "tel"]));

    builder
}

#[cfg(test)]
mod tests {
    use super::build_sanitizer;

    fn clean(html: &str) -> String {
        build_sanitizer().clean(html).to_string()
    }

    #[test]
    fn keeps_editor_markup() {
        let html = "<h2>T</h2><p><strong>a</strong><s>b</s><u>c</u><mark>d</mark></p>";
        assert_eq!(clean(html), html);
    }

    #[test]
    fn keeps_list_and_table_attributes() {
        let html = "<ol start=\"3\"><li>x</li></ol>\
                    <table><tbody><tr><td colspan=\"2\">y</td></tr></tbody></table>";
        assert_eq!(clean(html), html);
    }

    #[test]
    fn drops_scripts_and_unsafe_schemes() {
        let html = clean("<p>ok<script>alert(1)</script></p><a href=\"javascript:alert(1)\">x</a>");
        assert!(!html.contains("script"));
        assert!(!html.contains("javascript:"));
        assert!(html.starts_with("<p>ok</p>"));
    }

    #[test]
    fn links_gain_rel() {
        let html = clean("<a href=\"https://example.com\" target=\"_blank\">x</a>");
        assert!(html.contains("href=\"https://example.com\""));
        assert!(html.contains("target=\"_blank\""));
        assert!(html.contains("rel=\"noopener noreferrer\""));
    }

    #[test]
    fn drops_inline_styles() {
        let html = clean("<p style=\"color:red\" onclick=\"x()\">hi</p>");
        assert_eq!(html, "<p>hi</p>");
    }
}
