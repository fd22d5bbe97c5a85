//! HTML front end: tree-sitter CST to [`Document`].

use std::path::Path;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use tracing::debug;
use tree_sitter::{Language, Node, Parser, Tree};

use crate::document::Document;
use crate::error::Error;
use crate::types::NodeId;

/// One character reference: `&name;`, `&#N;`, or `&#xH;`. Group 1 is the body.
#[allow(clippy::expect_used, reason = "literal pattern, checked by tests")]
static CHARACTER_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]+);").expect("valid regex");
});

/// Maximum document size (16 MiB).
const MAX_FILE_SIZE: u64 = 16 * 1024 * 1024;

/// Map a file extension to the grammar that parses it.
///
/// # Errors
///
/// Returns `Error::UnsupportedDocument` for anything but HTML.
pub fn language_for_path(path: &Path) -> Result<Language, Error> {
    let ext = path.extension().and_then(|e| return e.to_str()).unwrap_or("");

    return match ext {
        "htm" | "html" | "xhtml" => Ok(tree_sitter_html::LANGUAGE.into()),
        _ => Err(Error::UnsupportedDocument {
            ext: ext.to_string(),
        }),
    };
}

/// Whether a path looks like a document this front end can load.
pub fn is_document(path: &Path) -> bool {
    return language_for_path(path).is_ok();
}

/// Read and parse a document from disk. `document_path` is the canonical
/// path links inside it use to refer to itself.
///
/// # Errors
///
/// Returns `Error::FileNotFound`, `Error::UnsupportedDocument`,
/// or `Error::ParseFailed`.
pub fn load(file: &Path, document_path: &str) -> Result<Document, Error> {
    let language = language_for_path(file)?;
    let source = std::fs::read_to_string(file).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            return Error::FileNotFound {
                path: file.to_path_buf(),
            };
        }
        return Error::Io(e);
    })?;
    return parse(file, &source, &language, document_path);
}

/// Parse HTML source into a document.
///
/// # Errors
///
/// Returns `Error::ParseFailed` if the source is too large or tree-sitter
/// cannot parse it.
pub fn parse(
    file: &Path,
    source: &str,
    language: &Language,
    document_path: &str,
) -> Result<Document, Error> {
    let source_len: u64 = source.len().try_into().unwrap_or(u64::MAX);
    if source_len > MAX_FILE_SIZE {
        return Err(Error::ParseFailed {
            file: file.to_path_buf(),
            reason: format!("{source_len} bytes exceeds the {MAX_FILE_SIZE} byte limit"),
        });
    }

    let tree = parse_source(file, source, language)?;
    let mut document = Document::new(document_path);
    let root = document.root();
    build_nodes(tree.root_node(), source, root, &mut document);
    if document.is_empty() {
        debug!(file = %file.display(), "document has no content");
    }
    return Ok(document);
}

/// Parse source into a tree-sitter tree.
///
/// # Errors
///
/// Returns `Error::ParseFailed` if the language cannot be set or parsing fails.
fn parse_source(file: &Path, source: &str, language: &Language) -> Result<Tree, Error> {
    let mut parser = Parser::new();
    parser.set_language(language).map_err(|e| {
        return Error::ParseFailed {
            file: file.to_path_buf(),
            reason: e.to_string(),
        };
    })?;

    return parser.parse(source, None).ok_or_else(|| {
        return Error::ParseFailed {
            file: file.to_path_buf(),
            reason: "tree-sitter returned None".to_string(),
        };
    });
}

/// Walk the CST in document order, appending elements and text.
/// Uses an explicit stack so deeply nested markup cannot overflow.
fn build_nodes(root: Node<'_>, source: &str, parent: NodeId, document: &mut Document) {
    let mut stack: Vec<(Node<'_>, NodeId)> = vec![(root, parent)];

    while let Some((node, parent)) = stack.pop() {
        let next_parent = match node.kind() {
            "element" | "script_element" | "style_element" => {
                let Some(tag) = tag_node(node) else {
                    continue;
                };
                let (name, attributes) = read_tag(tag, source);
                let borrowed: Vec<(&str, &str)> = attributes
                    .iter()
                    .map(|(n, v)| return (n.as_str(), v.as_str()))
                    .collect();
                document.append_element(parent, &name, &borrowed)
            },
            "entity" | "raw_text" | "text" => {
                if let Ok(text) = node.utf8_text(source.as_bytes()) {
                    document.append_text(parent, &decode_entities(text));
                }
                continue;
            },
            "comment" | "doctype" | "end_tag" | "erroneous_end_tag" | "self_closing_tag"
            | "start_tag" => continue,
            // document, fragment, ERROR: transparent containers.
            _ => parent,
        };

        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node.named_children(&mut cursor).collect();
        for child in children.into_iter().rev() {
            stack.push((child, next_parent));
        }
    }
}

/// The start or self-closing tag of an element node.
fn tag_node(element: Node<'_>) -> Option<Node<'_>> {
    let mut cursor = element.walk();
    return element
        .named_children(&mut cursor)
        .find(|c| return matches!(c.kind(), "self_closing_tag" | "start_tag"));
}

/// Tag name and attributes from a start or self-closing tag.
fn read_tag(tag: Node<'_>, source: &str) -> (String, Vec<(String, String)>) {
    let mut name = String::new();
    let mut attributes = Vec::new();
    let mut cursor = tag.walk();

    for child in tag.named_children(&mut cursor) {
        match child.kind() {
            "attribute" => {
                if let Some(attribute) = read_attribute(child, source) {
                    attributes.push(attribute);
                }
            },
            "tag_name" => {
                name = child.utf8_text(source.as_bytes()).unwrap_or("").to_string();
            },
            _ => {},
        }
    }

    return (name, attributes);
}

/// One `name="value"` pair. Valueless attributes get the empty string.
fn read_attribute(attribute: Node<'_>, source: &str) -> Option<(String, String)> {
    let mut name = None;
    let mut value = String::new();
    let mut cursor = attribute.walk();

    for child in attribute.named_children(&mut cursor) {
        match child.kind() {
            "attribute_name" => name = child.utf8_text(source.as_bytes()).ok(),
            "attribute_value" => {
                value = decode_entities(child.utf8_text(source.as_bytes()).unwrap_or(""));
            },
            "quoted_attribute_value" => {
                let mut inner_cursor = child.walk();
                let inner = child
                    .named_children(&mut inner_cursor)
                    .find(|c| return c.kind() == "attribute_value");
                if let Some(inner) = inner {
                    value = decode_entities(inner.utf8_text(source.as_bytes()).unwrap_or(""));
                }
            },
            _ => {},
        }
    }

    return name.map(|n| return (n.to_string(), value));
}

/// Replace the named references that show up in generated listings, plus
/// decimal and hex numeric references. Unknown or invalid ones are kept as written.
fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    return CHARACTER_REFERENCE
        .replace_all(raw, |caps: &Captures<'_>| {
            let whole = caps.get(0).map_or("", |m| return m.as_str());
            let body = caps.get(1).map_or("", |m| return m.as_str());
            return decode_reference(body).map_or_else(|| return whole.to_string(), String::from);
        })
        .into_owned();
}

/// The character one reference body (between `&` and `;`) stands for.
fn decode_reference(body: &str) -> Option<char> {
    let code = if let Some(hex) = body.strip_prefix("#x").or_else(|| return body.strip_prefix("#X")) {
        u32::from_str_radix(hex, 16).ok()?
    } else if let Some(decimal) = body.strip_prefix('#') {
        decimal.parse::<u32>().ok()?
    } else {
        return match body {
            "amp" => Some('&'),
            "apos" => Some('\''),
            "gt" => Some('>'),
            "lt" => Some('<'),
            "nbsp" => Some('\u{a0}'),
            "quot" => Some('"'),
            _ => None,
        };
    };
    return char::from_u32(code);
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests")]
mod tests {
    use super::*;

    /// Parse an inline HTML snippet as `/src/page.html`.
    fn parse_html(source: &str) -> Document {
        let language = language_for_path(Path::new("page.html")).unwrap();
        parse(Path::new("page.html"), source, &language, "/src/page.html").unwrap()
    }

    /// First element carrying `name=value`.
    fn find(doc: &Document, name: &str, value: &str) -> NodeId {
        doc.node_ids()
            .find(|n| doc.attribute(*n, name) == Some(value))
            .unwrap()
    }

    #[test]
    fn extracts_ids_hrefs_and_nesting() {
        let doc = parse_html(
            "<html><body><pre><span id=\"Outer\">class <a href=\"#Inner\" title=\"t\">Inner</a></span>\n\
             <span id='Inner'>x</span></pre></body></html>",
        );

        let outer = find(&doc, "id", "Outer");
        let link = find(&doc, "href", "#Inner");
        let inner = find(&doc, "id", "Inner");

        assert_eq!(doc.parent(link), Some(outer));
        assert_eq!(doc.tag(link), Some("a"));
        assert_eq!(doc.attribute(link, "title"), Some("t"));
        assert_eq!(doc.text_content(link), "Inner");
        assert!(outer < link && link < inner);
        assert_eq!(doc.path(), "/src/page.html");
    }

    #[test]
    fn decodes_attribute_entities() {
        let doc = parse_html("<a href=\"page.html?x=1&amp;id=2#k\">k</a><span id=k></span>");
        let link = find(&doc, "href", "page.html?x=1&id=2#k");
        assert_eq!(doc.tag(link), Some("a"));
    }

    #[test]
    fn numeric_references_match_their_counterparts() {
        let doc = parse_html(
            "<span id=\"a&#45;b\">x</span><a href=\"#a&#x2d;b\">x</a><a href=\"#a&#X2D;b\">y</a>",
        );
        let span = find(&doc, "id", "a-b");
        assert_eq!(doc.tag(span), Some("span"));
        assert_eq!(doc.node_ids().filter(|n| doc.attribute(*n, "href") == Some("#a-b")).count(), 2);
    }

    #[test]
    fn character_references_decode_once() {
        assert_eq!(decode_entities("&lt;T&gt; &amp;lt; &#39;&apos;"), "<T> &lt; ''");
        assert_eq!(decode_entities("&#x1F600;"), "\u{1F600}");
        // Invalid code points and unknown names stay as written.
        assert_eq!(decode_entities("&#xD800; &bogus; & x"), "&#xD800; &bogus; & x");
    }

    #[test]
    fn rejects_unknown_extensions() {
        assert!(matches!(
            language_for_path(Path::new("notes.md")),
            Err(Error::UnsupportedDocument { ext }) if ext == "md"
        ));
        assert!(is_document(Path::new("A.scala.html")));
    }
}
