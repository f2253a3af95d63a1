//! HTML fragment parsing.
//!
//! `tl` does the tokenizing; this module walks its node handles and mirrors
//! them into a [`Dom`] arena. Whitespace-only text is kept because blank text
//! nodes are legitimate rewrite targets.

use std::borrow::Cow;

use super::{Dom, NodeId};
use crate::tree::Tree;
use crate::{Error, Result};

/// Parse an HTML fragment into a fresh document.
pub(super) fn parse_html(html: &str) -> Result<Dom> {
    let vdom = tl::parse(html, tl::ParserOptions::default())
        .map_err(|e| Error::usage(format!("malformed html: {e:?}")))?;
    let parser = vdom.parser();

    let mut dom = Dom::new();
    let root = dom.root();
    for handle in vdom.children() {
        convert(&mut dom, root, *handle, parser, false)?;
    }
    Ok(dom)
}

/// Mirror one `tl` node (and its subtree) under `parent`.
fn convert(
    dom: &mut Dom,
    parent: NodeId,
    handle: tl::NodeHandle,
    parser: &tl::Parser,
    raw_text: bool,
) -> Result<()> {
    let Some(node) = handle.get(parser) else {
        return Ok(());
    };

    match node {
        tl::Node::Tag(tag) => {
            let name = tag.name().as_utf8_str().to_ascii_lowercase();
            // `tl` keeps attributes in a hash map, so read them off the raw
            // start tag to preserve source order.
            let raw_tag = tag.raw().as_utf8_str();
            let attrs: Vec<(String, String)> = start_tag_attributes(&raw_tag)
                .into_iter()
                .map(|(k, v)| (k, unescape(&v).into_owned()))
                .collect();

            let element = dom.element(&name, attrs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
            dom.append_child(parent, element)?;

            // `tl` only knows lowercase void tags, so `<IMG>` may arrive with
            // children. Hoist them next to the element instead.
            let target = if dom.accepts_children(element) {
                element
            } else {
                parent
            };
            let raw = is_raw_text_element(&name);
            for child in tag.children().top().iter() {
                convert(dom, target, *child, parser, raw)?;
            }
        }
        tl::Node::Raw(bytes) => {
            let text = bytes.as_utf8_str();
            if text.is_empty() {
                return Ok(());
            }
            let text = if raw_text {
                text.into_owned()
            } else {
                unescape(&text).into_owned()
            };
            dom.append_text(parent, text)?;
        }
        tl::Node::Comment(bytes) => {
            let text = bytes.as_utf8_str();
            let inner = text
                .strip_prefix("<!--")
                .and_then(|t| t.strip_suffix("-->"))
                .unwrap_or(&text[..]);
            let comment = dom.comment(inner);
            dom.append_child(parent, comment)?;
        }
    }
    Ok(())
}

/// Scan the attributes of a raw start tag in source order.
///
/// Handles `name="v"`, `name='v'`, `name=v` and boolean `name`. Unquoted
/// values end at `/` like they do for `tl`. Scanning stops at the first
/// unquoted `>`. Values are returned undecoded. A repeated name keeps its
/// first value.
fn start_tag_attributes(raw: &str) -> Vec<(String, String)> {
    let mut attrs: Vec<(String, String)> = Vec::new();
    let mut chars = raw.strip_prefix('<').unwrap_or(raw).chars().peekable();

    // Tag name
    while chars.next_if(|c| c.is_whitespace()).is_some() {}
    while chars.next_if(|c| !c.is_whitespace() && *c != '/' && *c != '>').is_some() {}

    loop {
        while chars.next_if(|c| c.is_whitespace() || *c == '/').is_some() {}
        match chars.peek() {
            None | Some('>') => break,
            _ => {}
        }

        let mut name = String::new();
        let is_name = |c: &char| !c.is_whitespace() && !matches!(*c, '=' | '>' | '/');
        while let Some(c) = chars.next_if(is_name) {
            name.push(c);
        }
        if name.is_empty() {
            // A stray `=` with no name; skip it.
            chars.next();
            continue;
        }

        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        let mut value = String::new();
        if chars.next_if_eq(&'=').is_some() {
            while chars.next_if(|c| c.is_whitespace()).is_some() {}
            match chars.next_if(|c| *c == '"' || *c == '\'') {
                Some(quote) => {
                    for c in chars.by_ref() {
                        if c == quote {
                            break;
                        }
                        value.push(c);
                    }
                }
                None => {
                    let is_value = |c: &char| !c.is_whitespace() && !matches!(*c, '/' | '>');
                    while let Some(c) = chars.next_if(is_value) {
                        value.push(c);
                    }
                }
            }
        }

        if !attrs.iter().any(|(k, _)| *k == name) {
            attrs.push((name, value));
        }
    }
    attrs
}

/// Script and style bodies are not entity-decoded.
#[inline]
pub(super) fn is_raw_text_element(tag: &str) -> bool {
    matches!(tag, "script" | "style")
}

/// Decode the named entities `tl` leaves in place plus numeric references.
fn unescape(s: &str) -> Cow<'_, str> {
    if !s.contains('&') {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];

        // Entities longer than this are not worth looking for.
        let decoded = rest[1..]
            .char_indices()
            .take(12)
            .find(|&(_, c)| c == ';')
            .and_then(|(end, _)| decode_entity(&rest[1..=end]).map(|c| (c, end + 2)));

        match decoded {
            Some((c, consumed)) => {
                out.push(c);
                rest = &rest[consumed..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{00A0}'),
        _ => {
            let num = entity.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}
