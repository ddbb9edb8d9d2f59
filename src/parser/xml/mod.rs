//! Positioned XML element tree built on quick-xml
//!
//! Detectors need byte ranges for tags, attributes and text content, which
//! quick-xml's event API does not expose directly. The reader's buffer
//! position gives the range of every event; attribute ranges are recovered by
//! scanning the raw start tag.

mod manifest;
mod values;

pub use manifest::{resolve_class_name, ManifestComponent, ManifestInfo, UsesSdk, COMPONENT_TAGS};
pub use values::{normalize_name, resource_type_for, ResourceDefinition, ValuesFile};

use quick_xml::escape::unescape;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::ops::Range;
use thiserror::Error;

pub const ANDROID_URI: &str = "http://schemas.android.com/apk/res/android";

#[derive(Error, Debug)]
pub enum XmlError {
    #[error("malformed XML at byte {position}: {message}")]
    Malformed { position: usize, message: String },
    #[error("document has no root element")]
    NoRoot,
}

/// An attribute with the ranges of its name and value
#[derive(Debug, Clone)]
pub struct XmlAttribute {
    /// Qualified name as written, e.g. `android:name`
    pub name: String,

    /// Unescaped value
    pub value: String,

    /// From the first character of the name to the closing quote
    pub range: Range<usize>,

    /// Inside the quotes
    pub value_range: Range<usize>,

    /// Namespace URI the prefix is bound to where the attribute appears
    pub namespace: Option<String>,
}

impl XmlAttribute {
    pub fn local_name(&self) -> &str {
        self.name.rsplit(':').next().unwrap_or(&self.name)
    }

    pub fn prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(p, _)| p)
    }
}

#[derive(Debug, Clone)]
pub struct XmlElement {
    pub tag: String,
    pub attributes: Vec<XmlAttribute>,
    pub children: Vec<XmlElement>,

    /// Concatenated text of this element and its descendants
    pub text: String,

    /// From `<` of the start tag to `>` of the end tag
    pub range: Range<usize>,

    /// Between the start and end tags; empty for self-closing elements
    pub content_range: Range<usize>,
}

impl XmlElement {
    /// Range of the tag name in the start tag
    pub fn name_range(&self) -> Range<usize> {
        let start = self.range.start + 1;
        start..start + self.tag.len()
    }

    /// End of the start tag name, where new attributes can be inserted
    pub fn name_end(&self) -> usize {
        self.name_range().end
    }

    pub fn attribute(&self, name: &str) -> Option<&XmlAttribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Attribute in the Android namespace, whatever prefix it is bound to
    pub fn android_attribute(&self, local: &str) -> Option<&XmlAttribute> {
        self.attributes
            .iter()
            .find(|a| a.namespace.as_deref() == Some(ANDROID_URI) && a.local_name() == local)
    }

    pub fn android_value(&self, local: &str) -> Option<&str> {
        self.android_attribute(local).map(|a| a.value.as_str())
    }

    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children.iter().filter(move |c| c.tag == tag)
    }

    /// Depth-first iteration over this element and all descendants
    pub fn descendants(&self) -> Vec<&XmlElement> {
        let mut out = vec![self];
        let mut i = 0;
        while i < out.len() {
            let element = out[i];
            out.extend(element.children.iter());
            i += 1;
        }
        out.sort_by_key(|e| e.range.start);
        out
    }
}

#[derive(Debug, Clone)]
pub struct XmlDocument {
    pub root: XmlElement,
}

impl XmlDocument {
    pub fn parse(contents: &str) -> Result<Self, XmlError> {
        let mut reader = Reader::from_str(contents);
        reader.trim_text(false);

        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root = None;
        // In-scope prefix bindings, and how many each open element added
        let mut namespaces: Vec<(String, String)> = Vec::new();
        let mut declared: Vec<usize> = Vec::new();

        loop {
            let start = reader.buffer_position();
            let event = reader.read_event().map_err(|e| XmlError::Malformed {
                position: reader.buffer_position(),
                message: e.to_string(),
            })?;
            let end = reader.buffer_position();

            match event {
                Event::Start(ref e) => {
                    let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                    let before = namespaces.len();
                    let element = open_element(contents, tag, start..end, end..end, &mut namespaces)?;
                    declared.push(namespaces.len() - before);
                    stack.push(element);
                }
                Event::Empty(ref e) => {
                    let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                    let before = namespaces.len();
                    let element = open_element(contents, tag, start..end, end..end, &mut namespaces)?;
                    namespaces.truncate(before);
                    attach(&mut stack, &mut root, element);
                }
                Event::End(_) => {
                    let Some(mut element) = stack.pop() else {
                        return Err(XmlError::Malformed {
                            position: start,
                            message: "unexpected end tag".to_string(),
                        });
                    };
                    let added = declared.pop().unwrap_or(0);
                    namespaces.truncate(namespaces.len().saturating_sub(added));
                    element.range.end = end;
                    element.content_range.end = start;
                    attach(&mut stack, &mut root, element);
                }
                Event::Text(ref t) => {
                    if let Some(top) = stack.last_mut() {
                        let text = t
                            .unescape()
                            .map(|c| c.into_owned())
                            .unwrap_or_else(|_| String::from_utf8_lossy(&**t).to_string());
                        top.text.push_str(&text);
                    }
                }
                Event::CData(ref c) => {
                    if let Some(top) = stack.last_mut() {
                        top.text.push_str(&String::from_utf8_lossy(&**c));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(XmlError::Malformed {
                position: open.range.start,
                message: format!("unclosed element <{}>", open.tag),
            });
        }

        root.map(|root| Self { root }).ok_or(XmlError::NoRoot)
    }
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) {
    match stack.last_mut() {
        Some(parent) => {
            parent.text.push_str(&element.text);
            parent.children.push(element);
        }
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

fn open_element(
    contents: &str,
    tag: String,
    range: Range<usize>,
    content_range: Range<usize>,
    namespaces: &mut Vec<(String, String)>,
) -> Result<XmlElement, XmlError> {
    let mut attributes = scan_attributes(contents, range.clone(), &tag)?;
    for attribute in &attributes {
        if attribute.prefix() == Some("xmlns") {
            namespaces.push((attribute.local_name().to_string(), attribute.value.clone()));
        }
    }
    for attribute in &mut attributes {
        attribute.namespace = match attribute.prefix() {
            None | Some("xmlns") => None,
            Some(prefix) => resolve_prefix(namespaces, prefix),
        };
    }
    Ok(XmlElement {
        tag,
        attributes,
        children: Vec::new(),
        text: String::new(),
        range,
        content_range,
    })
}

/// Innermost binding of `prefix`; an undeclared `android` prefix still means
/// the Android namespace
fn resolve_prefix(namespaces: &[(String, String)], prefix: &str) -> Option<String> {
    namespaces
        .iter()
        .rev()
        .find(|(bound, _)| bound == prefix)
        .map(|(_, uri)| uri.clone())
        .or_else(|| (prefix == "android").then(|| ANDROID_URI.to_string()))
}

/// Recover attribute names, values and ranges from a raw start tag
fn scan_attributes(contents: &str, tag_range: Range<usize>, tag: &str) -> Result<Vec<XmlAttribute>, XmlError> {
    let bytes = contents.as_bytes();
    let end = tag_range.end.min(bytes.len());
    let mut i = tag_range.start + 1 + tag.len();
    let mut attributes = Vec::new();

    loop {
        while i < end && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= end || bytes[i] == b'>' || bytes[i] == b'/' {
            break;
        }

        let name_start = i;
        while i < end && bytes[i] != b'=' && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
            i += 1;
        }
        let name = contents[name_start..i].to_string();

        while i < end && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= end || bytes[i] != b'=' {
            return Err(XmlError::Malformed {
                position: i,
                message: format!("attribute `{}` has no value", name),
            });
        }
        i += 1;
        while i < end && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= end || (bytes[i] != b'"' && bytes[i] != b'\'') {
            return Err(XmlError::Malformed {
                position: i,
                message: format!("attribute `{}` value is not quoted", name),
            });
        }
        let quote = bytes[i];
        i += 1;
        let value_start = i;
        while i < end && bytes[i] != quote {
            i += 1;
        }
        let value_end = i;
        i += 1;

        let raw = &contents[value_start..value_end];
        let value = unescape(raw).map(|v| v.into_owned()).unwrap_or_else(|_| raw.to_string());

        attributes.push(XmlAttribute {
            name,
            value,
            range: name_start..i.min(end),
            value_range: value_start..value_end,
            namespace: None,
        });
    }

    Ok(attributes)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STRINGS: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<resources xmlns:tools="http://schemas.android.com/tools">
    <string name="app_name">App &amp; Name</string>
    <string name="empty"/>
    <string name="nested">Hello <b>bold</b> world</string>
</resources>
"#;

    #[test]
    fn test_parse_tree() {
        let doc = XmlDocument::parse(STRINGS).unwrap();
        assert_eq!(doc.root.tag, "resources");
        assert_eq!(doc.root.children.len(), 3);

        let first = &doc.root.children[0];
        assert_eq!(first.tag, "string");
        assert_eq!(first.text, "App & Name");
        assert_eq!(&STRINGS[first.name_range()], "string");
        assert_eq!(&STRINGS[first.content_range.clone()], "App &amp; Name");
    }

    #[test]
    fn test_attribute_ranges() {
        let doc = XmlDocument::parse(STRINGS).unwrap();
        let name = doc.root.children[0].attribute("name").unwrap();
        assert_eq!(name.value, "app_name");
        assert_eq!(&STRINGS[name.range.clone()], r#"name="app_name""#);
        assert_eq!(&STRINGS[name.value_range.clone()], "app_name");
    }

    #[test]
    fn test_self_closing_and_nested_text() {
        let doc = XmlDocument::parse(STRINGS).unwrap();
        let empty = &doc.root.children[1];
        assert!(empty.content_range.is_empty());
        assert_eq!(&STRINGS[empty.range.clone()], r#"<string name="empty"/>"#);

        let nested = &doc.root.children[2];
        assert_eq!(nested.text, "Hello bold world");
        assert_eq!(nested.children.len(), 1);
    }

    #[test]
    fn test_android_attribute_lookup() {
        let xml = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android" package="p">
    <uses-sdk android:minSdkVersion = '14' />
</manifest>"#;
        let doc = XmlDocument::parse(xml).unwrap();
        let sdk = &doc.root.children[0];
        assert_eq!(sdk.android_value("minSdkVersion"), Some("14"));
        assert_eq!(doc.root.attribute("package").map(|a| a.value.as_str()), Some("p"));
    }

    #[test]
    fn test_android_attribute_under_other_prefix() {
        let xml = r#"<manifest xmlns:a="http://schemas.android.com/apk/res/android" package="p">
    <application a:icon="@mipmap/ic_launcher" android:label="x">
        <activity xmlns:a="urn:other" a:name=".Main" />
    </application>
</manifest>"#;
        let doc = XmlDocument::parse(xml).unwrap();
        let application = &doc.root.children[0];
        assert_eq!(application.android_value("icon"), Some("@mipmap/ic_launcher"));
        assert_eq!(application.android_value("label"), Some("x"));
        assert_eq!(application.children[0].android_value("name"), None);
        assert_eq!(application.children[0].attributes[1].namespace.as_deref(), Some("urn:other"));
    }

    #[test]
    fn test_malformed() {
        assert!(XmlDocument::parse("<resources><string></resources>").is_err());
        assert!(XmlDocument::parse("").is_err());
    }
}
