//! Generic element tree for render-theme documents.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{Result, StyleError};

/// One markup element with its attributes and child elements.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Value of attribute `name`, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

/// Parse XML text into its root element.
///
/// Namespace prefixes are stripped from element and attribute names and
/// namespace declarations are dropped. Text content is ignored.
pub fn parse_document(xml: &str) -> Result<Element> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader.read_event().map_err(|e| StyleError::Document {
            message: e.to_string(),
            position: reader.error_position() as u64,
        })?;

        match event {
            Event::Start(start) => {
                let element = element(&start, reader.buffer_position() as u64)?;
                stack.push(element);
            }
            Event::Empty(empty) => {
                let element = element(&empty, reader.buffer_position() as u64)?;
                attach(&mut stack, &mut root, element, reader.buffer_position() as u64)?;
            }
            Event::End(_) => {
                let Some(element) = stack.pop() else {
                    return Err(StyleError::Document {
                        message: "unbalanced end tag".into(),
                        position: reader.buffer_position() as u64,
                    });
                };
                attach(&mut stack, &mut root, element, reader.buffer_position() as u64)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(StyleError::Document {
            message: format!("unclosed element <{}>", open.name),
            position: reader.buffer_position() as u64,
        });
    }

    root.ok_or_else(|| StyleError::Document {
        message: "document has no root element".into(),
        position: 0,
    })
}

fn element(start: &BytesStart<'_>, position: u64) -> Result<Element> {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).to_string();
    let mut element = Element::new(name);

    for attr in start.attributes() {
        let attr = attr.map_err(|e| StyleError::Document {
            message: e.to_string(),
            position,
        })?;
        if attr.key.as_ref().starts_with(b"xmlns") {
            continue;
        }
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| StyleError::Document {
                message: e.to_string(),
                position,
            })?
            .to_string();
        element.attributes.push((key, value));
    }

    Ok(element)
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
    position: u64,
) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        return Ok(());
    }
    if root.is_some() {
        return Err(StyleError::Document {
            message: format!("second root element <{}>", element.name),
            position,
        });
    }
    *root = Some(element);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_elements() {
        let xml = r##"<?xml version="1.0" encoding="UTF-8"?>
<rendertheme xmlns="http://mapsforge.org/renderTheme" version="5">
  <!-- comment -->
  <rule e="way" k="highway" v="primary">
    <line stroke="#ff0000" stroke-width="2"/>
  </rule>
</rendertheme>"##;

        let root = parse_document(xml).unwrap();
        assert_eq!(root.name, "rendertheme");
        assert_eq!(root.get("version"), Some("5"));
        assert!(!root.has("xmlns"));

        let rule = &root.children[0];
        assert_eq!(rule.name, "rule");
        assert_eq!(rule.get("k"), Some("highway"));
        assert_eq!(rule.children[0].name, "line");
        assert_eq!(rule.children[0].get("stroke"), Some("#ff0000"));
    }

    #[test]
    fn strips_namespace_prefixes() {
        let xml = r#"<rt:rendertheme xmlns:rt="urn:x" xmlns:xsi="urn:y" xsi:schemaLocation="urn:z">
<rt:rule k="*" v="*"/></rt:rendertheme>"#;

        let root = parse_document(xml).unwrap();
        assert_eq!(root.name, "rendertheme");
        assert_eq!(root.children[0].name, "rule");
        assert_eq!(root.get("schemaLocation"), Some("urn:z"));
    }

    #[test]
    fn unescapes_attribute_values() {
        let root = parse_document(r#"<a name="fish &amp; chips"/>"#).unwrap();
        assert_eq!(root.get("name"), Some("fish & chips"));
    }

    #[test]
    fn rejects_mismatched_tags() {
        let err = parse_document("<rendertheme><rule></line></rendertheme>").unwrap_err();
        assert!(matches!(err, StyleError::Document { .. }));
    }

    #[test]
    fn rejects_unclosed_elements() {
        let err = parse_document("<rendertheme><rule>").unwrap_err();
        assert!(err.to_string().contains("rule") || err.to_string().contains("malformed"));
    }

    #[test]
    fn rejects_empty_input() {
        assert!(parse_document("").is_err());
    }
}
