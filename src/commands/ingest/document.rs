use std::fs;
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::IngestError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |child| child.name == name)
    }

    // Follows direct children only, e.g. ["specs", "power"].
    pub fn path(&self, segments: &[&str]) -> Option<&Element> {
        segments
            .iter()
            .try_fold(self, |element, segment| element.child(segment))
    }

    // Depth-first, pre-order, including `self`.
    pub fn find_first(&self, name: &str) -> Option<&Element> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find_first(name))
    }

    pub fn find_all<'a>(&'a self, name: &str, out: &mut Vec<&'a Element>) {
        if self.name == name {
            out.push(self);
        }
        for child in &self.children {
            child.find_all(name, out);
        }
    }

    pub fn trimmed_text(&self) -> Option<&str> {
        let text = self.text.trim();
        (!text.is_empty()).then_some(text)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Document {
    pub path: PathBuf,
    pub root: Element,
}

impl Document {
    pub fn open(path: &Path) -> Result<Self, IngestError> {
        let raw = fs::read_to_string(path).map_err(|source| IngestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &raw)
    }

    pub fn parse(path: &Path, raw: &str) -> Result<Self, IngestError> {
        let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
        let xml_error = |source: quick_xml::Error| IngestError::Xml {
            path: path.to_path_buf(),
            source,
        };
        let malformed = |detail: &str| IngestError::Malformed {
            path: path.to_path_buf(),
            detail: detail.to_string(),
        };

        let mut reader = Reader::from_str(raw);

        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event().map_err(xml_error)? {
                Event::Start(start) => stack.push(element_from_start(&start).map_err(xml_error)?),
                Event::Empty(start) => {
                    let element = element_from_start(&start).map_err(xml_error)?;
                    attach(&mut stack, &mut root, element).map_err(malformed)?;
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| malformed("closing tag without opening tag"))?;
                    attach(&mut stack, &mut root, element).map_err(malformed)?;
                }
                Event::Text(text) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&text.unescape().map_err(xml_error)?);
                    }
                }
                Event::CData(data) => {
                    if let Some(current) = stack.last_mut() {
                        current
                            .text
                            .push_str(&String::from_utf8_lossy(&data.into_inner()));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(malformed("document ended inside an open element"));
        }

        let root = root.ok_or_else(|| malformed("document has no root element"))?;
        Ok(Self {
            path: path.to_path_buf(),
            root,
        })
    }

    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }
}

fn element_from_start(start: &BytesStart<'_>) -> Result<Element, quick_xml::Error> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attributes = Vec::new();

    for attribute in start.attributes() {
        let attribute = attribute?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute.unescape_value()?.into_owned();
        attributes.push((key, value));
    }

    Ok(Element {
        name,
        attributes,
        ..Element::default()
    })
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), &'static str> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(element);
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        None => Err("document has more than one root element"),
    }
}
