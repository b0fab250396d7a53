use std::collections::HashMap;

/// Element kinds found directly under the `<osm>` root. Only nodes and ways
/// become records; everything else is carried as `Other` with its tag name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Node,
    Way,
    Other(String),
}

impl ElementKind {
    pub fn from_name(name: &[u8]) -> ElementKind {
        match name {
            b"node" => ElementKind::Node,
            b"way" => ElementKind::Way,
            other => ElementKind::Other(String::from_utf8_lossy(other).into_owned()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ElementKind::Node => "node",
            ElementKind::Way => "way",
            ElementKind::Other(name) => name,
        }
    }
}

/// A `<tag k=".." v=".."/>` child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub k: String,
    pub v: String,
}

impl Tag {
    pub fn new(k: impl Into<String>, v: impl Into<String>) -> Tag {
        Tag {
            k: k.into(),
            v: v.into(),
        }
    }
}

/// One top-level element as read from the stream, children included.
/// Lives only until it has been shaped.
#[derive(Debug, Clone, PartialEq)]
pub struct RawElement {
    pub kind: ElementKind,
    pub attributes: HashMap<String, String>,
    pub tags: Vec<Tag>,
    /// `ref` of every `<nd>` child, document order.
    pub node_refs: Vec<String>,
}

impl RawElement {
    pub fn new(kind: ElementKind) -> RawElement {
        RawElement {
            kind,
            attributes: HashMap::new(),
            tags: Vec::new(),
            node_refs: Vec::new(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn id(&self) -> Option<&str> {
        self.attribute("id")
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> RawElement {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_tag(mut self, k: &str, v: &str) -> RawElement {
        self.tags.push(Tag::new(k, v));
        self
    }

    pub fn with_node_ref(mut self, node_ref: &str) -> RawElement {
        self.node_refs.push(node_ref.to_string());
        self
    }
}
