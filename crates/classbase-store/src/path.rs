use std::fmt;

/// Longest document id Firestore accepts, in bytes.
pub const MAX_SEGMENT_BYTES: usize = 1500;

/// A collection or document id that cannot be a single path segment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid document path segment {0:?}")]
pub struct InvalidSegment(pub String);

/// Fails for ids Firestore rejects: empty, `.`, `..`, anything containing
/// `/`, reserved `__name__` ids and ids over [`MAX_SEGMENT_BYTES`].
pub fn check_segment(segment: &str) -> Result<(), InvalidSegment> {
    let reserved = segment.len() >= 4 && segment.starts_with("__") && segment.ends_with("__");
    let invalid = segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains('/')
        || reserved
        || segment.len() > MAX_SEGMENT_BYTES;

    if invalid {
        return Err(InvalidSegment(segment.to_string()));
    }
    Ok(())
}

/// Checks every segment of a collection path such as `schools/s1/classes`.
pub fn check_collection(collection: &str) -> Result<(), InvalidSegment> {
    collection.split('/').try_for_each(check_segment)
}

/// Address of a document: `collection/id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentPath {
    pub collection: String,
    pub id: String,
}

impl DocumentPath {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Like [`DocumentPath::new`], for ids that come from callers.
    pub fn try_new(
        collection: impl Into<String>,
        id: impl Into<String>,
    ) -> Result<Self, InvalidSegment> {
        let path = Self::new(collection, id);
        path.validate()?;
        Ok(path)
    }

    pub fn validate(&self) -> Result<(), InvalidSegment> {
        check_collection(&self.collection)?;
        check_segment(&self.id)
    }

    /// The path split into URL path segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.collection.split('/').chain(std::iter::once(self.id.as_str()))
    }

    /// Parses `collection/id`. Nested paths keep everything before the last
    /// segment as the collection.
    pub fn parse(raw: &str) -> Option<Self> {
        let (collection, id) = raw.trim_matches('/').rsplit_once('/')?;
        Self::try_new(collection, id).ok()
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}
