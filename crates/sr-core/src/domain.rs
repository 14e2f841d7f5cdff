/// Strong reference to a post: its URI plus the content hash (CID) of the
/// revision being addressed.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StrongRef {
    pub uri: String,
    pub cid: String,
}

impl StrongRef {
    pub fn new(uri: impl Into<String>, cid: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            cid: cid.into(),
        }
    }
}

/// The (parent, root) pair that anchors a reply inside a conversation.
///
/// `root` is always the top-of-thread post. For a reply to a top-level post
/// `parent == root`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ThreadRef {
    pub parent: StrongRef,
    pub root: StrongRef,
}

/// One post from the fetched timeline. Read-only for the duration of a cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimelineEntry {
    pub uri: String,
    pub cid: String,
    pub author_handle: String,
    pub text: String,
    /// Present when the post is itself a reply.
    pub reply: Option<ThreadRef>,
}

impl TimelineEntry {
    pub fn strong_ref(&self) -> StrongRef {
        StrongRef::new(&self.uri, &self.cid)
    }

    pub fn is_reply(&self) -> bool {
        self.reply.is_some()
    }
}

/// Account identity returned by a successful login.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Profile {
    pub did: String,
    pub handle: String,
    pub display_name: Option<String>,
}

impl Profile {
    pub fn display_label(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(&self.handle)
    }
}

/// Reply text produced by the completion service. Never empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedReply {
    pub text: String,
}
