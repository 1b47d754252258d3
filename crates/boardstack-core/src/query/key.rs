// ── Composite cache keys ──
//
// A key is an ordered list of segments built from the resource type and
// its parameters. Families share a prefix so one invalidation can reach
// every list or every detail of a resource.

use std::fmt;

/// One component of a [`QueryKey`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeySegment {
    Str(String),
    Int(i64),
    /// Filter descriptor for parameterised lists (search terms etc.).
    Filter(String),
}

impl From<&str> for KeySegment {
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}

impl From<String> for KeySegment {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for KeySegment {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl fmt::Display for KeySegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(n) => write!(f, "{n}"),
            Self::Filter(s) => write!(f, "{{{s}}}"),
        }
    }
}

/// Deterministic cache key, e.g. `("board","detail",42)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(Vec<KeySegment>);

impl QueryKey {
    pub fn new(resource: &str) -> Self {
        Self(vec![KeySegment::from(resource)])
    }

    /// Append a segment.
    #[must_use]
    pub fn with(mut self, segment: impl Into<KeySegment>) -> Self {
        self.0.push(segment.into());
        self
    }

    /// Append a filter descriptor segment.
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.0.push(KeySegment::Filter(filter.into()));
        self
    }

    pub fn segments(&self) -> &[KeySegment] {
        &self.0
    }

    /// `true` when `prefix`'s segments are a leading run of this key's.
    pub fn matches(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{seg}")?;
        }
        Ok(())
    }
}

// ── Key families ─────────────────────────────────────────────────────

/// Key constructors for one resource type.
#[derive(Debug, Clone, Copy)]
pub struct ResourceKeys {
    resource: &'static str,
}

impl ResourceKeys {
    pub const fn new(resource: &'static str) -> Self {
        Self { resource }
    }

    /// Every key of this resource.
    pub fn all(self) -> QueryKey {
        QueryKey::new(self.resource)
    }

    /// Every list (filtered or not).
    pub fn lists(self) -> QueryKey {
        self.all().with("list")
    }

    pub fn list(self, filter: impl Into<String>) -> QueryKey {
        self.lists().with_filter(filter)
    }

    /// Every detail entry.
    pub fn details(self) -> QueryKey {
        self.all().with("detail")
    }

    pub fn detail(self, id: impl Into<KeySegment>) -> QueryKey {
        self.details().with(id)
    }
}

pub const BOARDS: ResourceKeys = ResourceKeys::new("board");
pub const DEPLOYMENTS: ResourceKeys = ResourceKeys::new("deployment");

pub fn system_status() -> QueryKey {
    QueryKey::new("system-status")
}

pub fn openstack_health() -> QueryKey {
    QueryKey::new("openstack-health")
}
