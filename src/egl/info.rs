use std::collections::BTreeSet;
use std::fmt;

use khronos_egl as egl;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct EglVersion {
    pub major: egl::Int,
    pub minor: egl::Int,
}

impl EglVersion {
    pub const V1_5: EglVersion = EglVersion { major: 1, minor: 5 };

    pub fn new(major: egl::Int, minor: egl::Int) -> Self {
        Self { major, minor }
    }

    /// Parses the leading "major.minor" of an `EGL_VERSION` string such as
    /// "1.5 Mesa 24.0.5".
    pub fn parse(version: &str) -> Option<Self> {
        let head = version.split_whitespace().next()?;
        let (major, rest) = head.split_once('.')?;
        let minor: String = rest.chars().take_while(char::is_ascii_digit).collect();
        Some(Self {
            major: major.parse().ok()?,
            minor: minor.parse().ok()?,
        })
    }

    pub fn at_least(self, other: EglVersion) -> bool {
        self >= other
    }
}

impl fmt::Display for EglVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// A space-separated extension string, split for lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extensions(BTreeSet<String>);

impl Extensions {
    pub fn parse(list: &str) -> Self {
        Self(list.split_whitespace().map(str::to_string).collect())
    }

    pub fn has(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
