use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Coarse structural slot a component occupies on a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PageRole {
    Header,
    Hero,
    Value,
    Media,
    SocialProof,
    Conversion,
    CoreContent,
    #[default]
    Aux,
    Footer,
}

impl PageRole {
    /// Page order used when no role hints are given. Also the priority order
    /// of the flattened slate.
    pub const DEFAULT_ORDER: [PageRole; 9] = [
        PageRole::Header,
        PageRole::Hero,
        PageRole::Value,
        PageRole::Media,
        PageRole::SocialProof,
        PageRole::Conversion,
        PageRole::CoreContent,
        PageRole::Aux,
        PageRole::Footer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PageRole::Header => "header",
            PageRole::Hero => "hero",
            PageRole::Value => "value",
            PageRole::Media => "media",
            PageRole::SocialProof => "social-proof",
            PageRole::Conversion => "conversion",
            PageRole::CoreContent => "core-content",
            PageRole::Aux => "aux",
            PageRole::Footer => "footer",
        }
    }

    /// Lenient parse for dataset values: unknown or blank resolves to `Aux`
    pub fn parse_lenient(raw: &str) -> PageRole {
        raw.parse().unwrap_or_default()
    }

    /// Header, hero and footer appear once per page
    pub fn is_singleton(&self) -> bool {
        matches!(self, PageRole::Header | PageRole::Hero | PageRole::Footer)
    }

    /// Maximum picks this role contributes to a slate
    pub fn cap(&self) -> usize {
        if self.is_singleton() {
            1
        } else {
            2
        }
    }

    /// Position in [`PageRole::DEFAULT_ORDER`]
    pub fn priority(&self) -> usize {
        Self::DEFAULT_ORDER
            .iter()
            .position(|r| r == self)
            .unwrap_or(Self::DEFAULT_ORDER.len())
    }
}

/// Error for role hints that name no known role
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown page role: {0:?}")]
pub struct UnknownRole(pub String);

impl FromStr for PageRole {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == '_' || c == ' ' { '-' } else { c })
            .collect();

        Self::DEFAULT_ORDER
            .iter()
            .copied()
            .find(|role| role.as_str() == normalized)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

impl fmt::Display for PageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for PageRole {
    fn from(s: String) -> Self {
        PageRole::parse_lenient(&s)
    }
}

impl From<PageRole> for String {
    fn from(role: PageRole) -> Self {
        role.as_str().to_string()
    }
}
