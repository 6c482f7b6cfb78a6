// Candidate filters applied before scoring
use crate::{PageRole, TemplateEntry};

pub trait Filter {
    fn matches(&self, entry: &TemplateEntry) -> bool;
}

/// Exact page-role match
#[derive(Debug, Clone, Copy)]
pub struct RoleFilter {
    role: PageRole,
}

impl RoleFilter {
    pub fn new(role: PageRole) -> Self {
        Self { role }
    }
}

impl Filter for RoleFilter {
    fn matches(&self, entry: &TemplateEntry) -> bool {
        entry.page_role == self.role
    }
}

/// Keeps entries whose labels fuzzily mention the industry. Entries tagged
/// `general` always pass, and a blank industry passes everything.
#[derive(Debug, Clone)]
pub struct IndustryFilter {
    industry: String,
}

impl IndustryFilter {
    pub fn new(industry: &str) -> Self {
        Self {
            industry: industry.trim().to_lowercase(),
        }
    }
}

impl Filter for IndustryFilter {
    fn matches(&self, entry: &TemplateEntry) -> bool {
        self.industry.is_empty()
            || entry.is_general()
            || entry
                .labels()
                .any(|label| fuzzy_mentions_industry(label, &self.industry))
    }
}

/// All inner filters must match
pub struct AllOf(Vec<Box<dyn Filter + Send + Sync>>);

impl AllOf {
    pub fn new(filters: Vec<Box<dyn Filter + Send + Sync>>) -> Self {
        Self(filters)
    }
}

impl Filter for AllOf {
    fn matches(&self, entry: &TemplateEntry) -> bool {
        self.0.iter().all(|f| f.matches(entry))
    }
}

/// Substring-or-equality, case-insensitive: the label equals or contains the
/// industry. A blank industry never matches.
pub fn mentions_industry(label: &str, industry: &str) -> bool {
    let industry = industry.trim().to_lowercase();
    if industry.is_empty() {
        return false;
    }
    label.trim().to_lowercase().contains(&industry)
}

/// [`mentions_industry`], plus the reverse containment ("restaurant & food"
/// mentions the label "food") and a shared word of three or more characters.
pub fn fuzzy_mentions_industry(label: &str, industry: &str) -> bool {
    if mentions_industry(label, industry) {
        return true;
    }

    let label = label.trim().to_lowercase();
    let industry = industry.trim().to_lowercase();
    if label.len() < 3 || industry.is_empty() {
        return false;
    }
    if industry.contains(&label) {
        return true;
    }

    let words = |s: &str| -> Vec<String> {
        s.split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.chars().count() >= 3)
            .map(str::to_string)
            .collect()
    };
    let label_words = words(&label);
    words(&industry).iter().any(|w| label_words.contains(w))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mentions_industry_is_case_insensitive_substring() {
        assert!(mentions_industry("Restaurant", "restaurant"));
        assert!(mentions_industry("fine-dining restaurant", "RESTAURANT"));
        assert!(!mentions_industry("food", "restaurant"));
        assert!(!mentions_industry("anything", "  "));
    }

    #[test]
    fn test_fuzzy_mentions() {
        assert!(fuzzy_mentions_industry("food", "Restaurant & Food"));
        assert!(fuzzy_mentions_industry("health clinic", "mental health"));
        assert!(!fuzzy_mentions_industry("tech", "restaurant"));
        assert!(!fuzzy_mentions_industry("a", "a & b"));
    }

    #[test]
    fn test_industry_filter_general_exemption() {
        let filter = IndustryFilter::new("restaurant");
        let general = TemplateEntry::new("Footer", PageRole::Footer).with_tags(["general"]);
        let tech = TemplateEntry::new("Hero", PageRole::Hero).with_industries(["tech"]);
        let food = TemplateEntry::new("Hero", PageRole::Hero).with_industries(["Restaurant"]);
        assert!(filter.matches(&general));
        assert!(!filter.matches(&tech));
        assert!(filter.matches(&food));
        assert!(IndustryFilter::new("").matches(&tech));
    }

    #[test]
    fn test_all_of() {
        let filters: Vec<Box<dyn Filter + Send + Sync>> = vec![
            Box::new(RoleFilter::new(PageRole::Hero)),
            Box::new(IndustryFilter::new("tech")),
        ];
        let filter = AllOf::new(filters);
        let hero = TemplateEntry::new("Hero", PageRole::Hero).with_tags(["tech"]);
        let footer = TemplateEntry::new("Footer", PageRole::Footer).with_tags(["tech"]);
        assert!(filter.matches(&hero));
        assert!(!filter.matches(&footer));
    }
}
