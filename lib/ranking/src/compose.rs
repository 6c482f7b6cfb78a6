//! Role-bucketed slate composition
//!
//! For each requested role: filter the corpus to that role (and the query
//! industry), hybrid-score the pool, diversify it with MMR, then truncate to
//! the role's cap. Picks are de-duplicated across roles and flattened into
//! one list in canonical page order.

use crate::mmr::{self, MmrConfig, DEFAULT_LAMBDA};
use crate::rewrite::{merge_keywords, prepare_copy};
use crate::scorer::{HybridScorer, IndexView, QueryContext, ScoreWeights, ScoredCandidate};
use ahash::AHashSet;
use blueprint_core::hashing::fingerprint64;
use blueprint_core::{AllOf, Filter, IndustryFilter, PageRole, RoleFilter, TemplateEntry, Vector};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

pub const DEFAULT_K_PER_ROLE: usize = 3;
pub const DEFAULT_IMAGE_KEYWORD_CAP: usize = 24;

/// Knobs shared by every composition
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComposerConfig {
    pub weights: ScoreWeights,
    pub mmr_lambda: f64,
    pub image_keyword_cap: usize,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            mmr_lambda: DEFAULT_LAMBDA,
            image_keyword_cap: DEFAULT_IMAGE_KEYWORD_CAP,
        }
    }
}

/// A role-balanced retrieval request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComposeRequest {
    pub query_terms: Vec<String>,
    pub industry: String,
    pub style: String,
    pub need_images: bool,
    /// Empty means [`PageRole::DEFAULT_ORDER`]
    pub role_hints: Vec<String>,
    pub k_per_role: usize,
}

impl Default for ComposeRequest {
    fn default() -> Self {
        Self {
            query_terms: Vec::new(),
            industry: String::new(),
            style: String::new(),
            need_images: true,
            role_hints: Vec::new(),
            k_per_role: DEFAULT_K_PER_ROLE,
        }
    }
}

impl ComposeRequest {
    pub fn new<I, S>(query_terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            query_terms: query_terms.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_industry(mut self, industry: impl Into<String>) -> Self {
        self.industry = industry.into();
        self
    }

    #[must_use]
    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = style.into();
        self
    }

    #[must_use]
    pub fn with_need_images(mut self, need_images: bool) -> Self {
        self.need_images = need_images;
        self
    }

    #[must_use]
    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.role_hints = roles.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_k_per_role(mut self, k: usize) -> Self {
        self.k_per_role = k;
        self
    }

    /// Non-blank terms then the style, space-joined
    pub fn query_text(&self) -> String {
        self.query_terms
            .iter()
            .map(|t| t.trim())
            .chain(std::iter::once(self.style.trim()))
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Requested role slots in request order, repeats removed. Hints that
    /// name no known role keep their trimmed, lowercased label.
    pub fn resolved_roles(&self) -> Vec<RoleSlot> {
        if self.role_hints.iter().all(|h| h.trim().is_empty()) {
            return PageRole::DEFAULT_ORDER.iter().copied().map(RoleSlot::Known).collect();
        }

        let mut seen = AHashSet::new();
        let mut slots = Vec::new();
        for hint in &self.role_hints {
            let hint = hint.trim();
            if hint.is_empty() {
                continue;
            }
            let slot = match hint.parse::<PageRole>() {
                Ok(role) => RoleSlot::Known(role),
                Err(_) => RoleSlot::Unknown(hint.to_lowercase()),
            };
            if seen.insert(slot.label().to_string()) {
                slots.push(slot);
            }
        }
        slots
    }

    /// Stable memoization key. Roles enter in request order, so the same set
    /// in a different order is a different key.
    pub fn cache_key(&self) -> u64 {
        let roles: Vec<String> = self
            .resolved_roles()
            .iter()
            .map(|slot| slot.label().to_string())
            .collect();
        fingerprint64(&[
            "compose-v1".to_string(),
            self.industry.trim().to_lowercase(),
            self.style.trim().to_lowercase(),
            self.query_text(),
            roles.join(","),
            self.k_per_role.to_string(),
            self.need_images.to_string(),
        ])
    }
}

/// A requested role, known or not
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleSlot {
    Known(PageRole),
    Unknown(String),
}

impl RoleSlot {
    pub fn label(&self) -> &str {
        match self {
            RoleSlot::Known(role) => role.as_str(),
            RoleSlot::Unknown(label) => label,
        }
    }
}

/// One entry in a slate, with its selection metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectedTemplate {
    pub ordinal: usize,
    pub role: PageRole,
    pub score: f64,
    pub template: TemplateEntry,
}

/// Picks for one requested role, in MMR pick order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleSelection {
    pub role: String,
    pub templates: Vec<SelectedTemplate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Slate {
    pub by_role: Vec<RoleSelection>,
    /// Every pick once, in canonical page order
    pub templates: Vec<SelectedTemplate>,
    pub image_keywords: Vec<String>,
    /// Component type -> prop name -> default value
    pub schema_defaults: Map<String, Value>,
}

impl Slate {
    /// A slate with one empty bucket per slot
    pub fn empty(slots: &[RoleSlot]) -> Self {
        Self {
            by_role: slots
                .iter()
                .map(|slot| RoleSelection {
                    role: slot.label().to_string(),
                    templates: Vec::new(),
                })
                .collect(),
            ..Self::default()
        }
    }

    /// Picks for `role`; empty when the role was not requested or had no pool
    pub fn for_role(&self, role: &str) -> &[SelectedTemplate] {
        let role = role.trim().to_lowercase();
        self.by_role
            .iter()
            .find(|sel| sel.role == role)
            .map(|sel| sel.templates.as_slice())
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// Everything learned about one role while composing
pub(crate) struct RoleOutcome<'a> {
    pub slot: RoleSlot,
    pub pool_size: usize,
    pub scored: Vec<ScoredCandidate<'a>>,
    /// Picks that survived the cap and cross-role de-duplication
    pub kept: Vec<ScoredCandidate<'a>>,
}

pub struct Composer<'a> {
    view: IndexView<'a>,
    config: ComposerConfig,
}

impl<'a> Composer<'a> {
    pub fn new(view: IndexView<'a>, config: ComposerConfig) -> Self {
        Self { view, config }
    }

    /// Compose a slate. `query_vector` is the embedding of
    /// [`ComposeRequest::query_text`]. Never fails: roles without a pool,
    /// unknown roles, and blank queries all produce empty buckets.
    pub fn compose(&self, request: &ComposeRequest, query_vector: &Vector) -> Slate {
        let slots = request.resolved_roles();
        let text = request.query_text();
        if text.is_empty() {
            return Slate::empty(&slots);
        }

        let query = QueryContext::new(&text, query_vector.clone(), &request.industry, request.need_images);
        let outcomes = self.run_roles(&slots, &query, request.k_per_role);
        self.assemble(outcomes, request.need_images)
    }

    pub(crate) fn run_roles(
        &self,
        slots: &[RoleSlot],
        query: &QueryContext,
        k_per_role: usize,
    ) -> Vec<RoleOutcome<'a>> {
        let scorer = HybridScorer::new(self.view, self.config.weights);
        let mut seen: AHashSet<String> = AHashSet::new();

        slots
            .iter()
            .map(|slot| {
                let RoleSlot::Known(role) = slot else {
                    warn!(role = %slot.label(), "Unknown role hint, leaving bucket empty");
                    return RoleOutcome {
                        slot: slot.clone(),
                        pool_size: 0,
                        scored: Vec::new(),
                        kept: Vec::new(),
                    };
                };
                let role = *role;

                let filters: Vec<Box<dyn Filter + Send + Sync>> = vec![
                    Box::new(RoleFilter::new(role)),
                    Box::new(IndustryFilter::new(&query.industry)),
                ];
                let filter = AllOf::new(filters);
                let pool: Vec<usize> = self
                    .view
                    .corpus
                    .iter()
                    .filter(|(_, entry)| filter.matches(entry))
                    .map(|(ordinal, _)| ordinal)
                    .collect();
                if pool.is_empty() {
                    debug!(role = %role, industry = %query.industry, "Empty candidate pool");
                }

                let scored = scorer.score_pool(pool.iter().copied(), query, Some(role));
                let mmr_config = MmrConfig::new(self.config.mmr_lambda, k_per_role);
                let kept: Vec<ScoredCandidate<'a>> = mmr::select(scored.clone(), mmr_config)
                    .into_iter()
                    .filter(|c| seen.insert(c.entry.dedup_key(role)))
                    .take(role.cap())
                    .collect();

                RoleOutcome {
                    slot: slot.clone(),
                    pool_size: pool.len(),
                    scored,
                    kept,
                }
            })
            .collect()
    }

    fn assemble(&self, outcomes: Vec<RoleOutcome<'a>>, need_images: bool) -> Slate {
        let mut slate = Slate::default();

        for outcome in outcomes {
            let templates: Vec<SelectedTemplate> = outcome
                .kept
                .iter()
                .filter_map(|c| {
                    Some(SelectedTemplate {
                        ordinal: c.ordinal,
                        role: c.role?,
                        score: c.score,
                        template: prepare_copy(c.entry, need_images),
                    })
                })
                .collect();
            slate.templates.extend(templates.iter().cloned());
            slate.by_role.push(RoleSelection {
                role: outcome.slot.label().to_string(),
                templates,
            });
        }

        // Stable: picks of one role keep their pick order
        slate.templates.sort_by_key(|t| t.role.priority());

        slate.image_keywords = merge_keywords(
            slate.templates.iter().map(|t| t.template.image_keywords.as_slice()),
            self.config.image_keyword_cap,
        );
        slate.schema_defaults = merge_schema_defaults(slate.templates.iter().map(|t| &t.template));
        slate
    }
}

/// `type -> {prop -> default}`: example props first (first entry of a type
/// wins each key), then `null` for schema keys still missing
pub fn merge_schema_defaults<'e, I>(entries: I) -> Map<String, Value>
where
    I: IntoIterator<Item = &'e TemplateEntry>,
{
    let mut defaults: Map<String, Value> = Map::new();
    for entry in entries {
        let slot = defaults
            .entry(entry.kind.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        let Value::Object(props) = slot else { continue };

        for (key, value) in &entry.example_props {
            props.entry(key.clone()).or_insert_with(|| value.clone());
        }
        for key in entry.schema_keys() {
            props.entry(key.to_string()).or_insert(Value::Null);
        }
    }
    defaults
}
