//! Retrieval debug traces
//!
//! Re-runs composition and reports, per role, the filtered pool and the full
//! score breakdown of every candidate, so it is visible why a template did or
//! did not make the slate.

use crate::compose::{ComposeRequest, Composer};
use crate::scorer::{QueryContext, ScoreBreakdown};
use ahash::AHashSet;
use blueprint_core::Vector;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateTrace {
    pub ordinal: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub breakdown: ScoreBreakdown,
    /// Survived MMR, the role cap and cross-role de-duplication
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleTrace {
    pub role: String,
    pub known: bool,
    pub pool_size: usize,
    /// Every scored candidate, best first
    pub candidates: Vec<CandidateTrace>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalTrace {
    pub query: String,
    pub industry: String,
    pub need_images: bool,
    pub k_per_role: usize,
    pub roles: Vec<RoleTrace>,
}

impl RetrievalTrace {
    pub fn role(&self, role: &str) -> Option<&RoleTrace> {
        self.roles.iter().find(|r| r.role == role)
    }

    /// Ordinals that made the slate, per role in trace order
    pub fn selected(&self) -> impl Iterator<Item = (&str, usize)> {
        self.roles.iter().flat_map(|r| {
            r.candidates
                .iter()
                .filter(|c| c.selected)
                .map(move |c| (r.role.as_str(), c.ordinal))
        })
    }
}

impl Composer<'_> {
    /// Trace the composition of `request` without assembling a slate
    pub fn explain(&self, request: &ComposeRequest, query_vector: &Vector) -> RetrievalTrace {
        let slots = request.resolved_roles();
        let text = request.query_text();
        let mut trace = RetrievalTrace {
            query: text.clone(),
            industry: request.industry.trim().to_lowercase(),
            need_images: request.need_images,
            k_per_role: request.k_per_role,
            roles: Vec::with_capacity(slots.len()),
        };

        if text.is_empty() {
            trace.roles = slots
                .iter()
                .map(|slot| RoleTrace {
                    role: slot.label().to_string(),
                    known: matches!(slot, crate::compose::RoleSlot::Known(_)),
                    pool_size: 0,
                    candidates: Vec::new(),
                })
                .collect();
            return trace;
        }

        let query = QueryContext::new(&text, query_vector.clone(), &request.industry, request.need_images);
        for outcome in self.run_roles(&slots, &query, request.k_per_role) {
            let kept: AHashSet<usize> = outcome.kept.iter().map(|c| c.ordinal).collect();
            trace.roles.push(RoleTrace {
                role: outcome.slot.label().to_string(),
                known: matches!(outcome.slot, crate::compose::RoleSlot::Known(_)),
                pool_size: outcome.pool_size,
                candidates: outcome
                    .scored
                    .iter()
                    .map(|c| CandidateTrace {
                        ordinal: c.ordinal,
                        id: c.entry.id.clone(),
                        kind: c.entry.kind.clone(),
                        breakdown: c.breakdown,
                        selected: kept.contains(&c.ordinal),
                    })
                    .collect(),
            });
        }
        trace
    }
}
