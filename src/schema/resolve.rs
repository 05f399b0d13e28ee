// src/schema/resolve.rs

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use super::fields::{Fallback, FieldRule, SemanticField, RESOLUTION_TABLE};

/// A source column a semantic field was bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedColumn {
    /// Position in the source header row.
    pub index: usize,
    /// The label exactly as the source spelled it.
    pub label: String,
}

/// Semantic field → source column. Fields missing from the map are unresolved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldMapping {
    columns: BTreeMap<SemanticField, ResolvedColumn>,
}

impl FieldMapping {
    pub fn get(&self, field: SemanticField) -> Option<&ResolvedColumn> {
        self.columns.get(&field)
    }

    pub fn index(&self, field: SemanticField) -> Option<usize> {
        self.columns.get(&field).map(|c| c.index)
    }

    pub fn is_resolved(&self, field: SemanticField) -> bool {
        self.columns.contains_key(&field)
    }

    pub fn unresolved(&self) -> Vec<SemanticField> {
        SemanticField::ALL
            .into_iter()
            .filter(|f| !self.is_resolved(*f))
            .collect()
    }
}

/// Infer which header carries each semantic field.
///
/// Matching is case-insensitive substring containment. Candidates are tried
/// in priority order; the first candidate found anywhere binds the field to
/// the first header (in source order) containing it.
pub fn resolve_fields(headers: &[String]) -> FieldMapping {
    let lowered: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
    let mut columns = BTreeMap::new();

    for rule in RESOLUTION_TABLE {
        match resolve_rule(rule, &lowered) {
            Some(index) => {
                debug!(field = %rule.field, column = %headers[index], "resolved");
                columns.insert(
                    rule.field,
                    ResolvedColumn {
                        index,
                        label: headers[index].clone(),
                    },
                );
            }
            None => debug!(field = %rule.field, "unresolved"),
        }
    }

    FieldMapping { columns }
}

fn resolve_rule(rule: &FieldRule, lowered: &[String]) -> Option<usize> {
    rule.candidates
        .iter()
        .find_map(|pat| lowered.iter().position(|h| h.contains(pat)))
        .or_else(|| match rule.fallback {
            Fallback::Unresolved => None,
            Fallback::Contains(kw) => lowered.iter().position(|h| h.contains(kw)),
            Fallback::StartsWith(kw) => lowered.iter().position(|h| h.starts_with(kw)),
            Fallback::FirstColumn => (!lowered.is_empty()).then_some(0),
        })
}
