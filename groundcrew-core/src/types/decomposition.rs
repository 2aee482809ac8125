//! ABOUTME: Query decomposition DAG — sub-queries with dependency edges

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// A single sub-query in a decomposition DAG.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubQuery {
    pub id: String,
    pub text: String,
    /// Ids of sub-queries whose answers must be available before this one runs.
    pub depends_on: Vec<String>,
}

/// A validated decomposition of one question into a DAG of sub-queries.
///
/// Construction is the only way to obtain one: `DecomposedQuery::new`
/// rejects unknown dependency ids and cycles so downstream execution never
/// has to re-check acyclicity (`spec.md` §4.1 step 5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecomposedQuery {
    pub original: String,
    pub sub_queries: Vec<SubQuery>,
}

impl DecomposedQuery {
    /// Validate `sub_queries` and return an execution order (topological
    /// sort, stable on input order among ties).
    pub fn new(original: impl Into<String>, sub_queries: Vec<SubQuery>) -> Result<Self> {
        let ids: HashSet<&str> = sub_queries.iter().map(|s| s.id.as_str()).collect();
        if ids.len() != sub_queries.len() {
            return Err(CoreError::Validation {
                message: "duplicate sub-query ids".into(),
            });
        }
        for sub in &sub_queries {
            for dep in &sub.depends_on {
                if !ids.contains(dep.as_str()) {
                    return Err(CoreError::Validation {
                        message: format!("sub-query {} depends on unknown id {dep}", sub.id),
                    });
                }
            }
        }
        let decomposed = Self {
            original: original.into(),
            sub_queries,
        };
        decomposed.topological_order()?;
        Ok(decomposed)
    }

    /// Kahn's algorithm; returns an error if a cycle is present.
    pub fn topological_order(&self) -> Result<Vec<&str>> {
        let mut in_degree = std::collections::HashMap::new();
        let mut dependents: std::collections::HashMap<&str, Vec<&str>> = std::collections::HashMap::new();
        for sub in &self.sub_queries {
            in_degree.entry(sub.id.as_str()).or_insert(0);
            for dep in &sub.depends_on {
                *in_degree.entry(sub.id.as_str()).or_insert(0) += 1;
                dependents.entry(dep.as_str()).or_default().push(sub.id.as_str());
            }
        }

        let mut ready: VecDeque<&str> = self
            .sub_queries
            .iter()
            .map(|s| s.id.as_str())
            .filter(|id| in_degree.get(id).copied().unwrap_or(0) == 0)
            .collect();
        let mut order = Vec::with_capacity(self.sub_queries.len());

        while let Some(id) = ready.pop_front() {
            order.push(id);
            if let Some(children) = dependents.get(id) {
                for &child in children {
                    let degree = in_degree.get_mut(child).expect("child tracked in in_degree");
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push_back(child);
                    }
                }
            }
        }

        if order.len() != self.sub_queries.len() {
            return Err(CoreError::Invariant {
                message: "sub-query dependency graph contains a cycle".into(),
            });
        }
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sub(id: &str, deps: &[&str]) -> SubQuery {
        SubQuery {
            id: id.to_string(),
            text: format!("query {id}"),
            depends_on: deps.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn accepts_a_valid_dag_and_orders_dependencies_first() {
        let decomposed = DecomposedQuery::new(
            "compare population growth in A and B",
            vec![sub("a", &[]), sub("b", &[]), sub("c", &["a", "b"])],
        )
        .unwrap();
        let order = decomposed.topological_order().unwrap();
        assert_eq!(order.last(), Some(&"c"));
    }

    #[test]
    fn rejects_unknown_dependency_ids() {
        let result = DecomposedQuery::new("q", vec![sub("a", &["missing"])]);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_a_cycle() {
        let result = DecomposedQuery::new("q", vec![sub("a", &["b"]), sub("b", &["a"])]);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_duplicate_ids() {
        let result = DecomposedQuery::new("q", vec![sub("a", &[]), sub("a", &[])]);
        assert!(result.is_err());
    }
}
