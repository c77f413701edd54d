use serde_derive::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A labeled dependency arc.
///
/// `index` is the creation order within a sentence. Arcs are never mutated
/// after creation.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct Arc {
    pub dependent: usize,
    pub head: usize,
    pub label: String,
    pub index: usize,
}

/// A complete gold dependency tree over a sentence.
///
/// Every surface token has exactly one head; construction validates
/// completeness, index ranges, and acyclicity.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DependencyTree {
    heads: Vec<usize>,
    labels: Vec<String>,
    children: Vec<Vec<usize>>,
}

impl DependencyTree {
    /// Build a tree over `n_tokens` surface tokens from
    /// `(dependent, head, label)` triples.
    pub fn new<S>(n_tokens: usize, arcs: &[(usize, usize, S)]) -> Result<Self>
    where
        S: AsRef<str>,
    {
        let mut heads = vec![None; n_tokens + 1];
        let mut labels = vec![String::new(); n_tokens + 1];
        let mut children = vec![Vec::new(); n_tokens + 1];

        for &(dependent, head, ref label) in arcs {
            if dependent < 1 || dependent > n_tokens {
                return Err(Error::MalformedTree(format!(
                    "dependent {} outside 1..={}",
                    dependent, n_tokens
                )));
            }
            if head > n_tokens {
                return Err(Error::MalformedTree(format!(
                    "head {} outside 0..={}",
                    head, n_tokens
                )));
            }
            if dependent == head {
                return Err(Error::MalformedTree(format!(
                    "token {} is its own head",
                    dependent
                )));
            }
            if heads[dependent].is_some() {
                return Err(Error::MalformedTree(format!(
                    "token {} has multiple heads",
                    dependent
                )));
            }

            heads[dependent] = Some(head);
            labels[dependent] = label.as_ref().to_owned();
            children[head].push(dependent);
        }

        for (token, head) in heads.iter().enumerate().skip(1) {
            if head.is_none() {
                return Err(Error::MalformedTree(format!("token {} has no head", token)));
            }
        }

        for child_list in &mut children {
            child_list.sort();
        }

        let tree = DependencyTree {
            heads: heads
                .into_iter()
                .map(|head| head.unwrap_or(0))
                .collect(),
            labels,
            children,
        };

        // Single-headedness alone does not rule out cycles detached from ROOT.
        let mut reachable = 0;
        let mut stack = vec![0];
        let mut visited = vec![false; n_tokens + 1];
        visited[0] = true;
        while let Some(token) = stack.pop() {
            reachable += 1;
            for &child in tree.children(token) {
                if !visited[child] {
                    visited[child] = true;
                    stack.push(child);
                }
            }
        }
        if reachable != n_tokens + 1 {
            return Err(Error::MalformedTree(
                "gold arcs contain a cycle".to_owned(),
            ));
        }

        Ok(tree)
    }

    /// Number of surface tokens.
    pub fn len(&self) -> usize {
        self.heads.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn head(&self, token: usize) -> usize {
        self.heads[token]
    }

    pub fn label(&self, token: usize) -> &str {
        &self.labels[token]
    }

    /// Dependents of `token` in surface order.
    pub fn children(&self, token: usize) -> &[usize] {
        &self.children[token]
    }
}
