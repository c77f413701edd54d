//! Projectivity precomputations over gold trees.

use crate::system::DependencyTree;

/// Projective visiting order of a gold tree.
///
/// Assigned by a left/self/right depth-first traversal: every token is
/// visited after its dependents to the left and before its dependents to
/// the right. For a projective tree this is the surface order; for a
/// non-projective tree it is the order the transition system has to
/// restore through swaps.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProjectiveOrder {
    order: Vec<usize>,
}

impl ProjectiveOrder {
    pub fn of(tree: &DependencyTree) -> Self {
        let mut order = vec![0; tree.len() + 1];
        let mut counter = 0;
        visit(tree, 0, &mut order, &mut counter);
        ProjectiveOrder { order }
    }

    /// Visiting index of a token.
    pub fn index(&self, token: usize) -> usize {
        self.order[token]
    }
}

fn visit(tree: &DependencyTree, token: usize, order: &mut [usize], counter: &mut usize) {
    for &child in tree.children(token) {
        if child < token {
            visit(tree, child, order, counter);
        }
    }

    order[token] = *counter;
    *counter += 1;

    for &child in tree.children(token) {
        if child > token {
            visit(tree, child, order, counter);
        }
    }
}

/// Heads of the maximal projective subcomponents of a gold tree.
///
/// Computed by simulating a shift-reduce pass: an adjacent pair reduces
/// when one member is the gold head of the other and the dependent has
/// collected all of its own dependents. What survives the pass are the
/// subtrees a parser can build without any reordering, each represented
/// by its head token.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Subcomponents {
    head: Vec<usize>,
}

impl Subcomponents {
    pub fn of(tree: &DependencyTree) -> Self {
        let n_tokens = tree.len();
        let mut parent = (0..=n_tokens).collect::<Vec<_>>();
        let mut collected = vec![0; n_tokens + 1];
        let mut items = (1..=n_tokens).collect::<Vec<_>>();

        loop {
            let mut changed = false;
            let mut idx = 0;
            while idx + 1 < items.len() {
                let (left, right) = (items[idx], items[idx + 1]);
                if tree.head(right) == left && collected[right] == tree.children(right).len() {
                    parent[right] = left;
                    collected[left] += 1;
                    items.remove(idx + 1);
                    changed = true;
                } else if tree.head(left) == right
                    && collected[left] == tree.children(left).len()
                {
                    parent[left] = right;
                    collected[right] += 1;
                    items.remove(idx);
                    changed = true;
                } else {
                    idx += 1;
                }
            }

            if !changed {
                break;
            }
        }

        let head = (0..=n_tokens)
            .map(|token| {
                let mut current = token;
                while parent[current] != current {
                    current = parent[current];
                }
                current
            })
            .collect();

        Subcomponents { head }
    }

    /// Head token of the subcomponent containing `token`.
    pub fn head_of(&self, token: usize) -> usize {
        self.head[token]
    }

    pub fn is_head(&self, token: usize) -> bool {
        self.head[token] == token
    }
}
