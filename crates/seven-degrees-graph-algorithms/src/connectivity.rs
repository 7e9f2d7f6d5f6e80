//! Connectivity of the undirected relationship graph

use super::common::GraphView;

/// Component label per dense index
#[derive(Debug, Clone, PartialEq)]
pub struct Components {
    /// Component of each dense index, numbered by first appearance
    pub labels: Vec<usize>,
    /// Node count per component
    pub sizes: Vec<usize>,
}

impl Components {
    pub fn count(&self) -> usize {
        self.sizes.len()
    }

    pub fn same(&self, a: usize, b: usize) -> bool {
        match (self.labels.get(a), self.labels.get(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }

    /// Size of the biggest component, 0 for an empty view
    pub fn largest(&self) -> usize {
        self.sizes.iter().copied().max().unwrap_or(0)
    }
}

/// Label every node with its component by flood fill.
///
/// Isolated nodes form components of their own.
pub fn connected_components(view: &GraphView) -> Components {
    const UNSEEN: usize = usize::MAX;
    let mut labels = vec![UNSEEN; view.node_count];
    let mut sizes = Vec::new();
    let mut stack = Vec::new();

    for start in 0..view.node_count {
        if labels[start] != UNSEEN {
            continue;
        }
        let label = sizes.len();
        let mut size = 0;
        labels[start] = label;
        stack.push(start);
        while let Some(u) = stack.pop() {
            size += 1;
            for &v in view.neighbors(u) {
                if labels[v] == UNSEEN {
                    labels[v] = label;
                    stack.push(v);
                }
            }
        }
        sizes.push(size);
    }

    Components { labels, sizes }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::test_support::view;

    #[test]
    fn test_components() {
        // 0-1-2 and 3-4, 5 isolated
        let view = view(6, &[(0, 1, 0.5), (1, 2, 0.5), (3, 4, 0.5)]);
        let result = connected_components(&view);

        assert_eq!(result.count(), 3);
        assert_eq!(result.sizes, vec![3, 2, 1]);
        assert_eq!(result.largest(), 3);
        assert!(result.same(0, 2));
        assert!(!result.same(2, 3));
        assert!(!result.same(5, 4));
        assert!(!result.same(0, 99));
    }

    #[test]
    fn test_empty_view() {
        let view = view(0, &[]);
        let result = connected_components(&view);
        assert_eq!(result.count(), 0);
        assert_eq!(result.largest(), 0);
    }
}
