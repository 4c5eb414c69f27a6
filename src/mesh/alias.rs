//! Vertex alias chains produced by duplicate collapse.

use crate::dedup::SubstitutionMap;
use crate::error::ConsolidationError;

/// Mapping from vertex ids to the id they were merged into.
///
/// Entries may chain (`a -> b -> c`); [`AliasMap::resolve_all`] follows every
/// chain to the id that maps to itself and rejects cycles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasMap {
    target: Vec<usize>,
}

impl AliasMap {
    /// Identity map over `n` ids.
    #[must_use]
    pub fn identity(n: usize) -> Self {
        Self {
            target: (0..n).collect(),
        }
    }

    #[must_use]
    pub fn from_targets(target: Vec<usize>) -> Self {
        Self { target }
    }

    /// Points `id` at `target`.
    pub fn alias(&mut self, id: usize, target: usize) {
        self.target[id] = target;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.target.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.target.is_empty()
    }

    /// Follows the chain starting at `id` to its fixed point.
    ///
    /// # Errors
    ///
    /// Returns [`ConsolidationError::AliasCycle`] if the chain revisits an id
    /// and [`ConsolidationError::DanglingAlias`] if it leaves the map.
    pub fn resolve(&self, id: usize) -> Result<usize, ConsolidationError> {
        let mut visited = Vec::new();
        let mut current = id;
        loop {
            let next = self.next(current)?;
            if next == current {
                return Ok(current);
            }
            if visited.contains(&current) {
                return Err(ConsolidationError::AliasCycle {
                    vertex: id,
                    revisited: current,
                });
            }
            visited.push(current);
            current = next;
        }
    }

    /// Resolves every id, reusing finished chains.
    ///
    /// # Errors
    ///
    /// Same as [`AliasMap::resolve`].
    pub fn resolve_all(&self) -> Result<Vec<usize>, ConsolidationError> {
        let n = self.target.len();
        let mut root: Vec<Option<usize>> = vec![None; n];
        let mut on_path = vec![false; n];
        let mut path = Vec::new();

        for start in 0..n {
            if root[start].is_some() {
                continue;
            }
            let mut current = start;
            let resolved = loop {
                if let Some(r) = root[current] {
                    break r;
                }
                let next = self.next(current)?;
                if next == current {
                    break current;
                }
                if on_path[current] {
                    return Err(ConsolidationError::AliasCycle {
                        vertex: start,
                        revisited: current,
                    });
                }
                on_path[current] = true;
                path.push(current);
                current = next;
            };
            root[current] = Some(resolved);
            for id in path.drain(..) {
                on_path[id] = false;
                root[id] = Some(resolved);
            }
        }

        Ok(root.into_iter().map(|r| r.unwrap_or_default()).collect())
    }

    fn next(&self, id: usize) -> Result<usize, ConsolidationError> {
        let target = self.target[id];
        if target >= self.target.len() {
            return Err(ConsolidationError::DanglingAlias { vertex: id, target });
        }
        Ok(target)
    }
}

impl From<&SubstitutionMap> for AliasMap {
    fn from(map: &SubstitutionMap) -> Self {
        Self::from_targets(map.iter().map(|(_, rep)| rep).collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn identity_resolves_to_itself() {
        let map = AliasMap::identity(4);
        assert_eq!(map.resolve_all().unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn chains_resolve_to_fixed_point() {
        // 3 -> 2 -> 1 -> 0
        let map = AliasMap::from_targets(vec![0, 0, 1, 2, 4]);
        assert_eq!(map.resolve(3).unwrap(), 0);
        assert_eq!(map.resolve_all().unwrap(), vec![0, 0, 0, 0, 4]);
    }

    #[test]
    fn chains_may_point_forward() {
        let mut map = AliasMap::identity(3);
        map.alias(0, 2);
        map.alias(1, 0);
        assert_eq!(map.resolve_all().unwrap(), vec![2, 2, 2]);
    }

    #[test]
    fn cycle_fails_fast() {
        let map = AliasMap::from_targets(vec![1, 2, 0, 3]);
        let err = map.resolve(0).unwrap_err();
        assert!(matches!(err, ConsolidationError::AliasCycle { vertex: 0, .. }));
        let err = map.resolve_all().unwrap_err();
        assert!(matches!(err, ConsolidationError::AliasCycle { .. }));
    }

    #[test]
    fn cycle_behind_a_tail_is_detected() {
        // 0 -> 1 -> 2 -> 1
        let map = AliasMap::from_targets(vec![1, 2, 1]);
        assert!(matches!(
            map.resolve(0),
            Err(ConsolidationError::AliasCycle { vertex: 0, revisited: 1 })
        ));
    }

    #[test]
    fn dangling_target_is_an_error() {
        let map = AliasMap::from_targets(vec![0, 5]);
        assert!(matches!(
            map.resolve_all(),
            Err(ConsolidationError::DanglingAlias { vertex: 1, target: 5 })
        ));
    }

    #[test]
    fn built_from_substitution_map() {
        let subs = SubstitutionMap::from_targets(vec![0, 0, 2, 2]);
        let map = AliasMap::from(&subs);
        assert_eq!(map.resolve_all().unwrap(), vec![0, 0, 2, 2]);
    }
}
