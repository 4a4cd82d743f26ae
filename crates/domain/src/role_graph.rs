use std::collections::{HashMap, HashSet};

use crate::{Role, RoleHierarchyEdge, RoleId};

/// Unified inheritance graph over registered roles.
///
/// Both inheritance mechanisms feed the same adjacency list: a role's
/// `parent_role_id` pointer and every [`RoleHierarchyEdge`] naming it as the
/// child become direct-parent links. Links that point at unregistered roles are
/// kept but never followed, so a dangling pointer simply ends expansion.
#[derive(Debug, Clone, Default)]
pub struct RoleGraph {
    known_roles: HashSet<RoleId>,
    parents: HashMap<RoleId, Vec<RoleId>>,
}

impl RoleGraph {
    /// Builds the graph from registered roles and explicit hierarchy edges.
    #[must_use]
    pub fn from_parts<'a>(
        roles: impl IntoIterator<Item = &'a Role>,
        edges: impl IntoIterator<Item = &'a RoleHierarchyEdge>,
    ) -> Self {
        let mut graph = Self::default();

        for role in roles {
            graph.known_roles.insert(role.role_id().clone());
            if let Some(parent_role_id) = role.parent_role_id() {
                graph.add_parent(role.role_id(), parent_role_id);
            }
        }

        for edge in edges {
            graph.add_parent(edge.child_role_id(), edge.parent_role_id());
        }

        graph
    }

    fn add_parent(&mut self, child_role_id: &RoleId, parent_role_id: &RoleId) {
        let parents = self.parents.entry(child_role_id.clone()).or_default();
        if !parents.contains(parent_role_id) {
            parents.push(parent_role_id.clone());
        }
    }

    /// Returns whether the role is registered.
    #[must_use]
    pub fn contains(&self, role_id: &RoleId) -> bool {
        self.known_roles.contains(role_id)
    }

    /// Returns direct parents in link insertion order.
    #[must_use]
    pub fn direct_parents(&self, role_id: &RoleId) -> &[RoleId] {
        self.parents.get(role_id).map_or(&[], Vec::as_slice)
    }

    /// Returns the start roles plus every registered ancestor, in discovery order.
    ///
    /// Start roles come first (unregistered ones are skipped), followed by a
    /// depth-first walk of each start role's ancestors. Every role is expanded at
    /// most once, which keeps the walk finite when the hierarchy contains a cycle.
    /// The walk keeps its own stack, so chain depth is bounded only by memory.
    #[must_use]
    pub fn ancestors_closure<'a>(
        &self,
        start: impl IntoIterator<Item = &'a RoleId>,
    ) -> Vec<RoleId> {
        let mut visited = HashSet::new();
        let mut ordered = Vec::new();

        for role_id in start {
            if self.contains(role_id) && visited.insert(role_id.clone()) {
                ordered.push(role_id.clone());
            }
        }

        let direct = ordered.clone();
        let mut pending: Vec<RoleId> = Vec::new();
        for role_id in &direct {
            self.push_parents(role_id, &visited, &mut pending);

            while let Some(role_id) = pending.pop() {
                if !visited.insert(role_id.clone()) {
                    continue;
                }
                self.push_parents(&role_id, &visited, &mut pending);
                ordered.push(role_id);
            }
        }

        ordered
    }

    // Reversed so the first-linked parent is popped first.
    fn push_parents(
        &self,
        role_id: &RoleId,
        visited: &HashSet<RoleId>,
        pending: &mut Vec<RoleId>,
    ) {
        pending.extend(
            self.direct_parents(role_id)
                .iter()
                .rev()
                .filter(|parent_role_id| {
                    self.contains(parent_role_id) && !visited.contains(*parent_role_id)
                })
                .cloned(),
        );
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use chrono::Utc;
    use proptest::prelude::*;

    use super::RoleGraph;
    use crate::{Role, RoleHierarchyEdge, RoleId};

    fn role(role_id: &str) -> Role {
        Role::new(role_id, role_id, Utc::now()).unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn closure_unions_parent_pointer_and_edges() {
        let roles = vec![
            role("viewer"),
            role("editor").with_parent("viewer"),
            role("auditor"),
            role("admin").with_parent("editor"),
        ];
        let edges = vec![RoleHierarchyEdge::new("auditor", "admin", 1)];
        let graph = RoleGraph::from_parts(&roles, &edges);

        let closure = graph.ancestors_closure([&RoleId::new("admin")]);
        let names: Vec<&str> = closure.iter().map(RoleId::as_str).collect();

        assert_eq!(names, vec!["admin", "editor", "viewer", "auditor"]);
    }

    #[test]
    fn dangling_parent_stops_expansion() {
        let roles = vec![role("editor").with_parent("ghost")];
        let graph = RoleGraph::from_parts(&roles, &[]);

        let closure = graph.ancestors_closure([&RoleId::new("editor")]);
        assert_eq!(closure, vec![RoleId::new("editor")]);
    }

    #[test]
    fn unregistered_start_roles_are_skipped() {
        let roles = vec![role("viewer")];
        let graph = RoleGraph::from_parts(&roles, &[]);

        let closure = graph.ancestors_closure([&RoleId::new("missing"), &RoleId::new("viewer")]);
        assert_eq!(closure, vec![RoleId::new("viewer")]);
    }

    #[test]
    fn cycle_terminates_with_each_role_once() {
        let roles = vec![role("a").with_parent("b"), role("b").with_parent("c"), role("c")];
        let edges = vec![RoleHierarchyEdge::new("a", "c", 1)];
        let graph = RoleGraph::from_parts(&roles, &edges);

        let closure = graph.ancestors_closure([&RoleId::new("a")]);
        assert_eq!(
            closure,
            vec![RoleId::new("a"), RoleId::new("b"), RoleId::new("c")]
        );
    }

    #[test]
    fn deep_parent_chain_is_walked_without_recursion() {
        let depth = 20_000;
        let roles: Vec<Role> = (0..depth)
            .map(|index| {
                let role = role(&format!("r{index}"));
                if index + 1 < depth {
                    role.with_parent(format!("r{}", index + 1).as_str())
                } else {
                    role
                }
            })
            .collect();
        let graph = RoleGraph::from_parts(&roles, &[]);

        let closure = graph.ancestors_closure([&RoleId::new("r0")]);

        assert_eq!(closure.len(), depth);
        assert_eq!(closure.first(), Some(&RoleId::new("r0")));
        assert_eq!(closure.last(), Some(&RoleId::new(format!("r{}", depth - 1))));
    }

    fn arbitrary_graph() -> impl Strategy<Value = (usize, Vec<(usize, usize)>, Vec<usize>)> {
        (1usize..12).prop_flat_map(|size| {
            (
                Just(size),
                prop::collection::vec((0..size, 0..size), 0..30),
                prop::collection::vec(0..size, 1..4),
            )
        })
    }

    proptest! {
        #[test]
        fn closure_is_idempotent_and_closed((size, links, start) in arbitrary_graph()) {
            let roles: Vec<Role> = (0..size).map(|index| role(&format!("r{index}"))).collect();
            let edges: Vec<RoleHierarchyEdge> = links
                .iter()
                .map(|(parent, child)| {
                    RoleHierarchyEdge::new(
                        format!("r{parent}").as_str(),
                        format!("r{child}").as_str(),
                        1,
                    )
                })
                .collect();
            let graph = RoleGraph::from_parts(&roles, &edges);
            let start: Vec<RoleId> = start
                .iter()
                .map(|index| RoleId::new(format!("r{index}")))
                .collect();

            let first = graph.ancestors_closure(&start);
            let second = graph.ancestors_closure(&start);
            prop_assert_eq!(&first, &second);

            let members: HashSet<&RoleId> = first.iter().collect();
            prop_assert_eq!(members.len(), first.len());
            for role_id in &start {
                prop_assert!(members.contains(role_id));
            }
            for role_id in &first {
                for parent in graph.direct_parents(role_id) {
                    prop_assert!(members.contains(parent));
                }
            }
        }
    }
}
