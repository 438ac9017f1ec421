//! Foreign-key load ordering.

use std::collections::BTreeMap;

use tracing::debug;
use ue_core::FxHashSet;

use crate::schema::Dependency;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// Orders `tables` so every table comes after the tables it references.
///
/// Depth-first over the edges, visiting tables and their dependencies in
/// sorted order so the result is deterministic. An edge that closes a cycle
/// is dropped, so cycles still terminate with each table listed once.
/// Self-references and edges to tables outside `tables` are ignored.
///
/// # Examples
///
/// ```
/// use ue_migrator::{topological_order, Dependency};
///
/// let tables = ["a", "b", "c"].map(String::from);
/// let edges = [Dependency::new("a", "b"), Dependency::new("b", "c")];
/// assert_eq!(topological_order(&tables, &edges), vec!["c", "b", "a"]);
/// ```
#[must_use]
pub fn topological_order(tables: &[String], dependencies: &[Dependency]) -> Vec<String> {
    let known: FxHashSet<&str> = tables.iter().map(String::as_str).collect();

    let mut graph: BTreeMap<&str, Vec<&str>> = tables.iter().map(|t| (t.as_str(), Vec::new())).collect();
    for dep in dependencies {
        if dep.table == dep.references || !known.contains(dep.references.as_str()) {
            continue;
        }
        if let Some(edges) = graph.get_mut(dep.table.as_str()) {
            edges.push(dep.references.as_str());
        }
    }
    for edges in graph.values_mut() {
        edges.sort_unstable();
        edges.dedup();
    }

    let mut marks: BTreeMap<&str, Mark> = BTreeMap::new();
    let mut order = Vec::with_capacity(graph.len());
    for &table in graph.keys() {
        visit(table, &graph, &mut marks, &mut order);
    }
    order
}

fn visit<'a>(
    table: &'a str,
    graph: &BTreeMap<&'a str, Vec<&'a str>>,
    marks: &mut BTreeMap<&'a str, Mark>,
    order: &mut Vec<String>,
) {
    match marks.get(table) {
        Some(Mark::Done) => return,
        Some(Mark::Visiting) => {
            debug!(table, "Dropping foreign-key edge that closes a cycle");
            return;
        }
        None => {}
    }

    marks.insert(table, Mark::Visiting);
    if let Some(edges) = graph.get(table) {
        for &next in edges {
            visit(next, graph, marks, order);
        }
    }
    marks.insert(table, Mark::Done);
    order.push(table.to_owned());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn test_chain_orders_dependencies_first() {
        let order = topological_order(
            &names(&["members", "claims", "organizations"]),
            &[
                Dependency::new("claims", "members"),
                Dependency::new("members", "organizations"),
                Dependency::new("claims", "organizations"),
            ],
        );
        assert_eq!(order, names(&["organizations", "members", "claims"]));
    }

    #[test]
    fn test_two_cycle_terminates() {
        let order = topological_order(
            &names(&["a", "b"]),
            &[Dependency::new("a", "b"), Dependency::new("b", "a")],
        );
        assert_eq!(order.len(), 2);
        assert!(order.contains(&"a".to_owned()));
        assert!(order.contains(&"b".to_owned()));
    }

    #[test]
    fn test_ignores_self_and_unknown_references() {
        let order = topological_order(
            &names(&["comments", "posts"]),
            &[
                Dependency::new("comments", "comments"),
                Dependency::new("comments", "posts"),
                Dependency::new("posts", "auth_user"),
            ],
        );
        assert_eq!(order, names(&["posts", "comments"]));
    }

    #[test]
    fn test_independent_tables_sorted() {
        let order = topological_order(&names(&["zeta", "alpha", "mid"]), &[]);
        assert_eq!(order, names(&["alpha", "mid", "zeta"]));
    }
}
