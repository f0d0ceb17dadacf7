use petgraph::{algo::kosaraju_scc, graphmap::DiGraphMap};
use serde_json::Value;

use super::{catalog::Catalog, schema::Schema};

/// Detects cycles running through `$ref` and `allOf` references alone.
///
/// Relationship properties may legitimately form cycles (model A references
/// B references A), so property references are not edges here. Any cycle
/// found means a `$ref` chain cannot terminate.
pub(crate) fn reference_cycles(catalog: &Catalog) -> Vec<Vec<String>> {
  let edges: Vec<(String, String)> = catalog
    .iter()
    .flat_map(|(name, schema)| {
      inheritance_refs(schema)
        .into_iter()
        .map(move |target| (name.clone(), target))
    })
    .collect();

  let mut graph = DiGraphMap::<&str, ()>::new();
  for (name, _) in catalog.iter() {
    graph.add_node(name.as_str());
  }
  for (from, to) in &edges {
    graph.add_edge(from.as_str(), to.as_str(), ());
  }

  kosaraju_scc(&graph)
    .into_iter()
    .filter(|scc| scc.len() > 1 || graph.contains_edge(scc[0], scc[0]))
    .map(|scc| scc.into_iter().map(String::from).collect())
    .collect()
}

/// Local schema names referenced by the schema's own `$ref` and its
/// `allOf` children, recursively through inline children.
fn inheritance_refs(schema: &Schema) -> Vec<String> {
  let mut refs = Vec::new();

  if let Some(Value::String(reference)) = schema.get("$ref")
    && let Some(name) = local_ref_name(reference)
  {
    refs.push(name);
  }

  if let Some(Value::Array(children)) = schema.get("allOf") {
    for child in children {
      if let Some(child_schema) = child.as_object() {
        refs.extend(inheritance_refs(child_schema));
      }
    }
  }

  refs
}

fn local_ref_name(reference: &str) -> Option<String> {
  reference
    .strip_prefix("#/components/schemas/")
    .map(ToString::to_string)
}
