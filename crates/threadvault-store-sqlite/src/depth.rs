//! Batch depth resolution for comment threads.
//!
//! A batch may contain an entire freshly fetched subtree, so a comment's
//! parent can live in the same batch, in prior storage, or nowhere at all.
//! Depths are resolved with a memoized walk over the in-batch parent map,
//! falling back to a storage lookup at the batch boundary. A declared parent
//! found neither in the batch nor in storage demotes the comment to a root
//! (depth 0, no stored parent) — a defined fallback, not an error, because
//! source data may reference a parent that was deleted or never fetched.
//!
//! The walk is iterative with an explicit chain, which bounds stack use on
//! deep threads and makes cyclic parent chains detectable instead of
//! recursing unboundedly.

use std::collections::{HashMap, HashSet};

#[derive(Debug)]
pub(crate) enum DepthError {
  /// A comment turned out to be its own ancestor within the batch.
  Cycle(String),
  Db(rusqlite::Error),
}

/// Outcome for one comment: the depth to write, and the parent id as it
/// should be stored (`None` when the declared parent resolved to nothing).
#[derive(Debug)]
pub(crate) struct Resolved {
  pub depth:     u32,
  pub parent_id: Option<String>,
}

/// Resolve depths for every comment in `parents` (comment id -> declared
/// parent id, already normalized so that "parent is the post itself" is
/// `None`). `stored_depth` looks up the depth of a comment outside the
/// batch; it must scope the lookup to the owning post so cross-post parent
/// references fall back to the orphan path.
pub(crate) fn resolve_batch<L>(
  parents: &HashMap<String, Option<String>>,
  mut stored_depth: L,
) -> Result<HashMap<String, Resolved>, DepthError>
where
  L: FnMut(&str) -> rusqlite::Result<Option<u32>>,
{
  let mut resolved: HashMap<String, Resolved> = HashMap::with_capacity(parents.len());

  for start in parents.keys() {
    if resolved.contains_key(start) {
      continue;
    }

    // Walk toward the root until a node with a known depth is reached,
    // recording (node, in-batch parent) pairs so the chain can be unwound.
    let mut chain: Vec<(&String, &String)> = Vec::new();
    let mut on_chain: HashSet<&String> = HashSet::new();
    let mut cur = start;

    loop {
      if resolved.contains_key(cur) {
        break;
      }

      match parents.get(cur).and_then(Option::as_ref) {
        None => {
          resolved.insert(cur.clone(), Resolved { depth: 0, parent_id: None });
          break;
        }
        Some(parent) if !parents.contains_key(parent) => {
          // Batch boundary: consult storage, orphan fallback on a miss.
          let entry = match stored_depth(parent).map_err(DepthError::Db)? {
            Some(d) => Resolved { depth: d + 1, parent_id: Some(parent.clone()) },
            None => Resolved { depth: 0, parent_id: None },
          };
          resolved.insert(cur.clone(), entry);
          break;
        }
        Some(parent) => {
          if !on_chain.insert(cur) {
            return Err(DepthError::Cycle(cur.clone()));
          }
          chain.push((cur, parent));
          cur = parent;
        }
      }
    }

    // Unwind from the root end: each chained node's parent was resolved
    // either just above or on a previous pass.
    while let Some((node, parent)) = chain.pop() {
      let depth = resolved[parent].depth + 1;
      resolved.insert(node.clone(), Resolved { depth, parent_id: Some(parent.clone()) });
    }
  }

  Ok(resolved)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn batch(pairs: &[(&str, Option<&str>)]) -> HashMap<String, Option<String>> {
    pairs
      .iter()
      .map(|(id, p)| (id.to_string(), p.map(str::to_string)))
      .collect()
  }

  fn no_storage(_: &str) -> rusqlite::Result<Option<u32>> {
    Ok(None)
  }

  #[test]
  fn whole_subtree_in_one_batch() {
    let parents = batch(&[
      ("c1", None),
      ("c2", Some("c1")),
      ("c3", Some("c2")),
      ("c4", Some("c1")),
    ]);
    let r = resolve_batch(&parents, no_storage).unwrap();
    assert_eq!(r["c1"].depth, 0);
    assert_eq!(r["c2"].depth, 1);
    assert_eq!(r["c3"].depth, 2);
    assert_eq!(r["c4"].depth, 1);
    assert_eq!(r["c3"].parent_id.as_deref(), Some("c2"));
  }

  #[test]
  fn parent_outside_batch_uses_stored_depth() {
    let parents = batch(&[("child", Some("stored"))]);
    let r = resolve_batch(&parents, |id| {
      assert_eq!(id, "stored");
      Ok(Some(3))
    })
    .unwrap();
    assert_eq!(r["child"].depth, 4);
    assert_eq!(r["child"].parent_id.as_deref(), Some("stored"));
  }

  #[test]
  fn missing_parent_becomes_root() {
    let parents = batch(&[("orphan", Some("ghost"))]);
    let r = resolve_batch(&parents, no_storage).unwrap();
    assert_eq!(r["orphan"].depth, 0);
    assert_eq!(r["orphan"].parent_id, None);
  }

  #[test]
  fn storage_lookup_happens_once_per_missing_parent() {
    // b's chain runs through a, which crosses the batch boundary at x.
    // Whichever comment resolves first memoizes a, so x is consulted once.
    let parents = batch(&[("a", Some("x")), ("b", Some("a"))]);
    let mut lookups = 0;
    let r = resolve_batch(&parents, |_| {
      lookups += 1;
      Ok(Some(0))
    })
    .unwrap();
    assert_eq!(lookups, 1);
    assert_eq!(r["a"].depth, 1);
    assert_eq!(r["b"].depth, 2);
  }

  #[test]
  fn cycle_fails_fast() {
    let parents = batch(&[("a", Some("b")), ("b", Some("a"))]);
    let err = resolve_batch(&parents, no_storage).unwrap_err();
    assert!(matches!(err, DepthError::Cycle(_)));
  }

  #[test]
  fn self_parent_is_a_cycle() {
    let parents = batch(&[("a", Some("a"))]);
    assert!(matches!(
      resolve_batch(&parents, no_storage),
      Err(DepthError::Cycle(_))
    ));
  }

  #[test]
  fn deep_chain_does_not_overflow() {
    let mut pairs: Vec<(String, Option<String>)> =
      vec![("n0".to_string(), None)];
    for i in 1..5000 {
      pairs.push((format!("n{i}"), Some(format!("n{}", i - 1))));
    }
    let parents: HashMap<_, _> = pairs.into_iter().collect();
    let r = resolve_batch(&parents, no_storage).unwrap();
    assert_eq!(r["n4999"].depth, 4999);
  }

  #[test]
  fn storage_error_propagates() {
    let parents = batch(&[("a", Some("x"))]);
    let err = resolve_batch(&parents, |_| {
      Err(rusqlite::Error::InvalidQuery)
    })
    .unwrap_err();
    assert!(matches!(err, DepthError::Db(_)));
  }
}
