use std::collections::HashMap;

use crate::TestError;

/// Orders tests so that each one comes after everything it depends on.
///
/// `tests` is a list of `(name, dependencies)` in declaration order. Ties are
/// broken by declaration order, so a suite without dependencies runs exactly
/// as written. Returns indices into `tests`.
pub(crate) fn execution_order(tests: &[(String, Vec<String>)]) -> Result<Vec<usize>, TestError> {
    let index: HashMap<&str, usize> = tests
        .iter()
        .enumerate()
        .map(|(idx, (name, _))| (name.as_str(), idx))
        .collect();

    let mut pending_deps = vec![0usize; tests.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); tests.len()];
    for (idx, (name, deps)) in tests.iter().enumerate() {
        for dep in deps {
            let Some(&dep_idx) = index.get(dep.as_str()) else {
                return Err(TestError::UnknownDependency {
                    test: name.clone(),
                    dependency: dep.clone(),
                });
            };
            pending_deps[idx] += 1;
            dependents[dep_idx].push(idx);
        }
    }

    let mut order = Vec::with_capacity(tests.len());
    let mut done = vec![false; tests.len()];
    while order.len() < tests.len() {
        // Lowest declared index among the ready tests.
        let next = (0..tests.len()).find(|&idx| !done[idx] && pending_deps[idx] == 0);
        let Some(next) = next else {
            let stuck = tests
                .iter()
                .enumerate()
                .filter(|(idx, _)| !done[*idx])
                .map(|(_, (name, _))| name.clone())
                .collect();
            return Err(TestError::DependencyCycle(stuck));
        };
        done[next] = true;
        order.push(next);
        for &dependent in &dependents[next] {
            pending_deps[dependent] -= 1;
        }
    }
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn declared(items: &[(&str, &[&str])]) -> Vec<(String, Vec<String>)> {
        items
            .iter()
            .map(|(name, deps)| {
                (
                    name.to_string(),
                    deps.iter().map(|d| d.to_string()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn independent_tests_keep_declaration_order() {
        let tests = declared(&[("a", &[]), ("b", &[]), ("c", &[])]);
        assert_eq!(execution_order(&tests).unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn dependencies_run_first() {
        let tests = declared(&[
            ("admin", &["teacher"]),
            ("auth", &[]),
            ("teacher", &["auth"]),
            ("student", &["auth"]),
        ]);
        assert_eq!(execution_order(&tests).unwrap(), vec![1, 2, 0, 3]);
    }

    #[test]
    fn unknown_dependency_is_rejected() {
        let tests = declared(&[("teacher", &["approval"])]);
        let err = execution_order(&tests).unwrap_err();
        assert!(matches!(
            err,
            TestError::UnknownDependency { ref test, ref dependency }
                if test == "teacher" && dependency == "approval"
        ));
    }

    #[test]
    fn cycles_are_rejected() {
        let tests = declared(&[("a", &["b"]), ("b", &["a"]), ("c", &[])]);
        let err = execution_order(&tests).unwrap_err();
        let TestError::DependencyCycle(stuck) = err else {
            panic!("expected a cycle error, got {err:?}");
        };
        assert_eq!(stuck, vec!["a".to_string(), "b".to_string()]);
    }
}
