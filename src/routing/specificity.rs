//! Registration order for first-match-wins dispatch.
//!
//! Routes are registered from most to least specific:
//! 1. fewer catch-all segments first
//! 2. fewer dynamic segments first
//! 3. deeper paths first
//! 4. relative file path, ascending
//!
//! `/users/new` therefore precedes `/users/:id`, and `/users/:id/edit`
//! precedes `/users/:id`.

use std::cmp::Reverse;

use crate::routing::translate::RouteFile;

/// Comparable ordering key derived from a route file. Lower sorts first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SpecificityRank {
    catch_all: usize,
    dynamic: usize,
    depth: Reverse<usize>,
    path: String,
}

impl SpecificityRank {
    pub fn of(file: &RouteFile) -> Self {
        Self {
            catch_all: file.pattern.catch_all_count(),
            dynamic: file.pattern.dynamic_count(),
            depth: Reverse(file.pattern.depth()),
            path: file.path.clone(),
        }
    }
}

/// Sort route files into registration order. Stable.
pub fn sort_by_specificity(files: &mut [RouteFile]) {
    files.sort_by_cached_key(RouteFile::rank);
}

/// Owned variant of [`sort_by_specificity`].
pub fn sorted_by_specificity(mut files: Vec<RouteFile>) -> Vec<RouteFile> {
    sort_by_specificity(&mut files);
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::translate::PathTranslator;

    fn order(paths: &[&str]) -> Vec<String> {
        let translator = PathTranslator::new("", "get");
        let files = paths.iter().map(|p| translator.translate(p)).collect();
        sorted_by_specificity(files)
            .into_iter()
            .map(|f| f.pattern.to_string())
            .collect()
    }

    #[test]
    fn test_static_before_dynamic() {
        assert_eq!(order(&["users/[id].toml", "users/new.toml"]), vec!["/users/new", "/users/:id"]);
    }

    #[test]
    fn test_deeper_before_shallower() {
        assert_eq!(
            order(&["users/[id].toml", "users/[id]/edit.toml"]),
            vec!["/users/:id/edit", "/users/:id"]
        );
    }

    #[test]
    fn test_catch_all_last() {
        assert_eq!(
            order(&["[...all].toml", "a/b/c/[x]/[y].toml", "index.toml"]),
            vec!["/", "/a/b/c/:x/:y", "/*"]
        );
    }

    #[test]
    fn test_path_tie_break() {
        assert_eq!(order(&["b.toml", "a.toml", "c.toml"]), vec!["/a", "/b", "/c"]);
    }

    #[test]
    fn test_sort_is_permutation_and_deterministic() {
        let input = [
            "index.toml",
            "users/[id].toml",
            "users/new.toml",
            "users/[id]/edit.toml",
            "(post)users.toml",
            "docs/[...slug].toml",
            "users.toml",
        ];
        let first = order(&input);
        let mut reversed = input.to_vec();
        reversed.reverse();
        let second = order(&reversed);
        assert_eq!(first, second);
        assert_eq!(first.len(), input.len());

        let mut expected: Vec<String> = {
            let translator = PathTranslator::new("", "get");
            input.iter().map(|p| translator.translate(p).pattern.to_string()).collect()
        };
        let mut actual = first.clone();
        expected.sort();
        actual.sort();
        assert_eq!(expected, actual);
    }
}
