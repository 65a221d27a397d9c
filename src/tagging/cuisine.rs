use std::collections::{BTreeSet, HashMap};

use crate::vocabulary::CuisineParents;

/// Static mapping from regional cuisines to the broader cuisines they belong to.
#[derive(Debug, Clone, Default)]
pub struct CuisineHierarchy {
    parents: HashMap<String, Vec<String>>,
}

impl CuisineHierarchy {
    pub fn new(entries: &[CuisineParents]) -> Self {
        let mut parents: HashMap<String, Vec<String>> = HashMap::new();
        for entry in entries {
            let name = entry.name.trim().to_lowercase();
            if name.is_empty() {
                continue;
            }
            let list = parents.entry(name).or_default();
            for parent in &entry.parents {
                let parent = parent.trim().to_lowercase();
                if !parent.is_empty() && !list.contains(&parent) {
                    list.push(parent);
                }
            }
        }
        Self { parents }
    }

    /// Add every ancestor of every tag.
    ///
    /// Walks the hierarchy to a fixed point, so the result is closed under
    /// expansion and running it again changes nothing. Cycles in the table
    /// terminate because a tag is only queued the first time it is seen.
    pub fn expand(&self, tags: &BTreeSet<String>) -> BTreeSet<String> {
        let mut expanded: BTreeSet<String> = tags
            .iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        let mut pending: Vec<String> = expanded.iter().cloned().collect();

        while let Some(tag) = pending.pop() {
            if let Some(parents) = self.parents.get(&tag) {
                for parent in parents {
                    if expanded.insert(parent.clone()) {
                        pending.push(parent.clone());
                    }
                }
            }
        }

        expanded
    }

    pub fn parents_of(&self, cuisine: &str) -> &[String] {
        self.parents
            .get(&cuisine.trim().to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocabulary::Vocabulary;

    fn tags(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn hierarchy() -> CuisineHierarchy {
        CuisineHierarchy::new(&Vocabulary::load_default().unwrap().cuisines)
    }

    #[test]
    fn test_expand_adds_parents_transitively() {
        let expanded = hierarchy().expand(&tags(&["Sichuan", "dinner"]));
        assert!(expanded.contains("sichuan"));
        assert!(expanded.contains("chinese"));
        assert!(expanded.contains("asian"));
        assert!(expanded.contains("dinner"));
    }

    #[test]
    fn test_expand_multiple_parents() {
        let expanded = hierarchy().expand(&tags(&["tex-mex"]));
        assert!(expanded.contains("mexican"));
        assert!(expanded.contains("american"));
        assert!(expanded.contains("latin american"));
    }

    #[test]
    fn test_expand_is_idempotent() {
        let hierarchy = hierarchy();
        for input in [
            tags(&["goan"]),
            tags(&["cajun", "tuscan", "szechuan"]),
            tags(&["basque", "vegan"]),
            tags(&[]),
        ] {
            let once = hierarchy.expand(&input);
            let twice = hierarchy.expand(&once);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_expand_is_additive() {
        let input = tags(&["sicilian", "pasta"]);
        let expanded = hierarchy().expand(&input);
        assert!(input.is_subset(&expanded));
    }

    #[test]
    fn test_cycle_terminates() {
        let hierarchy = CuisineHierarchy::new(&[
            CuisineParents {
                name: "a".to_string(),
                parents: vec!["b".to_string()],
            },
            CuisineParents {
                name: "b".to_string(),
                parents: vec!["a".to_string()],
            },
        ]);
        assert_eq!(hierarchy.expand(&tags(&["a"])), tags(&["a", "b"]));
    }

    #[test]
    fn test_parents_of_unknown() {
        assert!(hierarchy().parents_of("martian").is_empty());
        assert_eq!(hierarchy().parents_of("Goan"), ["indian".to_string()]);
    }
}
