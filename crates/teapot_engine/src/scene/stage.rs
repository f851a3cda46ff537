//! Selectable environments ("stages")

use super::CyclicSelector;

/// A named environment and the face-name pattern its cube maps load from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    /// Display name, used for the UI label
    pub name: String,
    /// Face-name pattern: first placeholder is the mip level, second the face
    pub pattern: String,
}

impl Stage {
    /// Create a stage
    pub fn new(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
        }
    }
}

/// Ordered stage table with exactly one current entry
#[derive(Debug, Clone)]
pub struct StageLibrary {
    stages: Vec<Stage>,
    selector: CyclicSelector,
}

impl Default for StageLibrary {
    fn default() -> Self {
        Self::new(vec![
            Stage::new("St Peters", "cubemaps/stpeters_phong_m%02d_c%02d.bmp"),
            Stage::new("Eucalyptus Grove", "cubemaps/rnl_phong_m%02d_c%02d.bmp"),
            Stage::new("Uffizi Gallery", "cubemaps/uffizi_phong_m%02d_c%02d.bmp"),
            Stage::new("None", "none"),
        ])
    }
}

impl StageLibrary {
    /// Build a library; an empty table gets a single "None" stage
    pub fn new(mut stages: Vec<Stage>) -> Self {
        if stages.is_empty() {
            stages.push(Stage::new("None", "none"));
        }
        let selector = CyclicSelector::new(stages.len());
        Self { stages, selector }
    }

    /// Number of stages
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Always false; the library keeps at least one stage
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Index of the current stage
    pub fn current_index(&self) -> usize {
        self.selector.current()
    }

    /// The current stage
    pub fn current(&self) -> &Stage {
        &self.stages[self.selector.current()]
    }

    /// Stage at `index`, wrapped into range
    pub fn get(&self, index: usize) -> &Stage {
        &self.stages[index % self.stages.len()]
    }

    /// Advance to the next stage
    pub fn advance(&mut self) -> usize {
        self.selector.advance()
    }

    /// Select a stage by index (wrapped into range)
    pub fn select(&mut self, index: usize) -> usize {
        self.selector.select(index)
    }

    /// Stage names in table order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.stages.iter().map(|s| s.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_stages() {
        let library = StageLibrary::default();
        assert_eq!(library.len(), 4);
        assert_eq!(library.current().name, "St Peters");
        assert_eq!(library.get(3).pattern, "none");
    }

    #[test]
    fn test_cycle_returns_to_start() {
        let mut library = StageLibrary::default();
        let visited: Vec<String> = (0..4).map(|_| {
            library.advance();
            library.current().name.clone()
        }).collect();
        assert_eq!(visited, vec!["Eucalyptus Grove", "Uffizi Gallery", "None", "St Peters"]);
    }
}
