//! Teapot materials
//!
//! A material is a named set of colours uploaded as uniforms every frame. The
//! table is fixed at construction and cycled in order.

use crate::scene::CyclicSelector;

/// Surface colours of a teapot material
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Display name, used for the UI label
    pub name: String,
    /// Diffuse colour (RGB)
    pub diffuse: [f32; 3],
    /// Specular colour (RGB) plus exponent slot
    pub specular: [f32; 4],
    /// Ambient colour (RGB)
    pub ambient: [f32; 3],
}

impl Material {
    /// Create a new material
    pub fn new(name: impl Into<String>, diffuse: [f32; 3], specular: [f32; 4], ambient: [f32; 3]) -> Self {
        Self {
            name: name.into(),
            diffuse,
            specular,
            ambient,
        }
    }

    /// Polished gold, reflective only
    pub fn gold() -> Self {
        Self::new("Gold", [0.0, 0.0, 0.0], [1.0, 0.765_557, 0.336_057, 0.0], [0.0, 0.0, 0.0])
    }

    /// Polished copper, reflective only
    pub fn copper() -> Self {
        Self::new("Copper", [0.0, 0.0, 0.0], [0.955_008, 0.637_427, 0.538_163, 0.0], [0.0, 0.0, 0.0])
    }

    /// Red plastic with a weak grey reflection
    pub fn plastic() -> Self {
        Self::new("Plastic", [0.9, 0.0, 0.0], [0.2, 0.2, 0.2, 0.0], [0.0, 0.0, 0.0])
    }
}

/// Ordered material table with exactly one current entry
#[derive(Debug, Clone)]
pub struct MaterialLibrary {
    materials: Vec<Material>,
    selector: CyclicSelector,
}

impl Default for MaterialLibrary {
    fn default() -> Self {
        Self::new(vec![Material::gold(), Material::copper(), Material::plastic()])
    }
}

impl MaterialLibrary {
    /// Build a library from a table; an empty table falls back to gold
    pub fn new(mut materials: Vec<Material>) -> Self {
        if materials.is_empty() {
            log::warn!("Empty material table, falling back to a single gold material");
            materials.push(Material::gold());
        }
        let selector = CyclicSelector::new(materials.len());
        Self { materials, selector }
    }

    /// Number of materials
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    /// Always false; the library keeps at least one material
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Index of the current material
    pub fn current_index(&self) -> usize {
        self.selector.current()
    }

    /// The current material
    pub fn current(&self) -> &Material {
        &self.materials[self.selector.current()]
    }

    /// Advance to the next material, wrapping after the last
    pub fn advance(&mut self) -> usize {
        self.selector.advance()
    }

    /// Select a material by index (wrapped into range)
    pub fn select(&mut self, index: usize) -> usize {
        self.selector.select(index)
    }

    /// Material names in table order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.materials.iter().map(|m| m.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_order() {
        let library = MaterialLibrary::default();
        let names: Vec<&str> = library.names().collect();
        assert_eq!(names, vec!["Gold", "Copper", "Plastic"]);
        assert_eq!(library.current().name, "Gold");
    }

    #[test]
    fn test_advance_sequence() {
        let mut library = MaterialLibrary::default();
        let sequence: Vec<usize> = (0..3).map(|_| library.advance()).collect();
        assert_eq!(sequence, vec![1, 2, 0]);
    }

    #[test]
    fn test_plastic_colours() {
        let plastic = Material::plastic();
        assert_eq!(plastic.diffuse, [0.9, 0.0, 0.0]);
        assert_eq!(plastic.specular, [0.2, 0.2, 0.2, 0.0]);
    }

    #[test]
    fn test_empty_table_falls_back() {
        let library = MaterialLibrary::new(Vec::new());
        assert_eq!(library.len(), 1);
        assert_eq!(library.current().name, "Gold");
    }
}
