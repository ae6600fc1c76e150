//! Categories
//!
//! Display names for category identifiers. The storefront's data mixes
//! English legacy identifiers with Spanish ones, so the mapping is a plain
//! data table loaded from configuration rather than control flow.

use rustc_hash::FxHashMap;
use serde::Deserialize;

/// The built-in mapping, usable when the hosting application ships no
/// configuration of its own.
static BUILTIN: &[(&str, &str)] = &[
    // English identifiers (legacy)
    ("electronics", "Electrónicos"),
    ("sports", "Deportes"),
    ("home", "Hogar y Jardín"),
    ("fashion", "Moda"),
    ("clothing", "Ropa"),
    ("books", "Libros"),
    ("toys", "Juguetes"),
    ("beauty", "Belleza"),
    ("automotive", "Automotriz"),
    ("music", "Música"),
    ("gaming", "Videojuegos"),
    ("health", "Salud y Bienestar"),
    // Spanish identifiers
    ("electronico", "Electrónicos"),
    ("electronica", "Electrónicos"),
    ("tecnologia", "Tecnología"),
    ("otros", "Otros"),
    ("otro", "Otros"),
    ("deportes", "Deportes"),
    ("hogar", "Hogar y Jardín"),
    ("moda", "Moda"),
    ("ropa", "Ropa"),
    ("libros", "Libros"),
    ("juguetes", "Juguetes"),
    ("belleza", "Belleza"),
    ("automotriz", "Automotriz"),
    ("musica", "Música"),
    ("videojuegos", "Videojuegos"),
    ("salud", "Salud y Bienestar"),
];

/// A category-identifier to display-name table.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct CategoryNames {
    names: FxHashMap<String, String>,
}

impl Default for CategoryNames {
    fn default() -> Self {
        Self::from_pairs(BUILTIN.iter().copied())
    }
}

impl CategoryNames {
    /// Build a table from `(identifier, display name)` pairs.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        CategoryNames {
            names: pairs
                .into_iter()
                .map(|(id, name)| (id.to_owned(), name.to_owned()))
                .collect(),
        }
    }

    /// Load a table from a YAML mapping of identifier to display name.
    ///
    /// # Errors
    ///
    /// Returns an error when the document is not a string-to-string mapping.
    pub fn from_yaml(source: &str) -> Result<Self, serde_norway::Error> {
        serde_norway::from_str(source)
    }

    /// Resolve the display name for a category identifier.
    ///
    /// Tries the identifier as-is, then lower-cased; unknown identifiers
    /// fall back to a capitalized form of the identifier itself.
    pub fn display_name(&self, id: &str) -> String {
        if let Some(name) = self.names.get(id) {
            return name.clone();
        }

        let lowered = id.to_lowercase();
        if let Some(name) = self.names.get(&lowered) {
            return name.clone();
        }

        capitalize(&lowered)
    }
}

/// Upper-case the first character of an already lower-cased identifier.
fn capitalize(id: &str) -> String {
    let mut chars = id.chars();

    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
