use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::{Context, Result};

use super::calibrate::CalibrationCoefficients;

// ---------------------------------------------------------------------------
// Library nodes
// ---------------------------------------------------------------------------

/// A row of the molecule library as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum LibraryNode {
    /// Grouping row; carries no coefficients.
    Category(String),
    Molecule { category: String, name: String },
}

/// JSON layout: `{ category: { molecule: { a, b, a_norm, b_norm } } }`.
type CatalogFile = BTreeMap<String, BTreeMap<String, CalibrationCoefficients>>;

// ---------------------------------------------------------------------------
// CoefficientLibrary
// ---------------------------------------------------------------------------

/// Read-only catalog of calibration coefficients keyed by
/// `(category, molecule)`.
#[derive(Debug, Clone, PartialEq)]
pub struct CoefficientLibrary {
    /// All categories, including empty ones.
    categories: BTreeSet<String>,
    entries: BTreeMap<(String, String), CalibrationCoefficients>,
}

impl Default for CoefficientLibrary {
    fn default() -> Self {
        Self::builtin()
    }
}

impl CoefficientLibrary {
    /// The molecules measured so far.
    pub fn builtin() -> Self {
        let mut catalog = CatalogFile::new();
        catalog.insert(
            "Proteins".into(),
            BTreeMap::from([
                (
                    "Lysozyme".to_string(),
                    CalibrationCoefficients::new(2_000_000.0, -0.998, 0.1373, -0.999),
                ),
                (
                    "Bradykinin".to_string(),
                    CalibrationCoefficients::new(1.0, 2.0, 1.0, 2.0),
                ),
            ]),
        );
        catalog.insert(
            "Polymers".into(),
            BTreeMap::from([(
                "Irganox".to_string(),
                CalibrationCoefficients::new(1.0, 2.0, 1.0, 2.0),
            )]),
        );
        catalog.insert("Lipids".into(), BTreeMap::new());
        Self::from_catalog(catalog)
    }

    fn from_catalog(catalog: CatalogFile) -> Self {
        let mut categories = BTreeSet::new();
        let mut entries = BTreeMap::new();
        for (category, molecules) in catalog {
            for (name, coefficients) in molecules {
                entries.insert((category.clone(), name), coefficients);
            }
            categories.insert(category);
        }
        Self {
            categories,
            entries,
        }
    }

    /// Load a catalog from JSON. Zero coefficients are rejected here so a
    /// bad entry never reaches the calibrator.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading molecule library {}", path.display()))?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let catalog: CatalogFile =
            serde_json::from_str(text).context("parsing molecule library JSON")?;
        for (category, molecules) in &catalog {
            for (name, coefficients) in molecules {
                coefficients
                    .validate()
                    .with_context(|| format!("library entry {category}/{name}"))?;
            }
        }
        Ok(Self::from_catalog(catalog))
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(String::as_str)
    }

    /// Molecules of one category with their coefficients, sorted by name.
    pub fn molecules<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = (&'a str, CalibrationCoefficients)> + 'a {
        self.entries
            .iter()
            .filter(move |((cat, _), _)| cat == category)
            .map(|((_, name), c)| (name.as_str(), *c))
    }

    /// Exact lookup by category and molecule name.
    pub fn get(&self, category: &str, molecule: &str) -> Option<CalibrationCoefficients> {
        self.entries
            .get(&(category.to_string(), molecule.to_string()))
            .copied()
    }

    /// Exact lookup by molecule name alone; the first category wins.
    pub fn find(&self, molecule: &str) -> Option<(&str, CalibrationCoefficients)> {
        self.entries
            .iter()
            .find(|((_, name), _)| name == molecule)
            .map(|((cat, _), c)| (cat.as_str(), *c))
    }

    /// Coefficients behind a selected row. Category rows yield `None`.
    pub fn select(&self, node: &LibraryNode) -> Option<CalibrationCoefficients> {
        match node {
            LibraryNode::Category(_) => None,
            LibraryNode::Molecule { category, name } => self.get(category, name),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
