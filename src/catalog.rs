//! The static waste lookup table. Every material the classifier can report
//! lives here, along with its disposal category and instructions.

use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;

/// Disposal category of a material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Recyclable,
    HazardousEWaste,
    GeneralWaste,
    OrganicCompostable,
}

/// The coarse grouping used to build a response summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    Recyclable,
    Hazardous,

    /// General waste and organics share a bucket
    General,
}

impl Category {
    /// The label sent to clients
    pub fn label(self) -> &'static str {
        match self {
            Category::Recyclable => "Recyclable",
            Category::HazardousEWaste => "Hazardous/E-Waste",
            Category::GeneralWaste => "General Waste",
            Category::OrganicCompostable => "Organic/Compostable",
        }
    }

    pub fn bucket(self) -> Bucket {
        match self {
            Category::Recyclable => Bucket::Recyclable,
            Category::HazardousEWaste => Bucket::Hazardous,
            Category::GeneralWaste | Category::OrganicCompostable => Bucket::General,
        }
    }
}

impl Serialize for Category {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.label())
    }
}

/// One material the classifier knows how to report
#[derive(Debug, Clone, PartialEq)]
pub struct WasteEntry {
    pub id: String,
    pub display_name: String,
    pub category: Category,
    pub bin_color: String,

    /// Colour hint for the frontend badge
    pub color: String,
    pub instructions: String,
}

impl WasteEntry {
    pub fn new(
        id: &str,
        display_name: &str,
        category: Category,
        bin_color: &str,
        color: &str,
        instructions: &str,
    ) -> Self {
        WasteEntry {
            id: id.into(),
            display_name: display_name.into(),
            category,
            bin_color: bin_color.into(),
            color: color.into(),
            instructions: instructions.into(),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    #[error("a waste catalog needs at least one entry")]
    Empty,

    #[error("duplicate waste entry id `{0}`")]
    DuplicateId(String),
}

/// The immutable lookup table, built once at startup
#[derive(Debug)]
pub struct Catalog {
    entries: Vec<WasteEntry>,
}

impl Catalog {
    pub fn new(entries: Vec<WasteEntry>) -> Result<Self, CatalogError> {
        if entries.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.id.as_str()) {
                return Err(CatalogError::DuplicateId(entry.id.clone()));
            }
        }

        Ok(Catalog { entries })
    }

    /// The materials the mock model "knows"
    pub fn builtin() -> Self {
        use Category::*;

        let entries = vec![
            WasteEntry::new(
                "plastic_bottle_pet",
                "Plastic Bottle (PET)",
                Recyclable,
                "Blue",
                "blue",
                "Rinse thoroughly, remove the cap, and flatten the bottle before placing in the recycling bin. Caps are often recycled separately.",
            ),
            WasteEntry::new(
                "aluminum_can",
                "Aluminum Can",
                Recyclable,
                "Blue",
                "blue",
                "Rinse out all food residue. Do not crush the can entirely, as automatic sorters may mistake crushed cans for general waste.",
            ),
            WasteEntry::new(
                "cardboard_box",
                "Cardboard Box",
                Recyclable,
                "Brown",
                "yellow",
                "Flatten the box completely. Remove all tape and shipping labels. If greasy (like a pizza box), tear off clean parts and put the greasy part in general waste.",
            ),
            WasteEntry::new(
                "newspaper_magazine",
                "Newspaper/Magazine",
                Recyclable,
                "Blue",
                "blue",
                "Keep dry. Place loose in the recycling bin. Do not tie with string or put in plastic bags.",
            ),
            WasteEntry::new(
                "fruit_scraps",
                "Banana Peel/Fruit Scraps",
                OrganicCompostable,
                "Green",
                "green",
                "Place directly into the compost bin or dedicated green waste bin. Do not include any packaging.",
            ),
            WasteEntry::new(
                "batteries_aa_aaa",
                "Used Batteries (AA/AAA)",
                HazardousEWaste,
                "Special Collection",
                "red",
                "Tape the terminals to prevent short circuits. Take to a specialized collection point (e.g., library, municipality center, or retail store drop-off).",
            ),
            WasteEntry::new(
                "light_bulb_incandescent",
                "Light Bulb (Incandescent)",
                GeneralWaste,
                "Black/Gray",
                "gray",
                "Wrap in paper or a plastic bag to prevent injury from broken glass and place carefully in the general waste bin.",
            ),
            WasteEntry::new(
                "plastic_film_bags",
                "Plastic Film/Bags",
                GeneralWaste,
                "Black/Gray",
                "gray",
                "Plastic films and bags jam recycling machinery. Dispose of in general waste, or check for specific local drop-off points.",
            ),
        ];

        Catalog { entries }
    }

    pub fn entries(&self) -> &[WasteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&WasteEntry> {
        self.entries.iter().find(|e| e.id == id)
    }
}
