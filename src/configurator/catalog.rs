//! The fixed catalog of surface materials.

use crate::error::ConfiguratorError;

/// One selectable surface. `id` doubles as the stem of the texture file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MaterialRecord {
    pub id: &'static str,
    pub display_name: &'static str,
}

static CATALOG: [MaterialRecord; 10] = [
    MaterialRecord { id: "Nocturne-Oak", display_name: "Nocturne Oak" },
    MaterialRecord { id: "Ferro-Grafite", display_name: "Ferro Grafite" },
    MaterialRecord { id: "Jarrah", display_name: "Jarrah" },
    MaterialRecord { id: "Lustrous-Elm-Natural", display_name: "Lustrous Elm" },
    MaterialRecord { id: "Marmo-Grigio", display_name: "Marmo Grigio" },
    MaterialRecord { id: "Midnight-Oak", display_name: "Midnight Oak" },
    MaterialRecord { id: "Oxidised-Beamwood", display_name: "Oxidised Beamwood" },
    MaterialRecord { id: "Sepia-Walnut", display_name: "Sepia Walnut" },
    MaterialRecord { id: "Smoked-Birchply-Natural", display_name: "Smoked Birchply" },
    MaterialRecord { id: "Tinted-Paper-Terrazo", display_name: "Tinted Paper Terrazo" },
];

/// All materials in presentation order.
pub fn list() -> &'static [MaterialRecord] {
    &CATALOG
}

pub fn find(id: &str) -> Option<&'static MaterialRecord> {
    CATALOG.iter().find(|record| record.id == id)
}

pub fn lookup(id: &str) -> Result<&'static MaterialRecord, ConfiguratorError> {
    find(id).ok_or_else(|| ConfiguratorError::UnknownMaterialId(id.to_string()))
}

pub fn default_material() -> &'static MaterialRecord {
    &CATALOG[0]
}
