//! Display metadata for the lasts offered in the sizing flow.

use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LastDescription {
    pub name: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub characteristics: &'static [&'static str],
    pub style: &'static str,
    pub fit: &'static str,
    pub occasions: &'static [&'static str],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub craftsmanship: Option<&'static str>,
}

const LAST_DESCRIPTIONS: &[LastDescription] = &[
    LastDescription {
        name: "palazzo",
        display_name: "Palazzo",
        description: "Soft square toe Albert slipper with refined proportions.",
        characteristics: &["Soft square toe", "Albert slipper design", "Refined proportions"],
        style: "Albert Slipper",
        fit: "Standard width with refined comfort",
        occasions: &["Indoor luxury", "Evening wear"],
        craftsmanship: Some("Goodyear welted construction"),
    },
    LastDescription {
        name: "santiago",
        display_name: "Santiago",
        description: "Albert slipper with generous proportions for maximum comfort.",
        characteristics: &["Albert slipper design", "Generous proportions", "Maximum comfort"],
        style: "Comfort Albert Slipper",
        fit: "Generous fit for maximum comfort",
        occasions: &["Indoor luxury", "Traditional comfort"],
        craftsmanship: Some("Premium construction"),
    },
    LastDescription {
        name: "cadiz",
        display_name: "Cadiz",
        description: "Chisel toe with narrow waist and Cuban heel.",
        characteristics: &["Chisel toe", "Narrow waist", "Cuban heel"],
        style: "Continental Chisel",
        fit: "Refined fit with narrow waist",
        occasions: &["Formal business", "European style"],
        craftsmanship: Some("Goodyear welted"),
    },
    LastDescription {
        name: "vizcaya",
        display_name: "Vizcaya",
        description: "Soft chisel toe with sleek and refined proportions.",
        characteristics: &["Soft chisel toe", "Sleek proportions", "Refined elegance"],
        style: "Modern Soft Chisel",
        fit: "Classic fit with refined proportions",
        occasions: &["Modern business", "Sophisticated occasions"],
        craftsmanship: Some("Goodyear welted construction"),
    },
    LastDescription {
        name: "alhambra",
        display_name: "Alhambra",
        description: "Rounded toe in British tradition.",
        characteristics: &["Rounded toe", "British tradition", "Heritage elegance"],
        style: "British",
        fit: "Precise fit with British proportions",
        occasions: &["Traditional business", "British heritage"],
        craftsmanship: Some("Goodyear welted with burnished finish"),
    },
    LastDescription {
        name: "prado",
        display_name: "Prado",
        description: "Soft square toe with commanding presence.",
        characteristics: &["Soft square toe", "Commanding presence", "Traditional elegance"],
        style: "Traditional Soft Square",
        fit: "Generous fit with traditional proportions",
        occasions: &["Traditional business", "Authoritative presence"],
        craftsmanship: Some("Premium construction"),
    },
];

/// All catalog entries, in presentation order.
pub fn all_last_descriptions() -> &'static [LastDescription] {
    LAST_DESCRIPTIONS
}

/// Case-insensitive lookup by last name.
pub fn last_description(name: &str) -> Option<&'static LastDescription> {
    let name = name.trim();
    LAST_DESCRIPTIONS.iter().find(|entry| entry.name.eq_ignore_ascii_case(name))
}

/// Customer-facing name, falling back to the raw key for uncatalogued lasts.
pub fn display_name(last_type: &str) -> String {
    last_description(last_type)
        .map(|entry| entry.display_name.to_string())
        .unwrap_or_else(|| last_type.to_string())
}
