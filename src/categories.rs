use serde::Serialize;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Purple,
    Blue,
    Cyan,
    Orange,
    Green,
    Teal,
    Fuchsia,
    Yellow,
    Gray,
}

impl Variant {
    /// Tailwind classes for the category badge.
    pub fn badge_class(self) -> &'static str {
        match self {
            Variant::Purple => "bg-purple-100 text-purple-800",
            Variant::Blue => "bg-blue-100 text-blue-800",
            Variant::Cyan => "bg-cyan-100 text-cyan-800",
            Variant::Orange => "bg-orange-100 text-orange-800",
            Variant::Green => "bg-green-100 text-green-800",
            Variant::Teal => "bg-teal-100 text-teal-800",
            Variant::Fuchsia => "bg-fuchsia-100 text-fuchsia-800",
            Variant::Yellow => "bg-yellow-100 text-yellow-800",
            Variant::Gray => "bg-gray-100 text-gray-800",
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct Category {
    pub label: &'static str,
    pub value: &'static str,
    pub variant: Variant,
}

/// Values are matched exactly, case included.
pub static CATEGORIES: &[Category] = &[
    Category { label: "Inspirations", value: "Inspirations", variant: Variant::Purple },
    Category { label: "Registries", value: "registries", variant: Variant::Blue },
    Category { label: "Portfolios", value: "portfolios", variant: Variant::Cyan },
    Category { label: "Tools", value: "Tools", variant: Variant::Orange },
    Category { label: "Articles", value: "Articles", variant: Variant::Green },
    Category { label: "Services", value: "Services", variant: Variant::Teal },
    Category { label: "Templates", value: "templates", variant: Variant::Fuchsia },
    Category { label: "My Stuff", value: "my-stuff", variant: Variant::Yellow },
    Category { label: "Others", value: "Others", variant: Variant::Gray },
];

pub fn find(value: &str) -> Option<&'static Category> {
    CATEGORIES.iter().find(|c| c.value == value)
}

pub fn is_known(value: &str) -> bool {
    find(value).is_some()
}
