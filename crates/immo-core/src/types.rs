use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::TaxError;

/// Property category used by the property-tax base rates and type factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum PropertyType {
    Residential,
    Commercial,
    Industrial,
    Agricultural,
}

impl PropertyType {
    pub const ALL: [PropertyType; 4] = [
        PropertyType::Residential,
        PropertyType::Commercial,
        PropertyType::Industrial,
        PropertyType::Agricultural,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            PropertyType::Residential => "residential",
            PropertyType::Commercial => "commercial",
            PropertyType::Industrial => "industrial",
            PropertyType::Agricultural => "agricultural",
        }
    }

    fn aliases(&self) -> &'static [&'static str] {
        match self {
            PropertyType::Residential => &["wohngrundstueck", "wohnen"],
            PropertyType::Commercial => &["gewerbe"],
            PropertyType::Industrial => &["industrie"],
            PropertyType::Agricultural => &["landwirtschaft"],
        }
    }
}

/// How a building is used, which decides the AfA rate and useful life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum UsageCategory {
    Residential,
    Commercial,
    /// Listed building (Denkmal)
    Heritage,
    Mixed,
}

impl UsageCategory {
    pub const ALL: [UsageCategory; 4] = [
        UsageCategory::Residential,
        UsageCategory::Commercial,
        UsageCategory::Heritage,
        UsageCategory::Mixed,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            UsageCategory::Residential => "residential",
            UsageCategory::Commercial => "commercial",
            UsageCategory::Heritage => "heritage",
            UsageCategory::Mixed => "mixed",
        }
    }

    fn aliases(&self) -> &'static [&'static str] {
        match self {
            UsageCategory::Residential => &["wohngebaeude"],
            UsageCategory::Commercial => &["gewerbegebaeude"],
            UsageCategory::Heritage => &["denkmal"],
            UsageCategory::Mixed => &["mischnutzung"],
        }
    }
}

/// Relationship between the deceased/donor and the recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum Relationship {
    Spouse,
    Child,
    Grandchild,
    GreatGrandchild,
    Parent,
    Sibling,
    NieceNephew,
    Other,
    Unrelated,
}

impl Relationship {
    pub const ALL: [Relationship; 9] = [
        Relationship::Spouse,
        Relationship::Child,
        Relationship::Grandchild,
        Relationship::GreatGrandchild,
        Relationship::Parent,
        Relationship::Sibling,
        Relationship::NieceNephew,
        Relationship::Other,
        Relationship::Unrelated,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Relationship::Spouse => "spouse",
            Relationship::Child => "child",
            Relationship::Grandchild => "grandchild",
            Relationship::GreatGrandchild => "great_grandchild",
            Relationship::Parent => "parent",
            Relationship::Sibling => "sibling",
            Relationship::NieceNephew => "niece_nephew",
            Relationship::Other => "other",
            Relationship::Unrelated => "unrelated",
        }
    }

    fn aliases(&self) -> &'static [&'static str] {
        match self {
            Relationship::Spouse => &["ehepartner"],
            Relationship::Child => &["kind"],
            Relationship::Grandchild => &["enkel"],
            Relationship::GreatGrandchild => &["urenkel"],
            Relationship::Parent => &["eltern"],
            Relationship::Sibling => &["geschwister"],
            Relationship::NieceNephew => &["neffe_nichte"],
            Relationship::Other => &["sonstige"],
            Relationship::Unrelated => &["fremde"],
        }
    }
}

/// Statutory tax class (Steuerklasse).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TaxClass {
    #[serde(rename = "I")]
    I,
    #[serde(rename = "II")]
    II,
    #[serde(rename = "III")]
    III,
}

impl fmt::Display for TaxClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaxClass::I => write!(f, "I"),
            TaxClass::II => write!(f, "II"),
            TaxClass::III => write!(f, "III"),
        }
    }
}

/// Whether a transfer is an inheritance or a lifetime gift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum TransferMode {
    Inheritance,
    Gift,
}

impl TransferMode {
    pub const ALL: [TransferMode; 2] = [TransferMode::Inheritance, TransferMode::Gift];

    pub fn code(&self) -> &'static str {
        match self {
            TransferMode::Inheritance => "inheritance",
            TransferMode::Gift => "gift",
        }
    }

    fn aliases(&self) -> &'static [&'static str] {
        match self {
            TransferMode::Inheritance => &["erbschaft"],
            TransferMode::Gift => &["schenkung"],
        }
    }
}

/// Qualitative rating of a net rental yield.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YieldRating {
    Excellent,
    Good,
    Satisfactory,
    Critical,
}

impl YieldRating {
    /// Rate a net yield in percent: >= 6 excellent, >= 4 good, >= 2 satisfactory.
    pub fn from_net_yield(net_yield_percent: f64) -> Self {
        if net_yield_percent >= 6.0 {
            YieldRating::Excellent
        } else if net_yield_percent >= 4.0 {
            YieldRating::Good
        } else if net_yield_percent >= 2.0 {
            YieldRating::Satisfactory
        } else {
            YieldRating::Critical
        }
    }
}

/// Setup effort of a legal ownership structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityTier {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl ComplexityTier {
    pub fn implementation_time(&self) -> &'static str {
        match self {
            ComplexityTier::Low => "1-2 weeks",
            ComplexityTier::Medium => "1-3 months",
            ComplexityTier::High => "3-6 months",
            ComplexityTier::VeryHigh => "6-12 months",
        }
    }
}

macro_rules! category_codes {
    ($ty:ty, $kind:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.code())
            }
        }

        impl FromStr for $ty {
            type Err = TaxError;

            /// Accepts the snake_case code or a German alias, case-insensitive,
            /// with `-` treated as `_`.
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
                <$ty>::ALL
                    .iter()
                    .copied()
                    .find(|c| c.code() == normalized || c.aliases().contains(&normalized.as_str()))
                    .ok_or_else(|| TaxError::unknown($kind, s))
            }
        }

        impl TryFrom<String> for $ty {
            type Error = TaxError;

            fn try_from(code: String) -> Result<Self, Self::Error> {
                code.parse()
            }
        }
    };
}

category_codes!(PropertyType, "property type");
category_codes!(UsageCategory, "usage category");
category_codes!(Relationship, "relationship");
category_codes!(TransferMode, "transfer mode");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_codes_and_aliases() {
        assert_eq!("child".parse::<Relationship>().unwrap(), Relationship::Child);
        assert_eq!("Kind".parse::<Relationship>().unwrap(), Relationship::Child);
        assert_eq!(
            "great-grandchild".parse::<Relationship>().unwrap(),
            Relationship::GreatGrandchild
        );
        assert_eq!("denkmal".parse::<UsageCategory>().unwrap(), UsageCategory::Heritage);
        assert_eq!("schenkung".parse::<TransferMode>().unwrap(), TransferMode::Gift);
    }

    #[test]
    fn test_unknown_code_is_rejected() {
        let err = "cousin".parse::<Relationship>().unwrap_err();
        assert_eq!(
            err,
            TaxError::UnknownCategory {
                kind: "relationship",
                code: "cousin".to_string()
            }
        );
        assert!("villa".parse::<PropertyType>().is_err());
    }

    #[test]
    fn test_deserialize_goes_through_codes() {
        let rel: Relationship = serde_json::from_str("\"Kind\"").unwrap();
        assert_eq!(rel, Relationship::Child);
        let mode: TransferMode = serde_json::from_str("\"erbschaft\"").unwrap();
        assert_eq!(mode, TransferMode::Inheritance);

        let err = serde_json::from_str::<Relationship>("\"cousin\"").unwrap_err();
        assert!(err.to_string().contains("Unknown relationship code: cousin"));
    }

    #[test]
    fn test_display_matches_serde() {
        for rel in Relationship::ALL {
            let json = serde_json::to_string(&rel).unwrap();
            assert_eq!(json, format!("\"{}\"", rel));
        }
        assert_eq!(serde_json::to_string(&TaxClass::II).unwrap(), "\"II\"");
    }

    #[test]
    fn test_yield_rating_thresholds() {
        assert_eq!(YieldRating::from_net_yield(6.0), YieldRating::Excellent);
        assert_eq!(YieldRating::from_net_yield(5.99), YieldRating::Good);
        assert_eq!(YieldRating::from_net_yield(2.0), YieldRating::Satisfactory);
        assert_eq!(YieldRating::from_net_yield(-1.0), YieldRating::Critical);
    }
}
