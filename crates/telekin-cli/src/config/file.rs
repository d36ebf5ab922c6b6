use crate::error::{CliError, Result};
use serde::Deserialize;
use telekin::core::models::layer::{Thickness, ThicknessUnit};
use telekin::core::tables::elements;

/// An element written either as its atomic number or as its symbol.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum ElementSpec {
    Number(u32),
    Symbol(String),
}

impl ElementSpec {
    pub fn resolve(&self) -> Result<u32> {
        match self {
            ElementSpec::Number(z) => Ok(*z),
            ElementSpec::Symbol(symbol) => elements::lookup_symbol(symbol)
                .map_err(|e| CliError::Config(e.to_string())),
        }
    }
}

impl From<&str> for ElementSpec {
    fn from(value: &str) -> Self {
        match value.trim().parse() {
            Ok(z) => ElementSpec::Number(z),
            Err(_) => ElementSpec::Symbol(value.trim().to_string()),
        }
    }
}

/// A thickness written as `"130um"` or as `{ value = 130.0, unit = "um" }`.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum ThicknessSpec {
    Compact(String),
    Explicit {
        value: f64,
        #[serde(default)]
        unit: ThicknessUnit,
    },
}

impl ThicknessSpec {
    pub fn resolve(&self) -> Result<Thickness> {
        let thickness = match self {
            ThicknessSpec::Compact(text) => text.parse(),
            ThicknessSpec::Explicit { value, unit } => Thickness::new(*value, *unit),
        };
        thickness.map_err(|e| CliError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Holder {
        element: ElementSpec,
        thickness: ThicknessSpec,
    }

    #[test]
    fn element_and_thickness_accept_both_forms() {
        let h: Holder = toml::from_str("element = 14\nthickness = \"130um\"").unwrap();
        assert_eq!(h.element.resolve().unwrap(), 14);
        let t = h.thickness.resolve().unwrap();
        assert_eq!((t.value, t.unit), (130.0, ThicknessUnit::Micrometer));

        let h: Holder =
            toml::from_str("element = \"au\"\nthickness = { value = 2.5, unit = \"g/cm2\" }")
                .unwrap();
        assert_eq!(h.element.resolve().unwrap(), 79);
        let t = h.thickness.resolve().unwrap();
        assert_eq!((t.value, t.unit), (2.5, ThicknessUnit::GPerCm2));
    }

    #[test]
    fn explicit_thickness_defaults_to_mg_per_cm2() {
        let h: Holder = toml::from_str("element = 6\nthickness = { value = 0.1 }").unwrap();
        assert_eq!(h.thickness.resolve().unwrap().unit, ThicknessUnit::MgPerCm2);
    }

    #[test]
    fn negative_thickness_and_unknown_symbol_are_config_errors() {
        let bad = ThicknessSpec::Explicit {
            value: -1.0,
            unit: ThicknessUnit::Micrometer,
        };
        assert!(matches!(bad.resolve(), Err(CliError::Config(_))));
        assert!(matches!(
            ElementSpec::from("Zz").resolve(),
            Err(CliError::Config(_))
        ));
    }

    #[test]
    fn element_spec_from_text_prefers_numbers() {
        assert_eq!(ElementSpec::from("13"), ElementSpec::Number(13));
        assert_eq!(ElementSpec::from(" Al "), ElementSpec::Symbol("Al".to_string()));
    }
}
