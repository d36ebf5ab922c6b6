use telekin::core::models::fragment::Fragment;
use telekin::core::models::particle::Nuclide;
use telekin::core::tables::elements;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid nuclide '{0}'. Expected 'Z,A' (e.g., '2,4').")]
    InvalidNuclide(String),

    #[error("Unknown element '{0}'. Expected a symbol (e.g., 'Si') or an atomic number.")]
    UnknownElement(String),

    #[error("Unknown fragment '{0}'. Expected p, d, t, 3He, a or 'Z,A'.")]
    UnknownFragment(String),
}

/// Parses `Z,A`, as in `--projectile 2,4`.
pub fn parse_nuclide(s: &str) -> Result<Nuclide, ParseError> {
    let invalid = || ParseError::InvalidNuclide(s.to_string());
    let (z, a) = s.split_once(',').ok_or_else(invalid)?;
    let z: i64 = z.trim().parse().map_err(|_| invalid())?;
    let a: i64 = a.trim().parse().map_err(|_| invalid())?;
    Nuclide::checked(z, a).map_err(|_| invalid())
}

/// Accepts an element symbol in any case or a bare atomic number.
pub fn parse_element(s: &str) -> Result<u32, ParseError> {
    let trimmed = s.trim();
    if let Ok(z) = trimmed.parse::<u32>() {
        return Ok(z);
    }
    elements::lookup_symbol(trimmed).map_err(|_| ParseError::UnknownElement(trimmed.to_string()))
}

pub fn parse_fragment(s: &str) -> Result<Fragment, ParseError> {
    let trimmed = s.trim();
    let fragment = match trimmed.to_ascii_lowercase().as_str() {
        "p" | "proton" => Fragment::Proton,
        "d" | "deuteron" => Fragment::Deuteron,
        "t" | "triton" => Fragment::Triton,
        "3he" | "he3" | "helium3" => Fragment::Helium3,
        "a" | "alpha" | "4he" => Fragment::Alpha,
        _ => {
            let nuclide = parse_nuclide(trimmed)
                .map_err(|_| ParseError::UnknownFragment(trimmed.to_string()))?;
            Fragment::from_nuclide(nuclide)
        }
    };
    Ok(fragment)
}

/// Splits a comma- or whitespace-separated list of fragment names.
///
/// Nuclide pairs must use the `Z:A` form here since commas separate entries.
pub fn parse_fragment_list(s: &str) -> Result<Vec<Fragment>, ParseError> {
    s.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|item| !item.is_empty())
        .map(|item| parse_fragment(&item.replace(':', ",")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nuclide_is_parsed_from_charge_and_mass() {
        assert_eq!(parse_nuclide("2,4"), Ok(Nuclide { z: 2, a: 4 }));
        assert_eq!(parse_nuclide(" 1 , 1 "), Ok(Nuclide { z: 1, a: 1 }));
    }

    #[test]
    fn malformed_nuclides_are_rejected() {
        for input in ["2", "2,x", "3,2", "-1,4", ""] {
            assert_eq!(
                parse_nuclide(input),
                Err(ParseError::InvalidNuclide(input.to_string())),
                "{input}"
            );
        }
    }

    #[test]
    fn element_accepts_symbols_and_numbers() {
        assert_eq!(parse_element("Si"), Ok(14));
        assert_eq!(parse_element("al"), Ok(13));
        assert_eq!(parse_element("79"), Ok(79));
        assert_eq!(
            parse_element("Xx"),
            Err(ParseError::UnknownElement("Xx".to_string()))
        );
    }

    #[test]
    fn atomic_numbers_outside_the_table_are_left_for_the_core_to_reject() {
        assert_eq!(parse_element("120"), Ok(120));
    }

    #[test]
    fn fragment_names_and_nuclides_are_recognized() {
        assert_eq!(parse_fragment("p"), Ok(Fragment::Proton));
        assert_eq!(parse_fragment("3He"), Ok(Fragment::Helium3));
        assert_eq!(parse_fragment("alpha"), Ok(Fragment::Alpha));
        assert_eq!(parse_fragment("2,4"), Ok(Fragment::Alpha));
        assert_eq!(parse_fragment("3,7"), Ok(Fragment::Other { z: 3, a: 7 }));
        assert!(parse_fragment("x").is_err());
    }

    #[test]
    fn fragment_lists_use_colon_pairs() {
        assert_eq!(
            parse_fragment_list("p, d 3:7"),
            Ok(vec![
                Fragment::Proton,
                Fragment::Deuteron,
                Fragment::Other { z: 3, a: 7 }
            ])
        );
    }
}
