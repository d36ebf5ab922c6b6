use crate::cli::AngleArgs;
use crate::error::{CliError, Result};
use telekin::engine::config::Geometry;

pub async fn run(args: AngleArgs) -> Result<()> {
    println!("{}", describe(args.strip, args.backward)?);
    Ok(())
}

fn describe(strip: u32, backward: bool) -> Result<String> {
    let geometry =
        Geometry::from_strip(strip, backward).map_err(|e| CliError::Argument(e.to_string()))?;
    let side = if backward { "backward" } else { "forward" };
    Ok(format!(
        "Strip {} ({}): angle {:.1}°, incidence {:.1}°",
        strip, side, geometry.angle, geometry.incidence
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_and_backward_strips_are_described() {
        assert_eq!(
            describe(4, false).unwrap(),
            "Strip 4 (forward): angle 48.0°, incidence 1.0°"
        );
        assert_eq!(
            describe(1, true).unwrap(),
            "Strip 1 (backward): angle 138.0°, incidence 5.0°"
        );
    }

    #[test]
    fn strip_zero_is_an_argument_error() {
        assert!(matches!(describe(0, false), Err(CliError::Argument(_))));
    }
}
