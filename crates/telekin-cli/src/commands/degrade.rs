use crate::cli::DegradeArgs;
use crate::error::{CliError, Result};
use telekin::core::models::layer::{Layer, Thickness};
use telekin::core::models::particle::{Nuclide, Particle};
use telekin::core::physics::integrator::{self, Transit, TransitOutcome};
use telekin::core::physics::stopping;
use telekin::core::tables::elements::{self, ElementRecord};
use telekin::engine::error::EngineError;
use tracing::info;

pub async fn run(args: DegradeArgs) -> Result<()> {
    let report = degrade(args.projectile, args.energy, args.material, args.thickness)?;
    println!("{}", report);
    Ok(())
}

fn degrade(projectile: Nuclide, energy: f64, material: u32, thickness: Thickness) -> Result<String> {
    let particle =
        Particle::from_nuclide(projectile, energy).map_err(|e| CliError::Argument(e.to_string()))?;
    let record = elements::lookup(material).map_err(|e| CliError::Argument(e.to_string()))?;
    let layer = Layer::new(material, record.default_mass_number(), thickness);

    info!(
        projectile = %projectile,
        energy,
        material = record.symbol,
        thickness = %thickness,
        "Degrading through a single layer"
    );
    let transit = integrator::degrade(&particle, &layer, record).map_err(EngineError::from)?;
    Ok(describe(&particle, record, &layer, &transit))
}

fn describe(particle: &Particle, record: &ElementRecord, layer: &Layer, transit: &Transit) -> String {
    let areal = layer.thickness.areal_density(record);
    let power = stopping::stopping_power(particle, record);
    let mut lines = vec![
        format!(
            "{} at {:.3} MeV through {} {} ({:.4} mg/cm2)",
            particle.nuclide, particle.energy, layer.thickness, record.symbol, areal
        ),
        format!(
            "  stopping power: {:.4} MeV/(mg/cm2), {:.5} MeV/um",
            power.per_areal_density(),
            power.per_micrometer()
        ),
    ];
    if transit.degenerate {
        lines.push(format!("  no stopping data for {}; energy unchanged", record.symbol));
    }
    match transit.outcome {
        TransitOutcome::Exited { energy } => lines.push(format!(
            "  exit energy: {:.4} MeV (loss {:.4} MeV, straggling σ {:.1} keV)",
            energy,
            transit.energy_loss(particle.energy),
            transit.straggling_variance.sqrt() * 1000.0
        )),
        TransitOutcome::Stopped { depth } => {
            let microns = if record.density > 0.0 {
                format!(" = {:.2} um", depth / (record.density * 0.1))
            } else {
                String::new()
            };
            lines.push(format!("  stopped at depth {:.4} mg/cm2{}", depth, microns));
        }
    }
    lines.join("\n")
}
