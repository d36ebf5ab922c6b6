use telekin::core::models::fragment::Fragment;
use telekin::core::models::layer::{Thickness, ThicknessUnit};

/// Fallback values for one layer of the stack.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerDefaults {
    pub z: u32,
    pub a: u32,
    pub thickness: Thickness,
    pub present: bool,
}

impl LayerDefaults {
    const fn new(z: u32, a: u32, value: f64, unit: ThicknessUnit, present: bool) -> Self {
        Self {
            z,
            a,
            thickness: Thickness { value, unit },
            present,
        }
    }
}

/// The reference experiment: 16 MeV protons on a 4 mg/cm² ²⁸Si target,
/// detected by a Si dE/E telescope behind an Al absorber.
pub struct DefaultsConfig {
    pub beam_z: u32,
    pub beam_a: u32,
    pub beam_energy: f64,
    pub target: LayerDefaults,
    pub front_foil: LayerDefaults,
    pub back_foil: LayerDefaults,
    pub delta_e: LayerDefaults,
    pub absorber: LayerDefaults,
    pub e_detector: LayerDefaults,
    pub strip: u32,
    pub backward: bool,
    pub excitation_start: f64,
    pub excitation_stop: f64,
    pub excitation_step: f64,
    pub fragments: Vec<Fragment>,
    pub scatter_excitations: Vec<f64>,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            beam_z: 1,
            beam_a: 1,
            beam_energy: 16.0,
            target: LayerDefaults::new(14, 28, 4.0, ThicknessUnit::MgPerCm2, true),
            front_foil: LayerDefaults::new(13, 27, 0.5, ThicknessUnit::MgPerCm2, false),
            back_foil: LayerDefaults::new(13, 27, 0.5, ThicknessUnit::MgPerCm2, false),
            delta_e: LayerDefaults::new(14, 28, 130.0, ThicknessUnit::Micrometer, true),
            absorber: LayerDefaults::new(13, 27, 10.5, ThicknessUnit::Micrometer, true),
            e_detector: LayerDefaults::new(14, 28, 1550.0, ThicknessUnit::Micrometer, true),
            strip: 4,
            backward: false,
            excitation_start: 0.0,
            excitation_stop: 16.0,
            excitation_step: 0.1,
            fragments: Fragment::LIGHT.to_vec(),
            scatter_excitations: vec![0.0],
        }
    }
}
