use super::layer::{Layer, LayerRole};
use crate::core::tables::elements::ElementRecord;

/// Cosines below this are treated as a path parallel to the target plane.
pub const GRAZING_COSINE: f64 = 1e-6;

/// The full layer stack, listed in traversal order.
///
/// The beam crosses the front foil and the first half of the target. The
/// ejectile leaves through the second target half and the exit foil before
/// entering the telescope (dE detector, absorber, E detector).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelescopeStack {
    pub front_foil: Layer,
    pub target: Layer,
    pub back_foil: Layer,
    pub delta_e: Layer,
    pub absorber: Layer,
    pub e: Layer,
}

/// One traversal of a layer along a particle path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathSegment {
    pub role: LayerRole,
    pub layer: Layer,
    /// Fraction of the layer thickness crossed along the normal.
    pub fraction: f64,
    /// Path length multiplier from the crossing angle (1/cos).
    pub obliquity: f64,
}

impl PathSegment {
    /// Mass thickness actually crossed, in mg/cm².
    ///
    /// A layer of zero thickness stays empty even on a grazing path.
    pub fn areal_density(&self, material: &ElementRecord) -> f64 {
        let normal = self.layer.thickness.areal_density(material) * self.fraction;
        if normal == 0.0 {
            0.0
        } else {
            normal * self.obliquity
        }
    }
}

impl TelescopeStack {
    pub fn layer(&self, role: LayerRole) -> &Layer {
        match role {
            LayerRole::FrontFoil => &self.front_foil,
            LayerRole::Target => &self.target,
            LayerRole::BackFoil => &self.back_foil,
            LayerRole::DeltaE => &self.delta_e,
            LayerRole::Absorber => &self.absorber,
            LayerRole::E => &self.e,
        }
    }

    pub fn beam_path(&self) -> Vec<PathSegment> {
        let mut path = Vec::with_capacity(2);
        if self.front_foil.is_active() {
            path.push(self.segment(LayerRole::FrontFoil, 1.0, 1.0));
        }
        path.push(self.segment(LayerRole::Target, 0.5, 1.0));
        path
    }

    /// Layers crossed by the ejectile before the telescope, for a lab angle in degrees.
    ///
    /// Forward ejectiles leave through the back foil, backward ones through the
    /// front foil. At 90° the path inside the target is unbounded.
    pub fn exit_path(&self, angle_deg: f64) -> Vec<PathSegment> {
        let cosine = angle_deg.to_radians().cos().abs();
        let obliquity = if cosine < GRAZING_COSINE {
            f64::INFINITY
        } else {
            1.0 / cosine
        };

        let mut path = vec![self.segment(LayerRole::Target, 0.5, obliquity)];
        let exit_foil = if angle_deg < 90.0 {
            LayerRole::BackFoil
        } else {
            LayerRole::FrontFoil
        };
        if self.layer(exit_foil).is_active() {
            path.push(self.segment(exit_foil, 1.0, obliquity));
        }
        path
    }

    /// Telescope layers for an incidence angle in degrees relative to the detector normal.
    pub fn telescope_path(&self, incidence_deg: f64) -> Vec<PathSegment> {
        let obliquity = 1.0 / incidence_deg.to_radians().cos().abs().max(GRAZING_COSINE);
        let mut path = vec![self.segment(LayerRole::DeltaE, 1.0, obliquity)];
        if self.absorber.is_active() {
            path.push(self.segment(LayerRole::Absorber, 1.0, obliquity));
        }
        path.push(self.segment(LayerRole::E, 1.0, obliquity));
        path
    }

    fn segment(&self, role: LayerRole, fraction: f64, obliquity: f64) -> PathSegment {
        PathSegment {
            role,
            layer: *self.layer(role),
            fraction,
            obliquity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::layer::Thickness;
    use crate::core::tables::elements::lookup;

    fn stack(front: bool, back: bool, absorber: bool) -> TelescopeStack {
        let foil = Thickness::mg_per_cm2(0.5).unwrap();
        TelescopeStack {
            front_foil: Layer::new(13, 27, foil).with_presence(front),
            target: Layer::new(14, 28, Thickness::mg_per_cm2(4.0).unwrap()),
            back_foil: Layer::new(13, 27, foil).with_presence(back),
            delta_e: Layer::new(14, 28, Thickness::micrometers(130.0).unwrap()),
            absorber: Layer::new(13, 27, Thickness::micrometers(10.5).unwrap())
                .with_presence(absorber),
            e: Layer::new(14, 28, Thickness::micrometers(1550.0).unwrap()),
        }
    }

    fn roles(path: &[PathSegment]) -> Vec<LayerRole> {
        path.iter().map(|s| s.role).collect()
    }

    #[test]
    fn beam_path_crosses_front_foil_and_half_target() {
        let path = stack(true, true, true).beam_path();
        assert_eq!(roles(&path), vec![LayerRole::FrontFoil, LayerRole::Target]);
        assert_eq!(path[1].fraction, 0.5);

        let path = stack(false, true, true).beam_path();
        assert_eq!(roles(&path), vec![LayerRole::Target]);
    }

    #[test]
    fn forward_ejectiles_exit_through_back_foil() {
        let path = stack(true, true, true).exit_path(48.0);
        assert_eq!(roles(&path), vec![LayerRole::Target, LayerRole::BackFoil]);
        let expected = 1.0 / 48.0_f64.to_radians().cos();
        assert!((path[0].obliquity - expected).abs() < 1e-12);
    }

    #[test]
    fn backward_ejectiles_exit_through_front_foil() {
        let path = stack(true, false, true).exit_path(132.0);
        assert_eq!(roles(&path), vec![LayerRole::Target, LayerRole::FrontFoil]);
        assert!(path[0].obliquity > 1.0);
    }

    #[test]
    fn grazing_exit_path_is_unbounded_but_empty_layers_stay_empty() {
        let mut layers = stack(false, false, false);
        let si = lookup(14).unwrap();
        let path = layers.exit_path(90.0);
        assert!(path[0].areal_density(si).is_infinite());

        layers.target.thickness = Thickness::zero();
        let path = layers.exit_path(90.0);
        assert_eq!(path[0].areal_density(si), 0.0);
    }

    #[test]
    fn telescope_path_skips_absent_absorber_and_scales_by_incidence() {
        let path = stack(false, false, false).telescope_path(60.0);
        assert_eq!(roles(&path), vec![LayerRole::DeltaE, LayerRole::E]);
        assert!((path[0].obliquity - 2.0).abs() < 1e-9);

        let path = stack(false, false, true).telescope_path(0.0);
        assert_eq!(
            roles(&path),
            vec![LayerRole::DeltaE, LayerRole::Absorber, LayerRole::E]
        );
    }
}
