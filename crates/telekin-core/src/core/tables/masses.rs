use phf::{Map, phf_map};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

/// Atomic mass unit in MeV/c².
pub const AMU_MEV: f64 = 931.494_102_42;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("No mass excess is known for nuclide Z={z}, A={a}")]
pub struct UnknownNuclide {
    pub z: u32,
    pub a: u32,
}

#[derive(Debug, Error)]
pub enum MassTableError {
    #[error("CSV parsing error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
    #[error("Invalid mass overlay entry in '{path}': Z={z}, A={a} ({reason})")]
    InvalidEntry {
        path: String,
        z: u32,
        a: u32,
        reason: &'static str,
    },
}

#[inline]
const fn key(z: u32, a: u32) -> u32 {
    z * 1000 + a
}

// Atomic mass excesses in keV from the Atomic Mass Evaluation, keyed by Z * 1000 + A.
// Every stable or long-lived nuclide up to uranium is present, together with the
// short-lived light and iron-group residuals of common transfer reactions.
static MASS_EXCESS_KEV: Map<u32, f64> = phf_map! {
    1u32 => 8071.318,
    1001u32 => 7288.971, 1002u32 => 13135.722, 1003u32 => 14949.810,
    2003u32 => 14931.218, 2004u32 => 2424.916, 2006u32 => 17592.10,
    3006u32 => 14086.879, 3007u32 => 14907.105, 3008u32 => 20945.80,
    4007u32 => 15769.00, 4008u32 => 4941.67, 4009u32 => 11348.45, 4010u32 => 12607.49,
    5008u32 => 22921.6, 5009u32 => 12416.5, 5010u32 => 12050.611, 5011u32 => 8667.708,
    5012u32 => 13368.9,
    6010u32 => 15698.7, 6011u32 => 10649.4, 6012u32 => 0.0, 6013u32 => 3125.009,
    6014u32 => 3019.893,
    7012u32 => 17338.1, 7013u32 => 5345.48, 7014u32 => 2863.417, 7015u32 => 101.439,
    7016u32 => 5683.9,
    8014u32 => 8007.46, 8015u32 => 2855.6, 8016u32 => -4737.001, 8017u32 => -808.76,
    8018u32 => -782.82, 8019u32 => 3332.9,
    9017u32 => 1951.70, 9018u32 => 873.1, 9019u32 => -1487.44, 9020u32 => -17.46,
    10018u32 => 5317.6, 10019u32 => 1752.05, 10020u32 => -7041.93, 10021u32 => -5731.78,
    10022u32 => -8024.72, 10023u32 => -5154.0,
    11021u32 => -2184.6, 11022u32 => -5181.5, 11023u32 => -9529.85, 11024u32 => -8417.9,
    12022u32 => -399.9, 12023u32 => -5473.7, 12024u32 => -13933.57, 12025u32 => -13192.78,
    12026u32 => -16214.55, 12027u32 => -14586.6,
    13025u32 => -8916.2, 13026u32 => -12210.3, 13027u32 => -17196.86, 13028u32 => -16850.6,
    13029u32 => -18215.5,
    14026u32 => -7141.0, 14027u32 => -12384.3, 14028u32 => -21492.79, 14029u32 => -21895.08,
    14030u32 => -24432.96, 14031u32 => -22949.0,
    15029u32 => -16952.6, 15030u32 => -20200.9, 15031u32 => -24440.54, 15032u32 => -24304.9,
    16031u32 => -19042.5, 16032u32 => -26015.53, 16033u32 => -26585.85, 16034u32 => -29931.79,
    16035u32 => -28846.2, 16036u32 => -30664.1,
    17033u32 => -21003.3, 17034u32 => -24440.1, 17035u32 => -29013.53, 17036u32 => -29522.0,
    17037u32 => -31761.54,
    18036u32 => -30231.54, 18037u32 => -30947.7, 18038u32 => -34714.8, 18039u32 => -33242.0,
    18040u32 => -35039.89,
    19039u32 => -33807.19, 19040u32 => -33535.2, 19041u32 => -35559.07,
    20040u32 => -34846.3, 20041u32 => -35137.9, 20042u32 => -38547.2, 20043u32 => -38408.8,
    20044u32 => -41468.7, 20046u32 => -43138.4, 20048u32 => -44224.8,
    21045u32 => -41071.9,
    22046u32 => -44127.8, 22047u32 => -44936.7, 22048u32 => -48491.7, 22049u32 => -48563.8,
    22050u32 => -51430.7,
    23050u32 => -49223.9, 23051u32 => -52203.8,
    24050u32 => -50261.7, 24052u32 => -55418.1, 24053u32 => -55285.9, 24054u32 => -56933.7,
    25054u32 => -55556.5, 25055u32 => -57712.4,
    26054u32 => -56252.5, 26055u32 => -57479.4, 26056u32 => -60607.1, 26057u32 => -60181.4,
    26058u32 => -62155.1,
    27057u32 => -59344.2, 27059u32 => -62229.9, 27060u32 => -61649.0,
    28058u32 => -60228.4, 28059u32 => -61156.1, 28060u32 => -64472.5, 28061u32 => -64221.3,
    28062u32 => -66745.9, 28063u32 => -65512.5, 28064u32 => -67098.5,
    29063u32 => -65579.8, 29065u32 => -67263.7,
    30064u32 => -66004.0, 30066u32 => -68899.1, 30067u32 => -67880.1, 30068u32 => -70006.9,
    30070u32 => -69564.7,
    31069u32 => -69327.8, 31071u32 => -70139.1,
    32070u32 => -70561.8, 32072u32 => -72585.9, 32073u32 => -71297.5, 32074u32 => -73422.5,
    32076u32 => -73212.9,
    33075u32 => -73034.2,
    34074u32 => -72213.2, 34076u32 => -75252.0, 34077u32 => -74599.5, 34078u32 => -77025.9,
    34080u32 => -77759.5, 34082u32 => -77593.9,
    35079u32 => -76068.0, 35081u32 => -77975.7,
    36078u32 => -74179.6, 36080u32 => -77893.3, 36082u32 => -80590.3, 36083u32 => -79990.0,
    36084u32 => -82439.3, 36086u32 => -83265.7,
    37085u32 => -82167.3, 37087u32 => -84597.8,
    38084u32 => -80649.6, 38086u32 => -84523.2, 38087u32 => -84880.1, 38088u32 => -87921.4,
    39089u32 => -87709.2,
    40090u32 => -88773.5, 40091u32 => -87896.2, 40092u32 => -88459.6, 40094u32 => -87270.9,
    40096u32 => -85444.6,
    41093u32 => -87213.0,
    42092u32 => -86807.8, 42094u32 => -88412.9, 42095u32 => -87710.6, 42096u32 => -88793.6,
    42097u32 => -87543.6, 42098u32 => -88114.9, 42100u32 => -86189.5,
    43097u32 => -87218.9, 43098u32 => -86431.1, 43099u32 => -87326.8,
    44096u32 => -86079.1, 44098u32 => -88224.8, 44099u32 => -87621.8, 44100u32 => -89223.8,
    44101u32 => -87954.6, 44102u32 => -89102.9, 44104u32 => -88093.7,
    45103u32 => -88028.1,
    46102u32 => -87931.0, 46104u32 => -89395.0, 46105u32 => -88417.8, 46106u32 => -89907.4,
    46108u32 => -89524.4, 46110u32 => -88331.5,
    47107u32 => -88406.6, 47109u32 => -88719.9,
    48106u32 => -87132.1, 48108u32 => -89252.6, 48110u32 => -90348.8, 48111u32 => -89253.1,
    48112u32 => -90575.8, 48113u32 => -89043.3, 48114u32 => -90014.8, 48116u32 => -88712.6,
    49113u32 => -89365.8, 49115u32 => -89536.4,
    50112u32 => -88656.0, 50114u32 => -90557.3, 50115u32 => -90033.8, 50116u32 => -91526.0,
    50117u32 => -90397.8, 50118u32 => -91652.9, 50119u32 => -90065.1, 50120u32 => -91098.6,
    50122u32 => -89941.5, 50124u32 => -88234.3,
    51121u32 => -89598.6, 51123u32 => -89224.8,
    52120u32 => -89368.2, 52122u32 => -90314.4, 52123u32 => -89172.1, 52124u32 => -90525.3,
    52125u32 => -89023.0, 52126u32 => -90065.3, 52128u32 => -88993.8, 52130u32 => -87353.0,
    53127u32 => -88983.9,
    54124u32 => -87661.0, 54126u32 => -89145.6, 54128u32 => -89860.3, 54129u32 => -88696.1,
    54130u32 => -89880.5, 54131u32 => -88413.6, 54132u32 => -89279.0, 54134u32 => -88124.3,
    54136u32 => -86429.2,
    55133u32 => -88070.9,
    56130u32 => -87261.7, 56132u32 => -88435.0, 56134u32 => -88950.1, 56135u32 => -87850.7,
    56136u32 => -88887.1, 56137u32 => -87721.5, 56138u32 => -88261.9,
    57138u32 => -86521.9, 57139u32 => -87228.6,
    58136u32 => -86508.6, 58138u32 => -87568.8, 58140u32 => -88079.2, 58142u32 => -84532.7,
    59141u32 => -86016.4,
    60142u32 => -85949.9, 60143u32 => -84002.1, 60144u32 => -83747.8, 60145u32 => -81431.9,
    60146u32 => -80925.8, 60148u32 => -77407.8, 60150u32 => -73679.1,
    61145u32 => -81267.4, 61147u32 => -79041.9,
    62144u32 => -81965.4, 62147u32 => -79266.0, 62148u32 => -79336.1, 62149u32 => -77135.1,
    62150u32 => -77050.5, 62152u32 => -74762.0, 62154u32 => -72454.5,
    63151u32 => -74652.0, 63153u32 => -73366.3,
    64152u32 => -74706.3, 64154u32 => -73705.3, 64155u32 => -72069.2, 64156u32 => -72534.3,
    64157u32 => -70822.8, 64158u32 => -70688.9, 64160u32 => -67940.9,
    65159u32 => -69531.7,
    66156u32 => -70528.4, 66158u32 => -70406.1, 66160u32 => -69671.5, 66161u32 => -68054.5,
    66162u32 => -68180.2, 66163u32 => -66379.9, 66164u32 => -65966.6,
    67165u32 => -64898.3,
    68162u32 => -66333.2, 68164u32 => -65941.6, 68166u32 => -64925.6, 68167u32 => -63290.7,
    68168u32 => -62990.7, 68170u32 => -60109.1,
    69169u32 => -61275.6,
    70168u32 => -61581.4, 70170u32 => -60764.7, 70171u32 => -59308.0, 70172u32 => -59256.2,
    70173u32 => -57552.3, 70174u32 => -56945.6, 70176u32 => -53489.7,
    71175u32 => -55167.6, 71176u32 => -53384.2,
    72174u32 => -55846.7, 72176u32 => -54578.5, 72177u32 => -52883.1, 72178u32 => -52437.7,
    72179u32 => -50465.4, 72180u32 => -49781.8,
    73180u32 => -48936.2, 73181u32 => -48441.6,
    74180u32 => -49638.6, 74182u32 => -48247.7, 74183u32 => -46367.2, 74184u32 => -45707.6,
    74186u32 => -42510.8,
    75185u32 => -43822.6, 75187u32 => -41218.5,
    76184u32 => -44256.7, 76186u32 => -43002.4, 76187u32 => -41221.0, 76188u32 => -41139.3,
    76189u32 => -38988.4, 76190u32 => -38709.4, 76192u32 => -35883.9,
    77191u32 => -36710.8, 77193u32 => -34538.3,
    78190u32 => -37325.2, 78192u32 => -36292.2, 78194u32 => -34762.5, 78195u32 => -32796.3,
    78196u32 => -32646.9, 78198u32 => -29905.7,
    79197u32 => -31141.0,
    80196u32 => -31826.7, 80198u32 => -30954.9, 80199u32 => -29546.4, 80200u32 => -29503.6,
    80201u32 => -27662.7, 80202u32 => -27345.5, 80204u32 => -24690.2,
    81203u32 => -25760.8, 81205u32 => -23820.4,
    82204u32 => -25109.4, 82206u32 => -23785.0, 82207u32 => -22451.5, 82208u32 => -21748.1,
    83209u32 => -18258.1,
    84209u32 => -16365.6, 84210u32 => -15952.7,
    85210u32 => -11971.7, 85211u32 => -11646.8,
    86211u32 => -8755.0, 86220u32 => 10613.5, 86222u32 => 16374.0,
    87223u32 => 18384.0,
    88223u32 => 17234.8, 88224u32 => 18827.4, 88226u32 => 23669.5, 88228u32 => 28942.2,
    89227u32 => 25851.1,
    90230u32 => 30864.2, 90232u32 => 35448.8,
    91231u32 => 33425.9,
    92233u32 => 36920.2, 92234u32 => 38146.8, 92235u32 => 40920.6, 92236u32 => 42446.5,
    92238u32 => 47309.1,
};

#[derive(Debug, Deserialize)]
struct OverlayRow {
    z: u32,
    a: u32,
    mass_excess_kev: f64,
}

/// Nuclear mass lookup backed by the built-in mass-excess table.
///
/// Entries loaded from a user CSV overlay take precedence over built-in values.
#[derive(Debug, Clone, Default)]
pub struct MassTable {
    overlay: BTreeMap<(u32, u32), f64>,
}

pub static BUILTIN: MassTable = MassTable::builtin();

impl MassTable {
    pub const fn builtin() -> Self {
        Self {
            overlay: BTreeMap::new(),
        }
    }

    /// Loads a `z,a,mass_excess_kev` CSV on top of the built-in table.
    pub fn with_overlay_csv(path: &Path) -> Result<Self, MassTableError> {
        let mut table = Self::builtin();
        table.load_overlay_csv(path)?;
        Ok(table)
    }

    pub fn load_overlay_csv(&mut self, path: &Path) -> Result<usize, MassTableError> {
        let path_str = path.to_string_lossy().to_string();
        let mut reader = csv::Reader::from_path(path).map_err(|e| MassTableError::Csv {
            path: path_str.clone(),
            source: e,
        })?;

        let mut count = 0;
        for result in reader.deserialize::<OverlayRow>() {
            let row = result.map_err(|e| MassTableError::Csv {
                path: path_str.clone(),
                source: e,
            })?;
            if row.a == 0 || row.z > row.a {
                return Err(MassTableError::InvalidEntry {
                    path: path_str,
                    z: row.z,
                    a: row.a,
                    reason: "requires A >= 1 and Z <= A",
                });
            }
            if !row.mass_excess_kev.is_finite() {
                return Err(MassTableError::InvalidEntry {
                    path: path_str,
                    z: row.z,
                    a: row.a,
                    reason: "mass excess is not a finite number",
                });
            }
            if self
                .overlay
                .insert((row.z, row.a), row.mass_excess_kev)
                .is_some()
            {
                warn!(z = row.z, a = row.a, "Duplicate mass overlay entry, last one wins");
            }
            count += 1;
        }
        debug!(path = %path_str, entries = count, "Loaded mass overlay");
        Ok(count)
    }

    pub fn overlay_len(&self) -> usize {
        self.overlay.len()
    }

    /// Atomic mass excess in MeV.
    pub fn mass_excess(&self, z: u32, a: u32) -> Result<f64, UnknownNuclide> {
        self.overlay
            .get(&(z, a))
            .or_else(|| MASS_EXCESS_KEV.get(&key(z, a)))
            .map(|kev| kev * 1e-3)
            .ok_or(UnknownNuclide { z, a })
    }

    /// Atomic rest mass in MeV/c².
    pub fn mass(&self, z: u32, a: u32) -> Result<f64, UnknownNuclide> {
        Ok(f64::from(a) * AMU_MEV + self.mass_excess(z, a)?)
    }

    pub fn contains(&self, z: u32, a: u32) -> bool {
        self.mass_excess(z, a).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    #[test]
    fn carbon_12_defines_zero_mass_excess() {
        assert!(f64_approx_equal(BUILTIN.mass_excess(6, 12).unwrap(), 0.0));
        assert!(f64_approx_equal(BUILTIN.mass(6, 12).unwrap(), 12.0 * AMU_MEV));
    }

    #[test]
    fn mass_excess_is_returned_in_mev() {
        let proton = BUILTIN.mass_excess(1, 1).unwrap();
        assert!(f64_approx_equal(proton, 7.288971));
    }

    #[test]
    fn silicon_28_pickup_q_value_matches_mass_balance() {
        let q = BUILTIN.mass_excess(1, 1).unwrap() + BUILTIN.mass_excess(14, 28).unwrap()
            - BUILTIN.mass_excess(1, 2).unwrap()
            - BUILTIN.mass_excess(14, 27).unwrap();
        assert!((q - -14.955).abs() < 1e-3, "q = {q}");
    }

    #[test]
    fn every_tabulated_element_has_at_least_one_nuclide() {
        for z in 1..=92 {
            assert!((z..=3 * z + 20).any(|a| BUILTIN.contains(z, a)), "Z={z}");
        }
    }

    #[test]
    fn heavy_targets_have_tabulated_masses() {
        let lead = BUILTIN.mass_excess(82, 208).unwrap();
        assert!((lead - -21.7486).abs() < 2e-3, "208Pb = {lead}");
        let tin = BUILTIN.mass_excess(50, 120).unwrap();
        assert!((tin - -91.0984).abs() < 2e-3, "120Sn = {tin}");
        let yttrium = BUILTIN.mass_excess(39, 89).unwrap();
        assert!((yttrium - -87.7084).abs() < 2e-3, "89Y = {yttrium}");
        let uranium = BUILTIN.mass_excess(92, 238).unwrap();
        assert!((uranium - 47.3097).abs() < 2e-3, "238U = {uranium}");
    }

    #[test]
    fn lead_208_neutron_separation_energy_matches_the_shell_gap() {
        let s_n = BUILTIN.mass_excess(82, 207).unwrap() + BUILTIN.mass_excess(0, 1).unwrap()
            - BUILTIN.mass_excess(82, 208).unwrap();
        assert!((s_n - 7.368).abs() < 0.01, "S_n = {s_n}");
    }

    #[test]
    fn unknown_nuclide_is_reported_with_its_identity() {
        let result = BUILTIN.mass_excess(14, 50);
        assert_eq!(result, Err(UnknownNuclide { z: 14, a: 50 }));
    }

    #[test]
    fn overlay_entries_take_precedence_and_extend_the_table() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("masses.csv");
        fs::write(
            &path,
            "z,a,mass_excess_kev\n14,28,-21000.0\n50,100,-57280.0\n",
        )
        .unwrap();

        let table = MassTable::with_overlay_csv(&path).unwrap();
        assert_eq!(table.overlay_len(), 2);
        assert!(f64_approx_equal(table.mass_excess(14, 28).unwrap(), -21.0));
        assert!(f64_approx_equal(table.mass_excess(50, 100).unwrap(), -57.28));
        assert!(!BUILTIN.contains(50, 100));
        assert!(table.contains(1, 1));
    }

    #[test]
    fn overlay_rejects_impossible_nuclides() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "z,a,mass_excess_kev\n5,3,100.0\n").unwrap();
        let result = MassTable::with_overlay_csv(&path);
        assert!(matches!(result, Err(MassTableError::InvalidEntry { .. })));
    }

    #[test]
    fn overlay_fails_for_malformed_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("malformed.csv");
        fs::write(&path, "z,a,mass_excess_kev\n1,one,7288.971\n").unwrap();
        let result = MassTable::with_overlay_csv(&path);
        assert!(matches!(result, Err(MassTableError::Csv { .. })));
    }

    #[test]
    fn overlay_fails_for_missing_file() {
        let result = MassTable::with_overlay_csv(Path::new("/nonexistent/masses.csv"));
        assert!(matches!(result, Err(MassTableError::Csv { .. })));
    }
}
