//! Band-algebra formulas per satellite.
//!
//! Each derived band is produced either by a normalized difference of
//! two bands or by an arithmetic expression over named band and
//! constant bindings, optionally followed by a cube root. The tables
//! wire generic formula roles (NIR, RED, ...) to each satellite's
//! physical bands.

use std::collections::HashMap;

use imagery_common::{BandName, ExportError, ExportResult, ProductId, SatelliteId};
use registry::ProductRegistry;

/// How one derived band is computed from raw bands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BandFormula {
    /// `(first - second) / (first + second)`.
    NormalizedDifference {
        first: &'static str,
        second: &'static str,
    },
    /// Arbitrary expression over named bindings.
    Expression {
        expr: &'static str,
        bands: &'static [(&'static str, &'static str)],
        constants: &'static [(&'static str, f64)],
        cube_root: bool,
    },
}

/// Soil brightness correction factor used by SAVI.
const SBCF: f64 = 0.428;

const S2_FORMULAS: &[(&str, BandFormula)] = &[
    (
        "NDVI",
        BandFormula::NormalizedDifference {
            first: "B8",
            second: "B4",
        },
    ),
    (
        "SAVI",
        BandFormula::Expression {
            expr: "((NIR-RED)/(NIR+RED+SBCF))*(1+SBCF)",
            bands: &[("NIR", "B8"), ("RED", "B4")],
            constants: &[("SBCF", SBCF)],
            cube_root: false,
        },
    ),
    (
        "AVI",
        BandFormula::Expression {
            expr: "(NIR*(1-RED)*(NIR-RED))",
            bands: &[("NIR", "B8"), ("RED", "B4")],
            constants: &[],
            cube_root: true,
        },
    ),
    (
        "EVI",
        BandFormula::Expression {
            expr: "(2.5*(NIR-RED))/(NIR+(6*RED)-(7.5*BLUE)+1)",
            bands: &[("NIR", "B8"), ("RED", "B4"), ("BLUE", "B2")],
            constants: &[],
            cube_root: false,
        },
    ),
    (
        "ARVI",
        BandFormula::Expression {
            expr: "(NIR-RED-(0.106*(RED-BLUE)))/(NIR+RED-(0.106*(RED-BLUE)))",
            bands: &[("NIR", "B8"), ("RED", "B4"), ("BLUE", "B2")],
            constants: &[],
            cube_root: false,
        },
    ),
    (
        "GNDVI",
        BandFormula::NormalizedDifference {
            first: "B8",
            second: "B3",
        },
    ),
    (
        "NDCI",
        BandFormula::NormalizedDifference {
            first: "B5",
            second: "B4",
        },
    ),
    (
        "NPCRI",
        BandFormula::NormalizedDifference {
            first: "B4",
            second: "B2",
        },
    ),
    (
        "PSRI",
        BandFormula::Expression {
            expr: "(RED-BLUE)/REDGE",
            bands: &[("RED", "B4"), ("BLUE", "B2"), ("REDGE", "B6")],
            constants: &[],
            cube_root: false,
        },
    ),
    (
        "BSI",
        BandFormula::Expression {
            expr: "((SWIR+RED)-(NIR+BLUE))/((SWIR+RED)+(NIR+BLUE))",
            bands: &[
                ("RED", "B4"),
                ("BLUE", "B2"),
                ("NIR", "B8"),
                ("SWIR", "B11"),
            ],
            constants: &[],
            cube_root: false,
        },
    ),
    (
        "NDWI",
        BandFormula::NormalizedDifference {
            first: "B8",
            second: "B3",
        },
    ),
    (
        "NDMI",
        BandFormula::NormalizedDifference {
            first: "B8",
            second: "B11",
        },
    ),
    (
        "NDGI",
        BandFormula::NormalizedDifference {
            first: "B3",
            second: "B4",
        },
    ),
    (
        "NDSI",
        BandFormula::NormalizedDifference {
            first: "B3",
            second: "B11",
        },
    ),
    (
        "NBRI",
        BandFormula::NormalizedDifference {
            first: "B8",
            second: "B12",
        },
    ),
    (
        "SI",
        BandFormula::Expression {
            expr: "(1-RED)*(1-BLUE)*(1-GREEN)",
            bands: &[("RED", "B4"), ("GREEN", "B3"), ("BLUE", "B2")],
            constants: &[],
            cube_root: true,
        },
    ),
    (
        "MCARI",
        BandFormula::Expression {
            expr: "((REDGE-RED)-(0.2*(REDGE-GREEN)))*(REDGE/RED)",
            bands: &[("REDGE", "B5"), ("RED", "B4"), ("GREEN", "B3")],
            constants: &[],
            cube_root: false,
        },
    ),
];

const L8_FORMULAS: &[(&str, BandFormula)] = &[
    (
        "NDVI",
        BandFormula::NormalizedDifference {
            first: "B5",
            second: "B4",
        },
    ),
    (
        "SAVI",
        BandFormula::Expression {
            expr: "((NIR-RED)/(NIR+RED+SBCF))*(1+SBCF)",
            bands: &[("NIR", "B5"), ("RED", "B4")],
            constants: &[("SBCF", SBCF)],
            cube_root: false,
        },
    ),
    (
        "AVI",
        BandFormula::Expression {
            expr: "(NIR*(1-RED)*(NIR-RED))",
            bands: &[("NIR", "B5"), ("RED", "B4")],
            constants: &[],
            cube_root: true,
        },
    ),
    (
        "EVI",
        BandFormula::Expression {
            expr: "(2.5*(NIR-RED))/(NIR+(6*RED)-(7.5*BLUE)+1)",
            bands: &[("NIR", "B5"), ("RED", "B4"), ("BLUE", "B2")],
            constants: &[],
            cube_root: false,
        },
    ),
    (
        "ARVI",
        BandFormula::Expression {
            expr: "(NIR-RED-(0.106*(RED-BLUE)))/(NIR+RED-(0.106*(RED-BLUE)))",
            bands: &[("NIR", "B5"), ("RED", "B4"), ("BLUE", "B2")],
            constants: &[],
            cube_root: false,
        },
    ),
    (
        "GNDVI",
        BandFormula::NormalizedDifference {
            first: "B5",
            second: "B3",
        },
    ),
    (
        "NPCRI",
        BandFormula::NormalizedDifference {
            first: "B4",
            second: "B2",
        },
    ),
    (
        "BSI",
        BandFormula::Expression {
            expr: "((SWIR+RED)-(NIR+BLUE))/((SWIR+RED)+(NIR+BLUE))",
            bands: &[
                ("RED", "B4"),
                ("BLUE", "B2"),
                ("NIR", "B5"),
                ("SWIR", "B6"),
            ],
            constants: &[],
            cube_root: false,
        },
    ),
    (
        "NDWI",
        BandFormula::NormalizedDifference {
            first: "B5",
            second: "B3",
        },
    ),
    (
        "NDMI",
        BandFormula::NormalizedDifference {
            first: "B5",
            second: "B6",
        },
    ),
    (
        "NDGI",
        BandFormula::NormalizedDifference {
            first: "B3",
            second: "B4",
        },
    ),
    (
        "NDSI",
        BandFormula::NormalizedDifference {
            first: "B3",
            second: "B6",
        },
    ),
    (
        "NBRI",
        BandFormula::NormalizedDifference {
            first: "B5",
            second: "B7",
        },
    ),
    (
        "SI",
        BandFormula::Expression {
            expr: "(1-RED)*(1-BLUE)*(1-GREEN)",
            bands: &[("RED", "B4"), ("GREEN", "B3"), ("BLUE", "B2")],
            constants: &[],
            cube_root: true,
        },
    ),
];

/// Dispatch table from (satellite, derived band) to its formula.
#[derive(Debug, Clone)]
pub struct FormulaTable {
    entries: HashMap<(SatelliteId, BandName), BandFormula>,
}

impl FormulaTable {
    /// The builtin table covering Sentinel-2 and Landsat-8.
    pub fn builtin() -> Self {
        let mut entries = HashMap::new();
        for (band, formula) in S2_FORMULAS {
            entries.insert((SatelliteId::new("S2"), BandName::new(*band)), *formula);
        }
        for (band, formula) in L8_FORMULAS {
            entries.insert((SatelliteId::new("L8"), BandName::new(*band)), *formula);
        }
        Self { entries }
    }

    pub fn lookup(&self, satellite: &SatelliteId, band: &BandName) -> Option<&BandFormula> {
        self.entries.get(&(satellite.clone(), band.clone()))
    }

    /// Verify that every derivable band of every registered product has
    /// a formula for its satellite. Run at startup so an incomplete
    /// table fails construction, not the first request.
    pub fn validate_against(&self, registry: &ProductRegistry) -> ExportResult<()> {
        for sensor in registry.sensors() {
            let satellite = registry.satellite_for(&sensor)?;
            let products = registry.products_for(&sensor)?;
            let base = products
                .get(&ProductId::base())
                .cloned()
                .unwrap_or_default();

            for (product, bands) in products {
                if product.is_base() {
                    continue;
                }
                for band in bands {
                    if !base.contains(band) && self.lookup(&satellite, band).is_none() {
                        return Err(ExportError::Config(format!(
                            "product {} for sensor {} needs band {} but satellite {} has no formula for it",
                            product, sensor, band, satellite
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

impl Default for FormulaTable {
    fn default() -> Self {
        Self::builtin()
    }
}
