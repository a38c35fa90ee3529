//! Index parameters and their text serialization.
//!
//! The parameter record mirrors the classic `R\n<value>\n...` line-oriented
//! format: one human-readable label line followed by one value line per
//! parameter, reals written with 9-digit decimal precision.

use crate::distance_measures::DistanceMeasure;
use crate::error::{LshError, Result};
use crate::hashes::TableKind;
use crate::types::Real;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};

/// Parameters of an R-near-neighbor index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LshParams {
    /// Query radius `R`.
    pub r: Real,

    /// Squared radius `R²`, kept alongside `R` as in the text format.
    pub r2: Real,

    /// Lower bound on the per-point recall probability.
    pub success_probability: Real,

    /// Point dimensionality `d`.
    pub dimension: usize,

    /// Whether g-functions are pairs of u-functions.
    pub use_u_functions: bool,

    /// Number of scalar LSH functions per g-function.
    pub k: usize,

    /// Number of independent u-tuples (meaningful when `use_u_functions`).
    pub m: usize,

    /// Number of hash tables `L`.
    pub l: usize,

    /// Projection bucket width `W`.
    pub w: Real,

    /// Parameter `T`, the repetition count used by parameter-tuning tools.
    pub t: usize,

    /// Bucket storage layout.
    pub table_kind: TableKind,

    /// Distance mode; selects the p-stable family and the filter.
    /// Not part of the fixed text format.
    #[serde(default)]
    pub distance: DistanceMeasure,

    /// Random seed for the hash family and bucket-hash coefficients.
    /// `None` seeds from the operating system. Not part of the fixed text
    /// format.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl LshParams {
    /// Create parameters for dimension `d` and radius `r` with conventional
    /// defaults for the remaining knobs.
    pub fn new(dimension: usize, r: Real) -> Self {
        Self {
            r,
            r2: r * r,
            success_probability: 0.9,
            dimension,
            use_u_functions: false,
            k: 16,
            m: 0,
            l: 10,
            w: 4.0,
            t: 1,
            table_kind: TableKind::HybridChain,
            distance: DistanceMeasure::L2,
            seed: None,
        }
    }

    /// Set the radius (and the derived `R²`).
    pub fn with_radius(mut self, r: Real) -> Self {
        self.r = r;
        self.r2 = r * r;
        self
    }

    /// Set the success probability.
    pub fn with_success_probability(mut self, p: Real) -> Self {
        self.success_probability = p;
        self
    }

    /// Set `k`, the compound hash width.
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    /// Enable u-function amplification with `m` independent u-tuples.
    pub fn with_u_functions(mut self, m: usize) -> Self {
        self.use_u_functions = true;
        self.m = m;
        self
    }

    /// Set the number of tables `L`.
    pub fn with_tables(mut self, l: usize) -> Self {
        self.l = l;
        self
    }

    /// Set the projection bucket width `W`.
    pub fn with_width(mut self, w: Real) -> Self {
        self.w = w;
        self
    }

    /// Set the storage layout.
    pub fn with_table_kind(mut self, kind: TableKind) -> Self {
        self.table_kind = kind;
        self
    }

    /// Set the distance mode.
    pub fn with_distance(mut self, distance: DistanceMeasure) -> Self {
        self.distance = distance;
        self
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Number of independent hash-function tuples the family holds:
    /// `m` when u-functions are used, `L` otherwise.
    pub fn n_hf_tuples(&self) -> usize {
        if self.use_u_functions {
            self.m
        } else {
            self.l
        }
    }

    /// Length of each hash-function tuple: `k/2` when u-functions are used,
    /// `k` otherwise.
    pub fn hf_tuple_len(&self) -> usize {
        if self.use_u_functions {
            self.k / 2
        } else {
            self.k
        }
    }

    /// Validate cross-field invariants.
    pub fn validate(&self) -> Result<()> {
        if self.dimension == 0 {
            return Err(LshError::invalid_parameter("dimension must be positive"));
        }
        if self.k == 0 {
            return Err(LshError::invalid_parameter("k must be positive"));
        }
        if self.l == 0 {
            return Err(LshError::invalid_parameter("L must be positive"));
        }
        if self.w <= 0.0 {
            return Err(LshError::invalid_parameter("W must be positive"));
        }
        if self.r < 0.0 {
            return Err(LshError::invalid_parameter("R must be non-negative"));
        }
        if !(0.0..=1.0).contains(&self.success_probability) {
            return Err(LshError::invalid_parameter(
                "success probability must lie in [0, 1]",
            ));
        }
        if self.use_u_functions {
            if self.k % 2 != 0 {
                return Err(LshError::invalid_parameter(
                    "k must be even when u-functions are used",
                ));
            }
            if self.m < 2 {
                return Err(LshError::invalid_parameter(
                    "m must be at least 2 when u-functions are used",
                ));
            }
            let max_l = self.m * (self.m - 1) / 2;
            if self.l > max_l {
                return Err(LshError::invalid_parameter(format!(
                    "L = {} exceeds m(m-1)/2 = {} distinct u-function pairs",
                    self.l, max_l
                )));
            }
        }
        Ok(())
    }

    /// Write the parameter record in the line-oriented text format.
    pub fn write_to(&self, output: &mut impl Write) -> std::io::Result<()> {
        writeln!(output, "R")?;
        writeln!(output, "{:.9}", self.r)?;
        writeln!(output, "Success probability")?;
        writeln!(output, "{:.9}", self.success_probability)?;
        writeln!(output, "Dimension")?;
        writeln!(output, "{}", self.dimension)?;
        writeln!(output, "R^2")?;
        writeln!(output, "{:.9}", self.r2)?;
        writeln!(output, "Use <u> functions")?;
        writeln!(output, "{}", if self.use_u_functions { 1 } else { 0 })?;
        writeln!(output, "k")?;
        writeln!(output, "{}", self.k)?;
        writeln!(output, "m [# independent tuples of LSH functions]")?;
        writeln!(output, "{}", self.m)?;
        writeln!(output, "L")?;
        writeln!(output, "{}", self.l)?;
        writeln!(output, "W")?;
        writeln!(output, "{:.9}", self.w)?;
        writeln!(output, "T")?;
        writeln!(output, "{}", self.t)?;
        writeln!(output, "typeHT")?;
        writeln!(output, "{}", self.table_kind.code())?;
        Ok(())
    }

    /// Read a parameter record from the line-oriented text format.
    ///
    /// Label lines are skipped; only the value lines are parsed.
    pub fn read_from(input: &mut impl BufRead) -> Result<Self> {
        let mut lines = input.lines();
        let mut next_value = |label: &str| -> Result<String> {
            // Skip the label line, take the value line.
            let _ = lines.next().transpose().map_err(|e| {
                LshError::invalid_parameter(format!("reading label for {}: {}", label, e))
            })?;
            lines
                .next()
                .transpose()
                .map_err(|e| {
                    LshError::invalid_parameter(format!("reading value for {}: {}", label, e))
                })?
                .ok_or_else(|| {
                    LshError::invalid_parameter(format!("missing value for {}", label))
                })
        };

        let parse_real = |label: &str, s: String| -> Result<Real> {
            s.trim().parse().map_err(|_| {
                LshError::invalid_parameter(format!("bad real for {}: {:?}", label, s))
            })
        };
        let parse_int = |label: &str, s: String| -> Result<usize> {
            s.trim().parse().map_err(|_| {
                LshError::invalid_parameter(format!("bad integer for {}: {:?}", label, s))
            })
        };

        let r = parse_real("R", next_value("R")?)?;
        let success_probability =
            parse_real("success probability", next_value("success probability")?)?;
        let dimension = parse_int("dimension", next_value("dimension")?)?;
        let r2 = parse_real("R^2", next_value("R^2")?)?;
        let use_u_functions = parse_int("use <u> functions", next_value("use <u> functions")?)? != 0;
        let k = parse_int("k", next_value("k")?)?;
        let m = parse_int("m", next_value("m")?)?;
        let l = parse_int("L", next_value("L")?)?;
        let w = parse_real("W", next_value("W")?)?;
        let t = parse_int("T", next_value("T")?)?;
        let type_ht = parse_int("typeHT", next_value("typeHT")?)?;

        Ok(Self {
            r,
            r2,
            success_probability,
            dimension,
            use_u_functions,
            k,
            m,
            l,
            w,
            t,
            table_kind: TableKind::from_code(type_ht as u32)?,
            distance: DistanceMeasure::default(),
            seed: None,
        })
    }
}
