//! Parameter metadata for strategies
//!
//! Every builtin strategy exposes its constants (lookback windows, tolerance
//! thresholds, percentage bounds) as named parameters with documented
//! defaults. This enables:
//! - Construction from config files
//! - Parameter documentation
//! - Range validation of overrides
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use setupscan::params::ParameterizedStrategy;
//! use setupscan::prelude::*;
//!
//! for param in TurtleBreakout::param_meta() {
//!     println!("{}: {:?} (default: {})", param.name, param.param_type, param.default);
//! }
//!
//! let mut params = HashMap::new();
//! params.insert("lookback", 60.0);
//! let turtle = TurtleBreakout::with_params(&params).unwrap();
//! assert_eq!(turtle.lookback, 60);
//! ```

use std::collections::HashMap;

use crate::{Result, ScanError};

// ============================================================
// PARAMETER TYPES
// ============================================================

/// Type of parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
  /// Bar count (positive integer)
  Period,
  /// Percentage, 1.0 means one percent
  Percent,
  /// Multiplier or fraction
  Ratio,
  /// Absolute price offset
  Price,
}

/// Metadata for a single strategy parameter
#[derive(Debug, Clone)]
pub struct ParamMeta {
  /// Parameter name (e.g., "lookback")
  pub name: &'static str,
  pub param_type: ParamType,
  pub default: f64,
  /// Accepted range: (min, max), inclusive
  pub range: (f64, f64),
  pub description: &'static str,
}

impl ParamMeta {
  pub const fn period(
    name: &'static str,
    default: f64,
    range: (f64, f64),
    description: &'static str,
  ) -> Self {
    Self { name, param_type: ParamType::Period, default, range, description }
  }

  pub const fn percent(
    name: &'static str,
    default: f64,
    range: (f64, f64),
    description: &'static str,
  ) -> Self {
    Self { name, param_type: ParamType::Percent, default, range, description }
  }

  pub const fn ratio(
    name: &'static str,
    default: f64,
    range: (f64, f64),
    description: &'static str,
  ) -> Self {
    Self { name, param_type: ParamType::Ratio, default, range, description }
  }

  pub const fn price(
    name: &'static str,
    default: f64,
    range: (f64, f64),
    description: &'static str,
  ) -> Self {
    Self { name, param_type: ParamType::Price, default, range, description }
  }

  /// Validate a value for this parameter
  pub fn validate(&self, value: f64) -> Result<()> {
    if !value.is_finite() {
      return Err(ScanError::InvalidValue("parameter cannot be NaN or infinite"));
    }
    let (min, max) = self.range;
    if value < min || value > max {
      return Err(ScanError::OutOfRange { field: self.name, value, min, max });
    }
    if self.param_type == ParamType::Period && (value < 1.0 || value.fract() != 0.0) {
      return Err(ScanError::InvalidValue("Period must be a positive integer"));
    }
    Ok(())
  }
}

// ============================================================
// PARAMETERIZED STRATEGY TRAIT
// ============================================================

/// Trait for strategies that can be built from named parameters
pub trait ParameterizedStrategy: Sized {
  /// Registry key of the strategy
  const KEY: &'static str;

  /// Returns metadata for all configurable parameters
  fn param_meta() -> &'static [ParamMeta];

  /// Creates a strategy with parameters from a HashMap
  ///
  /// Missing parameters use their default values; unknown names are rejected.
  fn with_params(params: &HashMap<&str, f64>) -> Result<Self>;
}

// ============================================================
// PARAMETER VALUE HELPERS
// ============================================================

fn find<'a>(metas: &'a [ParamMeta], key: &str) -> Result<&'a ParamMeta> {
  metas
    .iter()
    .find(|m| m.name == key)
    .ok_or_else(|| ScanError::InvalidConfig(format!("unknown parameter '{key}'")))
}

/// Reject parameter names a strategy does not declare
pub fn ensure_known(params: &HashMap<&str, f64>, metas: &[ParamMeta]) -> Result<()> {
  for key in params.keys() {
    find(metas, key)?;
  }
  Ok(())
}

/// Get a validated value from params with the declared default as fallback
pub fn get_value(params: &HashMap<&str, f64>, metas: &[ParamMeta], key: &str) -> Result<f64> {
  let meta = find(metas, key)?;
  let value = params.get(key).copied().unwrap_or(meta.default);
  meta.validate(value)?;
  Ok(value)
}

/// Get a validated period from params with the declared default as fallback
pub fn get_period(params: &HashMap<&str, f64>, metas: &[ParamMeta], key: &str) -> Result<usize> {
  get_value(params, metas, key).map(|v| v as usize)
}

/// Check current field values against the declared ranges
pub fn validate_all(metas: &[ParamMeta], values: &[(&str, f64)]) -> Result<()> {
  for (key, value) in values {
    find(metas, key)?.validate(*value)?;
  }
  Ok(())
}

// ============================================================
// TESTS
// ============================================================
