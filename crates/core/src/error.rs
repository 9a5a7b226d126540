//! Construction-time configuration errors.
//!
//! Every component validates its configuration when it is built. Once a
//! component exists, the simulation never fails: numerical degeneracies are
//! absorbed in-line (clamped or zeroed) rather than reported.

/// Reasons a configuration is rejected at setup.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A grid axis resolves to fewer cells than the interior stencils need.
    GridTooSmall {
        /// Axis name (`"wide"` or `"tall"`)
        axis: &'static str,
        /// Number of cells the configuration produced
        cells: usize,
        /// Minimum accepted cell count
        min: usize,
    },
    /// The grid holds more cells than can be allocated and indexed.
    GridTooLarge {
        /// Cell count, or `None` when it overflows `usize`
        cells: Option<usize>,
        /// Largest accepted cell count
        max: usize,
    },
    /// A size, period or speed that must be strictly positive was not.
    NonPositive {
        /// Parameter name
        name: &'static str,
        /// Offending value
        value: f32,
    },
    /// A parameter exceeded its upper bound.
    TooLarge {
        /// Parameter name
        name: &'static str,
        /// Offending value
        value: f32,
        /// Largest accepted value
        max: f32,
    },
    /// A coefficient that must be zero or positive was negative.
    Negative {
        /// Parameter name
        name: &'static str,
        /// Offending value
        value: f32,
    },
    /// A parameter was NaN or infinite.
    NotFinite {
        /// Parameter name
        name: &'static str,
    },
    /// Falloff curve data is missing or malformed.
    InvalidCurve(String),
    /// A `[min, max]` range was inverted.
    InvalidRange {
        /// Parameter name
        name: &'static str,
        /// Lower bound
        min: f32,
        /// Upper bound
        max: f32,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::GridTooSmall { axis, cells, min } => write!(
                f,
                "Grid axis '{axis}' has {cells} cells, at least {min} required"
            ),
            ConfigError::GridTooLarge { cells: Some(cells), max } => {
                write!(f, "Grid has {cells} cells, at most {max} allowed")
            }
            ConfigError::GridTooLarge { cells: None, max } => {
                write!(f, "Grid cell count overflows, at most {max} allowed")
            }
            ConfigError::NonPositive { name, value } => {
                write!(f, "Parameter '{name}' must be positive, got {value}")
            }
            ConfigError::TooLarge { name, value, max } => {
                write!(f, "Parameter '{name}' must be at most {max}, got {value}")
            }
            ConfigError::Negative { name, value } => {
                write!(f, "Parameter '{name}' must not be negative, got {value}")
            }
            ConfigError::NotFinite { name } => write!(f, "Parameter '{name}' must be finite"),
            ConfigError::InvalidCurve(msg) => write!(f, "Invalid falloff curve: {msg}"),
            ConfigError::InvalidRange { name, min, max } => {
                write!(f, "Range '{name}' is inverted: [{min}, {max}]")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Require `value` to be finite and strictly positive.
pub(crate) fn require_positive(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::NotFinite { name });
    }
    if value <= 0.0 {
        return Err(ConfigError::NonPositive { name, value });
    }
    Ok(())
}

/// Require `value` to be finite and zero or positive.
pub(crate) fn require_non_negative(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::NotFinite { name });
    }
    if value < 0.0 {
        return Err(ConfigError::Negative { name, value });
    }
    Ok(())
}

/// Require `value` to be finite, sign unrestricted.
pub(crate) fn require_finite(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotFinite { name })
    }
}

/// Require `[min, max]` to be finite and ordered.
pub(crate) fn require_range(name: &'static str, min: f32, max: f32) -> Result<(), ConfigError> {
    require_finite(name, min)?;
    require_finite(name, max)?;
    if min > max {
        return Err(ConfigError::InvalidRange { name, min, max });
    }
    Ok(())
}
