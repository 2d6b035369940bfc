//! Field-generation error types.
//!
//! Everything in the asteroid field is generated once at startup from
//! [`FieldConfig`](crate::config::FieldConfig).  Errors here are configuration
//! errors: they are reported once and abort startup rather than being retried.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use crate::error::FieldResult;
//!
//! fn startup(config: &FieldConfig) -> FieldResult<AsteroidField> {
//!     config.validate()?;
//!     AsteroidField::generate(config)
//! }
//! ```

use std::fmt;

/// Top-level error enum for asteroid field generation.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldError {
    /// A sphere LOD has more vertices than a 16-bit index can address.
    IndexOverflow {
        /// LOD level that overflowed.
        lod: usize,
        /// Vertex count of that level.
        vertex_count: usize,
    },

    /// A tuning value is outside its safe operating range.
    UnsafeConstant {
        /// Name of the config field (for logging).
        name: &'static str,
        /// The value that was rejected.
        value: f32,
        /// Human-readable description of the safe range.
        safe_range: &'static str,
    },

    /// The box does not split into a whole number of hash cells, so the
    /// toroidal grid would not line up with the wrapped world.
    GridMismatch {
        /// Configured box size.
        box_size: f32,
        /// Configured cell size.
        cell_size: f32,
    },

    /// The variant catalog is empty; nothing can be placed.
    EmptyCatalog,

    /// A hand-built instance names a variant the catalog does not have.
    UnknownVariant {
        /// Requested variant index.
        variant: usize,
        /// Number of variants in the catalog.
        catalog_len: usize,
    },
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldError::IndexOverflow { lod, vertex_count } => write!(
                f,
                "sphere LOD {} has {} vertices, more than 16-bit indices can address",
                lod, vertex_count
            ),
            FieldError::UnsafeConstant {
                name,
                value,
                safe_range,
            } => write!(
                f,
                "config value '{}' = {} is outside safe range {}",
                name, value, safe_range
            ),
            FieldError::GridMismatch {
                box_size,
                cell_size,
            } => write!(
                f,
                "box size {} is not a whole multiple of grid cell size {}",
                box_size, cell_size
            ),
            FieldError::EmptyCatalog => write!(f, "asteroid catalog has no variants"),
            FieldError::UnknownVariant {
                variant,
                catalog_len,
            } => write!(
                f,
                "instance uses variant {} but the catalog has {} variants",
                variant, catalog_len
            ),
        }
    }
}

impl std::error::Error for FieldError {}

/// Convenience alias: a `Result` using `FieldError` as the error type.
pub type FieldResult<T> = Result<T, FieldError>;

// ── Validation helpers ────────────────────────────────────────────────────────

/// Returns an error if `value` is not strictly positive.
pub fn validate_positive(name: &'static str, value: f32) -> FieldResult<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(FieldError::UnsafeConstant {
            name,
            value,
            safe_range: "(0.0, ∞)",
        })
    }
}

/// Returns an error unless `min <= max`; reports the offending `max`.
pub fn validate_band(name: &'static str, min: f32, max: f32) -> FieldResult<()> {
    if min <= max {
        Ok(())
    } else {
        Err(FieldError::UnsafeConstant {
            name,
            value: max,
            safe_range: "[min, ∞)",
        })
    }
}

/// Returns an error if `box_size / cell_size` is not a whole number.
pub fn validate_grid(box_size: f32, cell_size: f32) -> FieldResult<()> {
    let cells = box_size / cell_size;
    if cells >= 1.0 && (cells - cells.round()).abs() < 1e-4 {
        Ok(())
    } else {
        Err(FieldError::GridMismatch {
            box_size,
            cell_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_accepts_whole_multiples() {
        assert!(validate_grid(4000.0, 50.0).is_ok());
        assert!(validate_grid(4000.0, 4000.0).is_ok());
    }

    #[test]
    fn grid_rejects_fractional_multiples() {
        assert_eq!(
            validate_grid(4000.0, 30.0),
            Err(FieldError::GridMismatch {
                box_size: 4000.0,
                cell_size: 30.0
            })
        );
        assert!(validate_grid(40.0, 50.0).is_err());
    }

    #[test]
    fn positive_rejects_zero_and_nan() {
        assert!(validate_positive("x", 0.0).is_err());
        assert!(validate_positive("x", f32::NAN).is_err());
        assert!(validate_positive("x", 1.0).is_ok());
    }

    #[test]
    fn display_names_the_field() {
        let err = validate_band("spacing_max", 10.0, 5.0).unwrap_err();
        assert!(err.to_string().contains("spacing_max"));
    }
}
