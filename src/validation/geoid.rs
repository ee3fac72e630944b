//! GEOID format check (§4.6): first two characters must equal the expected
//! state FIPS; minimum length per layer.

/// A GEOID format defect.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeoidError {
    /// GEOID's state-FIPS prefix doesn't match the expected state.
    #[error("GEOID {geoid} does not start with expected state FIPS {expected_state}")]
    StatePrefixMismatch {
        /// The offending GEOID.
        geoid: String,
        /// The state FIPS that was expected.
        expected_state: String,
    },
    /// GEOID is shorter than the layer's minimum length.
    #[error("GEOID {geoid} is shorter than minimum length {min_length} for this layer")]
    TooShort {
        /// The offending GEOID.
        geoid: String,
        /// The layer's minimum length.
        min_length: usize,
    },
}

/// Validate a GEOID against the expected state FIPS and a layer-specific
/// minimum length.
pub fn check_geoid(geoid: &str, expected_state_fips: &str, min_length: usize) -> Result<(), GeoidError> {
    if geoid.len() < min_length {
        return Err(GeoidError::TooShort {
            geoid: geoid.to_string(),
            min_length,
        });
    }
    if geoid.get(0..2) != Some(expected_state_fips) {
        return Err(GeoidError::StatePrefixMismatch {
            geoid: geoid.to_string(),
            expected_state: expected_state_fips.to_string(),
        });
    }
    Ok(())
}
