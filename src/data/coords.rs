use crate::error::{Error, Result};

pub const DEFAULT_GRANULARITY: i32 = 100;
pub const DEFAULT_DATE_GRANULARITY: i32 = 1000;

const NANO: f64 = 1e9;

/// Coordinate grid of a block.
///
/// Latitude and longitude are stored as integer multiples of `granularity`
/// nanodegrees, shifted by the per-axis offset (also in nanodegrees).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Offset {
    pub lat: i64,
    pub lon: i64,
    pub granularity: i32,
}

impl Default for Offset {
    #[inline]
    fn default() -> Self {
        Self {
            lat: 0,
            lon: 0,
            granularity: DEFAULT_GRANULARITY,
        }
    }
}

impl Offset {
    #[inline]
    pub fn with_granularity(granularity: i32) -> Self {
        Self {
            granularity,
            ..Self::default()
        }
    }

    #[inline]
    pub fn lat_to_units(&self, degrees: f64) -> Result<i64> {
        to_units(degrees, self.lat, self.granularity)
    }

    #[inline]
    pub fn lon_to_units(&self, degrees: f64) -> Result<i64> {
        to_units(degrees, self.lon, self.granularity)
    }

    #[inline]
    pub fn lat_to_degrees(&self, units: i64) -> Result<f64> {
        Ok(to_nano(units, self.lat, self.granularity)? as f64 / NANO)
    }

    #[inline]
    pub fn lon_to_degrees(&self, units: i64) -> Result<f64> {
        Ok(to_nano(units, self.lon, self.granularity)? as f64 / NANO)
    }
}

fn to_units(degrees: f64, offset: i64, granularity: i32) -> Result<i64> {
    let g = f64::from(granularity);
    let units = (degrees / g * NANO - offset as f64 / g).round();
    // `i64::MAX as f64` rounds up to 2^63, which is already out of range
    if !units.is_finite() || units >= i64::MAX as f64 || units < i64::MIN as f64 {
        return Err(Error::CoordinateOutOfRange(degrees));
    }
    Ok(units as i64)
}

fn to_nano(units: i64, offset: i64, granularity: i32) -> Result<i64> {
    units
        .checked_mul(i64::from(granularity))
        .and_then(|v| v.checked_add(offset))
        .ok_or(Error::DeltaOverflow)
}

/// Accumulates a delta coded column back into absolute values.
#[derive(Copy, Clone, Debug, Default)]
pub struct DeltaDecoder(i64);

impl DeltaDecoder {
    #[inline]
    pub fn decode(&mut self, delta: i64) -> Result<i64> {
        self.0 = self.0.checked_add(delta).ok_or(Error::DeltaOverflow)?;
        Ok(self.0)
    }
}

/// Turns absolute values into the differences to their predecessor.
#[derive(Copy, Clone, Debug, Default)]
pub struct DeltaEncoder(i64);

impl DeltaEncoder {
    /// Difference of `value` to the previous value, without advancing.
    #[inline]
    pub fn delta(&self, value: i64) -> Result<i64> {
        value.checked_sub(self.0).ok_or(Error::DeltaOverflow)
    }

    #[inline]
    pub fn advance(&mut self, value: i64) {
        self.0 = value;
    }

    #[inline]
    pub fn encode(&mut self, value: i64) -> Result<i64> {
        let delta = self.delta(value)?;
        self.0 = value;
        Ok(delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn default_grid() {
        let offset = Offset::default();
        assert_eq!(offset.lat_to_units(10.0).unwrap(), 100_000_000);
        assert_eq!(offset.lat_to_units(10.0001).unwrap(), 100_001_000);
        assert_eq!(offset.lon_to_degrees(200_000_000).unwrap(), 20.0);
    }

    #[test]
    fn offsets_are_applied() {
        let offset = Offset {
            lat: 5_000,
            lon: -5_000,
            granularity: 100,
        };
        assert_eq!(offset.lat_to_degrees(0).unwrap(), 5e-6);
        assert_eq!(offset.lon_to_degrees(50).unwrap(), 0.0);
        assert_eq!(offset.lat_to_units(5e-6).unwrap(), 0);
    }

    #[test]
    fn unrepresentable_coordinates_fail() {
        let offset = Offset::with_granularity(1);
        assert!(matches!(
            offset.lat_to_units(f64::NAN),
            Err(Error::CoordinateOutOfRange(_))
        ));
        assert!(matches!(
            offset.lat_to_units(1e12),
            Err(Error::CoordinateOutOfRange(_))
        ));
        assert!(matches!(
            Offset::with_granularity(1000).lat_to_degrees(i64::MAX / 10),
            Err(Error::DeltaOverflow)
        ));
    }

    #[test]
    fn delta_columns() {
        let mut enc = DeltaEncoder::default();
        let deltas: Vec<i64> = [100, 150, 90]
            .into_iter()
            .map(|v| enc.encode(v).unwrap())
            .collect();
        assert_eq!(deltas, [100, 50, -60]);

        let mut dec = DeltaDecoder::default();
        let values: Vec<i64> = deltas.into_iter().map(|d| dec.decode(d).unwrap()).collect();
        assert_eq!(values, [100, 150, 90]);
    }

    #[test]
    fn delta_overflow_is_reported() {
        let mut dec = DeltaDecoder::default();
        dec.decode(i64::MAX).unwrap();
        assert!(matches!(dec.decode(1), Err(Error::DeltaOverflow)));

        let enc = DeltaEncoder::default();
        assert!(matches!(enc.delta(i64::MIN), Ok(i64::MIN)));
        let mut enc = DeltaEncoder::default();
        enc.advance(1);
        assert!(matches!(enc.delta(i64::MIN), Err(Error::DeltaOverflow)));
    }

    proptest! {
        #[test]
        fn coordinates_survive_the_grid(
            lat in -90.0f64..=90.0,
            lon in -180.0f64..=180.0,
            granularity in 1i32..=10_000,
        ) {
            let offset = Offset::with_granularity(granularity);
            let tolerance = f64::from(granularity) / 1e9;
            let back = offset.lat_to_degrees(offset.lat_to_units(lat).unwrap()).unwrap();
            prop_assert!((back - lat).abs() <= tolerance, "{} -> {}", lat, back);
            let back = offset.lon_to_degrees(offset.lon_to_units(lon).unwrap()).unwrap();
            prop_assert!((back - lon).abs() <= tolerance, "{} -> {}", lon, back);
        }
    }
}
