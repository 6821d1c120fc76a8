//! The measurement records writers push at the intake service.

use rand::Rng;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Name carried by every measurement this generator produces.
pub const MEASUREMENT_NAME: &str = "test_measurement";

/// Exclusive upper bound on the random `value` field.
pub const VALUE_CEILING: u64 = 100;

/// One measurement record, serialized to a JSON text frame and discarded.
///
/// The shape matches what the intake service expects line-for-line: a fixed
/// measurement name, a numeric field map and a string tag map identifying
/// the producing writer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measurement {
    /// The measurement name, always [`MEASUREMENT_NAME`].
    pub measurement: String,
    /// Numeric fields; a single `value` in `[0, VALUE_CEILING)`.
    pub fields: FxHashMap<String, u64>,
    /// String tags; a single `from` naming the producing writer.
    pub tags: FxHashMap<String, String>,
}

impl Measurement {
    /// Generate a fresh measurement for the given writer.
    ///
    /// Pure function of the RNG and the writer identity; nothing is
    /// retained between calls.
    pub fn synthetic<R>(rng: &mut R, writer_id: u16) -> Self
    where
        R: Rng + ?Sized,
    {
        let mut fields = FxHashMap::default();
        fields.insert("value".to_string(), rng.random_range(0..VALUE_CEILING));

        let mut tags = FxHashMap::default();
        tags.insert("from".to_string(), format!("gofer-{writer_id}"));

        Self {
            measurement: MEASUREMENT_NAME.to_string(),
            fields,
            tags,
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rand::{SeedableRng, rngs::SmallRng};

    use super::{MEASUREMENT_NAME, Measurement, VALUE_CEILING};

    proptest! {
        #[test]
        fn shape_invariants_hold(seed: u64, writer_id: u16) {
            let mut rng = SmallRng::seed_from_u64(seed);
            let m = Measurement::synthetic(&mut rng, writer_id);

            prop_assert_eq!(m.measurement.as_str(), MEASUREMENT_NAME);
            prop_assert_eq!(m.fields.len(), 1);
            prop_assert!(m.fields["value"] < VALUE_CEILING);
            prop_assert_eq!(m.tags.len(), 1);
            prop_assert_eq!(&m.tags["from"], &format!("gofer-{writer_id}"));
        }
    }

    proptest! {
        #[test]
        fn round_trips_through_json(seed: u64, writer_id: u16) {
            let mut rng = SmallRng::seed_from_u64(seed);
            let m = Measurement::synthetic(&mut rng, writer_id);

            let bytes = serde_json::to_vec(&m).expect("failed to serialize");
            let back: Measurement =
                serde_json::from_slice(&bytes).expect("failed to deserialize");
            prop_assert_eq!(m, back);
        }
    }

    #[test]
    fn distinct_writers_are_distinguishable_on_the_wire() {
        let mut rng = SmallRng::seed_from_u64(42);
        let a = Measurement::synthetic(&mut rng, 0);
        let b = Measurement::synthetic(&mut rng, 1);

        assert_eq!(a.tags["from"], "gofer-0");
        assert_eq!(b.tags["from"], "gofer-1");
    }
}
