//! Encoders normalizing captured values into JSON primitives.

use crate::datum::{Datum, DatumMap};

/// Recursive normalization of a [`Datum`].
///
/// The provided [`encode`](Encoder::encode) walks strings, mappings and
/// sequences and passes everything else through unchanged. Implementations
/// add rules by overriding [`encode_special`](Encoder::encode_special), which
/// is tried first at every depth of the traversal.
pub trait Encoder: Send + Sync {
    /// Encoding for values the base traversal does not handle, or `None`.
    fn encode_special(&self, _value: &Datum) -> Option<Datum> {
        None
    }

    fn encode(&self, value: &Datum) -> Datum {
        if let Some(encoded) = self.encode_special(value) {
            return encoded;
        }
        match value {
            Datum::Str(s) => Datum::Str(s.clone()),
            Datum::Map(map) => Datum::Map(self.encode_map(map)),
            Datum::Seq(items) => Datum::Seq(items.iter().map(|item| self.encode(item)).collect()),
            Datum::Live(read) => self.encode(&read()),
            other => other.clone(),
        }
    }

    fn encode_map(&self, map: &DatumMap) -> DatumMap {
        map.iter()
            .map(|(key, value)| (key, self.encode(value)))
            .collect()
    }
}

/// Container traversal only. Dates, paths and models pass through and fail
/// at serialization.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseEncoder;

impl Encoder for BaseEncoder {}

/// Adds models, ISO-8601 dates and times, and paths to the base rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectEncoder;

impl Encoder for ObjectEncoder {
    fn encode_special(&self, value: &Datum) -> Option<Datum> {
        let encoded = match value {
            Datum::Model(model) => self.encode(&Datum::Map(model.to_mapping())),
            Datum::Date(date) => Datum::Str(date.format("%Y-%m-%d").to_string()),
            Datum::Time(time) => Datum::Str(time.format("%H:%M:%S%.f").to_string()),
            Datum::DateTime(datetime) => {
                Datum::Str(datetime.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
            }
            Datum::Timestamp(timestamp) => Datum::Str(timestamp.to_rfc3339()),
            Datum::Path(path) => Datum::Str(path.to_string_lossy().into_owned()),
            _ => return None,
        };
        Some(encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datum::{Mappable, ToDatum};
    use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    struct DateHolder {
        d: NaiveDate,
    }

    impl Mappable for DateHolder {
        fn to_mapping(&self) -> DatumMap {
            [("d", self.d.to_datum())].into_iter().collect()
        }
    }

    fn new_year() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
    }

    #[test]
    fn primitive_dict() {
        let data: DatumMap = [
            ("a", 1.to_datum()),
            ("d", new_year().to_datum()),
            ("s", "string".to_datum()),
        ]
        .into_iter()
        .collect();

        let encoded = ObjectEncoder.encode(&Datum::Map(data));
        assert_eq!(
            encoded,
            Datum::from(json!({"a": 1, "d": "2020-01-01", "s": "string"}))
        );
    }

    #[test]
    fn model_is_encoded_through_its_mapping() {
        let encoded = ObjectEncoder.encode(&Datum::model(DateHolder { d: new_year() }));
        assert_eq!(encoded, Datum::from(json!({"d": "2020-01-01"})));
    }

    #[test]
    fn models_nested_in_containers() {
        let list = Datum::Seq(vec![
            Datum::model(DateHolder { d: new_year() }),
            Datum::model(DateHolder { d: new_year() }),
        ]);
        assert_eq!(
            ObjectEncoder.encode(&list),
            Datum::from(json!([{"d": "2020-01-01"}, {"d": "2020-01-01"}]))
        );

        let map: DatumMap = (0..2)
            .map(|i| (i.to_string(), Datum::model(DateHolder { d: new_year() })))
            .collect();
        assert_eq!(
            ObjectEncoder.encode(&Datum::Map(map)),
            Datum::from(json!({"0": {"d": "2020-01-01"}, "1": {"d": "2020-01-01"}}))
        );
    }

    #[test]
    fn path_object() {
        let obj: BTreeMap<&str, PathBuf> = [("p", PathBuf::from("/tmp"))].into_iter().collect();
        assert_eq!(
            ObjectEncoder.encode(&obj.to_datum()),
            Datum::from(json!({"p": "/tmp"}))
        );
    }

    #[test]
    fn times_are_iso_8601() {
        let time = NaiveTime::from_hms_opt(9, 30, 0).unwrap();
        assert_eq!(ObjectEncoder.encode(&time.to_datum()), "09:30:00".to_datum());

        let naive = new_year().and_hms_opt(12, 0, 5).unwrap();
        assert_eq!(
            ObjectEncoder.encode(&naive.to_datum()),
            "2020-01-01T12:00:05".to_datum()
        );

        let aware = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            ObjectEncoder.encode(&aware.to_datum()),
            "2020-01-01T00:00:00+00:00".to_datum()
        );
    }

    #[test]
    fn encoding_is_idempotent_on_primitives() {
        let value = Datum::from(json!({"a": [1, 2, {"b": null}], "c": "text", "d": 1.5}));
        let once = ObjectEncoder.encode(&value);
        assert_eq!(once, value);
        assert_eq!(ObjectEncoder.encode(&once), once);
    }

    #[test]
    fn base_encoder_passes_dates_through() {
        let encoded = BaseEncoder.encode(&Datum::Seq(vec![new_year().to_datum()]));
        assert_eq!(encoded, Datum::Seq(vec![Datum::Date(new_year())]));
        assert!(serde_json::to_string(&encoded).is_err());
    }
}
