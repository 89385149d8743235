use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::StoreError;

/// A single drawn result as published by the monitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// Lottery / bank name, e.g. "Federal" or "PT Rio"
    #[serde(rename = "loteria")]
    pub lottery: String,
    /// Draw time slot label, e.g. "11:00"
    #[serde(rename = "horario", default, skip_serializing_if = "Schedule::is_unscheduled")]
    pub schedule: Schedule,
    #[serde(rename = "numero")]
    pub number: DrawNumber,
    pub animal: String,
    /// Outer `None` = field absent, `Some(None)` = explicit `null`.
    #[serde(default, deserialize_with = "explicit_null", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Option<Timestamp>>,
    /// Fields the monitor attaches that this service does not interpret
    /// (`estado`, `id`, ...). Carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ResultRecord {
    /// Timestamp text, if one was published (absent and `null` both read as none).
    pub fn timestamp(&self) -> Option<&Timestamp> {
        self.timestamp.as_ref().and_then(|t| t.as_ref())
    }
}

/// Keeps a JSON `null` distinguishable from a missing key so it can be
/// written back as it arrived.
fn explicit_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Draw time slot. `Unscheduled` stands in for a missing `horario` and is
/// never produced from real data, so `Slot("")` stays distinct from it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Schedule {
    Slot(String),
    #[default]
    Unscheduled,
}

impl Schedule {
    pub fn is_unscheduled(&self) -> bool {
        matches!(self, Schedule::Unscheduled)
    }
}

impl Serialize for Schedule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Schedule::Slot(s) => serializer.serialize_str(s),
            Schedule::Unscheduled => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for Schedule {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<String>::deserialize(deserializer)? {
            Some(s) => Schedule::Slot(s),
            None => Schedule::Unscheduled,
        })
    }
}

/// Drawn number exactly as printed ("04" and "4" are different draws).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DrawNumber(pub String);

impl DrawNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for DrawNumber {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(DrawNumber(s)),
            other => Err(serde::de::Error::custom(format!(
                "numero must be a string to keep leading zeros, got {}",
                other
            ))),
        }
    }
}

/// Point in time kept in the textual form it was published with.
///
/// The monitor writes naive ISO-8601 local times, other producers write
/// RFC 3339. The raw text is what gets stored and served back; parsing only
/// happens when ordering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub String);

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

impl Timestamp {
    pub fn now() -> Self {
        Timestamp(Utc::now().to_rfc3339())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse into an instant. Naive values are read as UTC.
    pub fn parse(&self) -> Option<DateTime<Utc>> {
        let raw = self.0.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NAIVE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|naive| naive.and_utc())
    }
}

impl From<&str> for Timestamp {
    fn from(s: &str) -> Self {
        Timestamp(s.to_string())
    }
}

/// The unit held by a results store: the latest published collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub resultados: Vec<ResultRecord>,
    /// Same absent / `null` distinction as [`ResultRecord::timestamp`].
    #[serde(default, deserialize_with = "explicit_null", skip_serializing_if = "Option::is_none")]
    pub ultima_verificacao: Option<Option<Timestamp>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_resultados: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Snapshot::empty()
    }
}

impl Snapshot {
    /// `{ "resultados": [] }` – what a store hands out before anything was published.
    pub fn empty() -> Self {
        Snapshot {
            resultados: Vec::new(),
            ultima_verificacao: None,
            total_resultados: None,
            extra: Map::new(),
        }
    }

    /// Validate an untrusted JSON payload against the snapshot shape.
    pub fn from_json(bytes: &[u8]) -> Result<Self, StoreError> {
        serde_json::from_slice(bytes).map_err(|e| StoreError::Malformed(e.to_string()))
    }

    pub fn from_value(value: Value) -> Result<Self, StoreError> {
        serde_json::from_value(value).map_err(|e| StoreError::Malformed(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, StoreError> {
        serde_json::to_string(self).map_err(|e| StoreError::Malformed(e.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        self.resultados.is_empty()
    }

    pub fn last_checked(&self) -> Option<&Timestamp> {
        self.ultima_verificacao.as_ref().and_then(|t| t.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_keeps_leading_zeros_and_extra_fields() {
        let raw = json!({
            "loteria": "PT Rio",
            "horario": "11:00",
            "numero": "04",
            "animal": "Borboleta",
            "timestamp": "2024-05-01T11:20:31.123456",
            "estado": "RJ"
        });
        let rec: ResultRecord = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(rec.number.as_str(), "04");
        assert_eq!(rec.schedule, Schedule::Slot("11:00".into()));
        assert_eq!(rec.extra.get("estado"), Some(&json!("RJ")));
        assert_eq!(serde_json::to_value(&rec).unwrap(), raw);
    }

    #[test]
    fn missing_schedule_is_sentinel_not_empty_string() {
        let absent: ResultRecord =
            serde_json::from_value(json!({"loteria": "Federal", "numero": "1234", "animal": "Gato"}))
                .unwrap();
        let null: ResultRecord = serde_json::from_value(
            json!({"loteria": "Federal", "horario": null, "numero": "1234", "animal": "Gato"}),
        )
        .unwrap();
        let empty: ResultRecord = serde_json::from_value(
            json!({"loteria": "Federal", "horario": "", "numero": "1234", "animal": "Gato"}),
        )
        .unwrap();
        assert_eq!(absent.schedule, Schedule::Unscheduled);
        assert_eq!(null.schedule, Schedule::Unscheduled);
        assert_eq!(empty.schedule, Schedule::Slot(String::new()));
        assert!(serde_json::to_value(&absent).unwrap().get("horario").is_none());
    }

    #[test]
    fn explicit_null_timestamps_survive_round_trip() {
        let raw = json!({
            "resultados": [
                {"loteria": "PT", "numero": "04", "animal": "Burro", "timestamp": null},
                {"loteria": "PT", "numero": "17", "animal": "Veado"}
            ],
            "ultima_verificacao": null,
            "total_resultados": 0
        });
        let snapshot = Snapshot::from_value(raw.clone()).unwrap();
        assert_eq!(snapshot.resultados[0].timestamp, Some(None));
        assert_eq!(snapshot.resultados[1].timestamp, None);
        assert!(snapshot.resultados[0].timestamp().is_none());
        assert!(snapshot.last_checked().is_none());
        assert_eq!(serde_json::to_value(&snapshot).unwrap(), raw);
    }

    #[test]
    fn numeric_draw_number_is_rejected() {
        let err = serde_json::from_value::<ResultRecord>(
            json!({"loteria": "Federal", "numero": 4, "animal": "Burro"}),
        );
        assert!(err.is_err());
    }

    #[test]
    fn snapshot_requires_resultados() {
        let err = Snapshot::from_json(br#"{"ultima_verificacao": "2024-05-01T10:00:00"}"#);
        assert!(matches!(err, Err(StoreError::Malformed(_))));

        let err = Snapshot::from_json(br#"{"resultados": [], "total_resultados": -1}"#);
        assert!(matches!(err, Err(StoreError::Malformed(_))));

        let ok = Snapshot::from_json(br#"{"resultados": [], "fonte": "bichocerto.com"}"#).unwrap();
        assert!(ok.is_empty());
        assert_eq!(ok.extra.get("fonte"), Some(&json!("bichocerto.com")));
    }

    #[test]
    fn timestamp_formats() {
        let naive = Timestamp::from("2024-05-01T11:20:31.123456").parse().unwrap();
        let spaced = Timestamp::from("2024-05-01 11:20:31").parse().unwrap();
        let minute = Timestamp::from("2024-05-01T11:20").parse().unwrap();
        let offset = Timestamp::from("2024-05-01T08:20:31-03:00").parse().unwrap();
        assert!(naive > spaced);
        assert!(minute < spaced);
        assert_eq!(offset, spaced);
        assert!(Timestamp::from("ontem").parse().is_none());
    }
}
