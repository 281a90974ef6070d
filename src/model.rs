//! Data model for sensor API responses and flattened export rows.
//!
//! The API returns a nested tree (`data` → rooms → `roomData` → readings) in
//! which any level may be missing. Each level gets its own record type with an
//! extraction function that never fails: absent collections become empty and
//! absent scalars become `None`.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Field names of an exported row, in output order.
pub const FIELDS: [&str; 11] = [
    "poll_number",
    "room_id",
    "timestamp",
    "co2",
    "humidity",
    "illumination",
    "people",
    "temp",
    "voc",
    "vocIndex",
    "shutterClosed",
];

/// Result of a single poll cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// Parsed JSON body of a successful call
    Success(Value),

    /// The poll produced no usable data
    Failure(String),
}

impl PollOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PollOutcome::Success(_))
    }

    /// The response body, if the poll succeeded.
    pub fn payload(&self) -> Option<&Value> {
        match self {
            PollOutcome::Success(body) => Some(body),
            PollOutcome::Failure(_) => None,
        }
    }
}

/// A JSON leaf value carried through to the export unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),

    /// Kept as the original JSON number so integers never turn into floats
    Number(serde_json::Number),

    Text(String),
}

impl Scalar {
    /// Extract a scalar from a JSON value. `null` maps to `None`.
    ///
    /// Arrays and objects in a scalar position are kept as compact JSON text.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(b) => Some(Scalar::Bool(*b)),
            Value::Number(n) => Some(Scalar::Number(n.clone())),
            Value::String(s) => Some(Scalar::Text(s.clone())),
            nested @ (Value::Array(_) | Value::Object(_)) => Some(Scalar::Text(nested.to_string())),
        }
    }

    fn field(object: &Map<String, Value>, key: &str) -> Option<Self> {
        object.get(key).and_then(Self::from_value)
    }
}

impl std::fmt::Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Number(value.into())
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Scalar::Bool(b) => serializer.serialize_bool(*b),
            Scalar::Number(n) => n.serialize(serializer),
            Scalar::Text(s) => serializer.serialize_str(s),
        }
    }
}

/// Read `key` from an object as an array; anything else is treated as empty.
fn array_field<'a>(object: &'a Map<String, Value>, key: &str) -> &'a [Value] {
    match object.get(key) {
        Some(Value::Array(items)) => items.as_slice(),
        _ => &[],
    }
}

/// Top-level body of the room sensor endpoint.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SensorResponse {
    pub rooms: Vec<Room>,
}

impl SensorResponse {
    pub fn from_value(value: &Value) -> Self {
        let rooms: Vec<Room> = value
            .as_object()
            .map(|body| array_field(body, "data").iter().map(Room::from_value).collect())
            .unwrap_or_default();

        Self { rooms }
    }
}

/// A room tracked by the API.
#[derive(Debug, Clone, PartialEq)]
pub struct Room {
    pub id: Option<Scalar>,

    /// `None` when `roomData` is absent, `null`, or not an object
    pub room_data: Option<RoomData>,
}

impl Room {
    pub fn from_value(value: &Value) -> Self {
        match value.as_object() {
            Some(room) => Self {
                id: Scalar::field(room, "id"),
                room_data: room
                    .get("roomData")
                    .and_then(Value::as_object)
                    .map(RoomData::from_object),
            },
            None => Self {
                id: None,
                room_data: None,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoomData {
    pub shutter_closed: Option<Scalar>,
    pub readings: Vec<SensorReading>,
}

impl RoomData {
    pub fn from_object(room_data: &Map<String, Value>) -> Self {
        Self {
            shutter_closed: Scalar::field(room_data, "shutterClosed"),
            readings: array_field(room_data, "data")
                .iter()
                .map(SensorReading::from_value)
                .collect(),
        }
    }
}

/// One time-series sample of a room's sensors.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SensorReading {
    pub timestamp: Option<Scalar>,
    pub co2: Option<Scalar>,
    pub humidity: Option<Scalar>,
    pub illumination: Option<Scalar>,
    pub people: Option<Scalar>,
    pub temp: Option<Scalar>,
    pub voc: Option<Scalar>,
    pub voc_index: Option<Scalar>,
}

impl SensorReading {
    /// Extract a reading. A non-object element yields an all-`None` reading so
    /// it still occupies its row.
    pub fn from_value(value: &Value) -> Self {
        let Some(reading) = value.as_object() else {
            return Self::default();
        };

        Self {
            timestamp: Scalar::field(reading, "timestamp"),
            co2: Scalar::field(reading, "co2"),
            humidity: Scalar::field(reading, "humidity"),
            illumination: Scalar::field(reading, "illumination"),
            people: Scalar::field(reading, "people"),
            temp: Scalar::field(reading, "temp"),
            voc: Scalar::field(reading, "voc"),
            voc_index: Scalar::field(reading, "vocIndex"),
        }
    }
}

/// One exported row: a single reading joined with its poll and room.
///
/// Field order here is the CSV column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatRecord {
    pub poll_number: usize,
    pub room_id: Option<Scalar>,
    pub timestamp: Option<Scalar>,
    pub co2: Option<Scalar>,
    pub humidity: Option<Scalar>,
    pub illumination: Option<Scalar>,
    pub people: Option<Scalar>,
    pub temp: Option<Scalar>,
    pub voc: Option<Scalar>,
    #[serde(rename = "vocIndex")]
    pub voc_index: Option<Scalar>,
    #[serde(rename = "shutterClosed")]
    pub shutter_closed: Option<Scalar>,
}

impl FlatRecord {
    pub fn new(
        poll_number: usize,
        room_id: Option<Scalar>,
        reading: SensorReading,
        shutter_closed: Option<Scalar>,
    ) -> Self {
        Self {
            poll_number,
            room_id,
            timestamp: reading.timestamp,
            co2: reading.co2,
            humidity: reading.humidity,
            illumination: reading.illumination,
            people: reading.people,
            temp: reading.temp,
            voc: reading.voc,
            voc_index: reading.voc_index,
            shutter_closed,
        }
    }
}
