//! Flattening of raw poll outcomes into export rows.

use tracing::debug;

use crate::model::{FlatRecord, PollOutcome, SensorResponse};

/// Turn the outcomes of a run into one [`FlatRecord`] per sensor reading.
///
/// `outcomes[i]` is poll number `i + 1`. Failed polls, rooms without
/// `roomData`, and missing reading lists contribute nothing. Rows come out in
/// poll order, then room order, then reading order.
pub fn flatten(outcomes: &[PollOutcome]) -> Vec<FlatRecord> {
    let mut records = Vec::new();

    for (index, outcome) in outcomes.iter().enumerate() {
        let poll_number = index + 1;

        let Some(body) = outcome.payload() else {
            debug!(poll = poll_number, "Skipping failed poll");
            continue;
        };

        let before = records.len();
        records.extend(flatten_response(poll_number, &SensorResponse::from_value(body)));
        debug!(
            poll = poll_number,
            rows = records.len() - before,
            "Flattened poll"
        );
    }

    records
}

/// Flatten a single parsed response for `poll_number`.
pub fn flatten_response(poll_number: usize, response: &SensorResponse) -> Vec<FlatRecord> {
    response
        .rooms
        .iter()
        .filter_map(|room| room.room_data.as_ref().map(|data| (room, data)))
        .flat_map(|(room, data)| {
            data.readings.iter().map(move |reading| {
                FlatRecord::new(
                    poll_number,
                    room.id.clone(),
                    reading.clone(),
                    data.shutter_closed.clone(),
                )
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Scalar;
    use serde_json::{json, Value};

    fn ok(body: Value) -> PollOutcome {
        PollOutcome::Success(body)
    }

    fn failed() -> PollOutcome {
        PollOutcome::Failure("API call failed".to_string())
    }

    fn one_room(room_id: &str, timestamp: i64) -> Value {
        json!({
            "data": [{
                "id": room_id,
                "roomData": {"shutterClosed": true, "data": [{"timestamp": timestamp}]}
            }]
        })
    }

    #[test]
    fn test_single_reading_record() {
        let outcomes = vec![ok(json!({
            "data": [{
                "id": "r1",
                "roomData": {
                    "shutterClosed": false,
                    "data": [{"timestamp": 100, "co2": 400, "temp": 21}]
                }
            }]
        }))];

        let records = flatten(&outcomes);

        assert_eq!(
            records,
            vec![FlatRecord {
                poll_number: 1,
                room_id: Some(Scalar::from("r1")),
                timestamp: Some(Scalar::from(100_i64)),
                co2: Some(Scalar::from(400_i64)),
                humidity: None,
                illumination: None,
                people: None,
                temp: Some(Scalar::from(21_i64)),
                voc: None,
                voc_index: None,
                shutter_closed: Some(Scalar::Bool(false)),
            }]
        );
    }

    #[test]
    fn test_failed_poll_keeps_poll_numbers_of_others() {
        let outcomes = vec![ok(one_room("a", 1)), failed(), ok(one_room("b", 3))];

        let records = flatten(&outcomes);

        let polls: Vec<usize> = records.iter().map(|r| r.poll_number).collect();
        assert_eq!(polls, vec![1, 3]);
        assert_eq!(records[0].room_id, Some(Scalar::from("a")));
        assert_eq!(records[1].room_id, Some(Scalar::from("b")));
    }

    #[test]
    fn test_all_failures_yield_nothing() {
        let outcomes: Vec<PollOutcome> = (0..10).map(|_| failed()).collect();
        assert!(flatten(&outcomes).is_empty());
    }

    #[test]
    fn test_failure_does_not_affect_other_polls() {
        let with_failure = vec![ok(one_room("a", 1)), failed(), ok(one_room("b", 3))];
        let with_success = vec![ok(one_room("a", 1)), ok(one_room("x", 2)), ok(one_room("b", 3))];

        let isolated: Vec<FlatRecord> = flatten(&with_success)
            .into_iter()
            .filter(|r| r.poll_number != 2)
            .collect();
        assert_eq!(flatten(&with_failure), isolated);
    }

    #[test]
    fn test_rooms_without_readings_contribute_nothing() {
        let outcomes = vec![ok(json!({
            "data": [
                {"id": "no-room-data"},
                {"id": "null-room-data", "roomData": null},
                {"id": "empty-readings", "roomData": {"shutterClosed": true, "data": []}},
                {"id": "missing-readings", "roomData": {"shutterClosed": true}},
                {"id": "kept", "roomData": {"data": [{"co2": 500}]}}
            ]
        }))];

        let records = flatten(&outcomes);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].room_id, Some(Scalar::from("kept")));
        assert_eq!(records[0].shutter_closed, None);
    }

    #[test]
    fn test_malformed_bodies_yield_nothing() {
        let outcomes = vec![
            ok(json!({})),
            ok(json!({"data": null})),
            ok(json!({"data": {"id": "not-a-list"}})),
            ok(json!("just a string")),
        ];
        assert!(flatten(&outcomes).is_empty());
    }

    #[test]
    fn test_record_count_matches_readings() {
        let outcomes = vec![
            ok(json!({
                "data": [
                    {"id": "a", "roomData": {"data": [{}, {}, {}]}},
                    {"id": "b", "roomData": null},
                    {"id": "c", "roomData": {"data": [{}, {}]}}
                ]
            })),
            failed(),
            ok(json!({
                "data": [
                    {"id": "a", "roomData": {"data": [{}]}},
                    {"id": "d", "roomData": {"data": []}}
                ]
            })),
        ];

        assert_eq!(flatten(&outcomes).len(), 3 + 2 + 1);
    }

    #[test]
    fn test_order_is_poll_then_room_then_reading() {
        let outcomes = vec![
            ok(json!({
                "data": [
                    {"id": "b", "roomData": {"data": [{"timestamp": 2}, {"timestamp": 1}]}},
                    {"id": "a", "roomData": {"data": [{"timestamp": 9}]}}
                ]
            })),
            ok(json!({
                "data": [{"id": "b", "roomData": {"data": [{"timestamp": 2}]}}]
            })),
        ];

        let keys: Vec<(usize, String, String)> = flatten(&outcomes)
            .iter()
            .map(|r| {
                (
                    r.poll_number,
                    r.room_id.as_ref().unwrap().to_string(),
                    r.timestamp.as_ref().unwrap().to_string(),
                )
            })
            .collect();

        // Repeated room/timestamp across polls is not deduplicated
        assert_eq!(
            keys,
            vec![
                (1, "b".to_string(), "2".to_string()),
                (1, "b".to_string(), "1".to_string()),
                (1, "a".to_string(), "9".to_string()),
                (2, "b".to_string(), "2".to_string()),
            ]
        );
    }

    #[test]
    fn test_missing_scalars_are_not_defaulted() {
        let outcomes = vec![ok(json!({
            "data": [{"id": "r1", "roomData": {"data": [{"co2": null, "people": 0}]}}]
        }))];

        let record = &flatten(&outcomes)[0];
        assert_eq!(record.co2, None);
        assert_eq!(record.people, Some(Scalar::from(0_i64)));
        assert_eq!(record.timestamp, None);
    }

    #[test]
    fn test_flatten_is_deterministic() {
        let outcomes = vec![ok(one_room("a", 1)), failed(), ok(one_room("b", 3))];
        assert_eq!(flatten(&outcomes), flatten(&outcomes));
    }
}
