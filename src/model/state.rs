use crate::core::FieldMap;
use serde::{Deserialize, Serialize};

/// Serializable snapshot of a record's data and lifecycle flags.
///
/// Metadata and the gateway are not part of the snapshot; they are supplied
/// again when the record is restored with [`Record::restore`](super::Record::restore).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RecordState {
    pub fields: FieldMap,
    pub modified: FieldMap,
    pub is_new: bool,
    pub track_changes: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Value;

    #[test]
    fn test_state_json_shape() {
        let mut state = RecordState {
            is_new: false,
            track_changes: true,
            ..Default::default()
        };
        state.fields.insert("id".into(), Value::Integer(2));
        state.fields.insert("name".into(), Value::from("b"));
        state.modified.insert("name".into(), Value::from("b"));

        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(
            json,
            r#"{"fields":{"id":2,"name":"b"},"modified":{"name":"b"},"is_new":false,"track_changes":true}"#
        );
        assert_eq!(serde_json::from_str::<RecordState>(&json).unwrap(), state);
    }
}
