//! Static routing from message kind to broker topic.

use crate::error::{BeaconError, Result};
use crate::messaging::envelope::kinds;

/// Topic carrying SIS ingestion outcomes.
pub const TOPIC_ATTENDANCE: &str = "attendance";
/// Topic carrying outbound guardian communications.
pub const TOPIC_COMMS: &str = "comms";
/// Topic carrying case/intervention workflow events.
pub const TOPIC_WORKFLOW: &str = "workflow";

/// Resolve the destination topic for a message kind.
///
/// The mapping is fixed and exhaustive; an unmapped kind is an error,
/// never a silent drop.
pub fn topic_for_kind(kind: &str) -> Result<&'static str> {
    match kind {
        kinds::ATTENDANCE_INGESTED | kinds::ROSTER_SYNCED => Ok(TOPIC_ATTENDANCE),
        kinds::SEND_MESSAGE_REQUESTED => Ok(TOPIC_COMMS),
        kinds::DELIVERY_UPDATED
        | kinds::GUARDIAN_REPLY
        | kinds::GUARDIAN_OPT_OUT
        | kinds::CASE_CREATED
        | kinds::SAFEGUARDING_ALERT => Ok(TOPIC_WORKFLOW),
        other => Err(BeaconError::UnknownMessageKind(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routing_table() {
        let cases = [
            (kinds::ATTENDANCE_INGESTED, TOPIC_ATTENDANCE),
            (kinds::ROSTER_SYNCED, TOPIC_ATTENDANCE),
            (kinds::SEND_MESSAGE_REQUESTED, TOPIC_COMMS),
            (kinds::DELIVERY_UPDATED, TOPIC_WORKFLOW),
            (kinds::GUARDIAN_REPLY, TOPIC_WORKFLOW),
            (kinds::GUARDIAN_OPT_OUT, TOPIC_WORKFLOW),
            (kinds::CASE_CREATED, TOPIC_WORKFLOW),
            (kinds::SAFEGUARDING_ALERT, TOPIC_WORKFLOW),
        ];
        for (kind, topic) in cases {
            assert_eq!(topic_for_kind(kind).unwrap(), topic, "kind {kind}");
        }
    }

    #[test]
    fn unknown_kind_is_an_error() {
        let err = topic_for_kind("BellRang").unwrap_err();
        assert!(matches!(err, BeaconError::UnknownMessageKind(k) if k == "BellRang"));
    }

    #[test]
    fn empty_kind_is_an_error() {
        assert!(topic_for_kind("").is_err());
    }
}
