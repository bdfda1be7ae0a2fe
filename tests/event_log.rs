//! Property coverage for the capped event log.

use claimsim::log::{EventLog, LogAction, LogEvent};
use proptest::prelude::*;

fn message(ts: i64) -> LogEvent {
    LogEvent::stage_message(ts, "intake".into(), format!("m{ts}"))
}

proptest! {
    #[test]
    fn len_never_exceeds_cap(count in 0usize..400) {
        let mut log = EventLog::new();
        for ts in 0..count {
            log.append(message(ts as i64));
        }
        prop_assert!(log.len() <= EventLog::MAX_EVENTS);
        prop_assert_eq!(log.len(), count.min(EventLog::MAX_EVENTS));
    }

    #[test]
    fn storage_order_is_append_order(count in 1usize..300) {
        let mut log = EventLog::new();
        for ts in 0..count {
            log.append(message(ts as i64));
        }
        let timestamps: Vec<i64> = log.iter().map(|e| e.timestamp).collect();
        let mut sorted = timestamps.clone();
        sorted.sort_unstable();
        prop_assert_eq!(&timestamps, &sorted);
        // The retained window is the most recent entries.
        let newest = log.iter_newest_first().next().unwrap().timestamp;
        prop_assert_eq!(newest, (count - 1) as i64);
    }

    #[test]
    fn action_edit_preserves_everything_else(
        filler in 1usize..50,
        priority in "[a-z]{3,8}",
    ) {
        let mut log = EventLog::new();
        for ts in 0..filler {
            log.append(message(ts as i64));
        }
        log.append(
            LogEvent::stage_message(1_000, "adjudication".into(), "Priority assigned.")
                .with_action(LogAction::SetPriority, serde_json::json!({"priority": "medium"})),
        );
        let index = log.len() - 1;
        let before_len = log.len();

        log.update_action_data(index, serde_json::json!({ "priority": priority })).unwrap();

        prop_assert_eq!(log.len(), before_len);
        let edited = log.get(index).unwrap();
        prop_assert_eq!(edited.timestamp, 1_000);
        prop_assert_eq!(edited.action, Some(LogAction::SetPriority));
        prop_assert_eq!(
            edited.action_data.clone(),
            Some(serde_json::json!({ "priority": priority }))
        );
    }
}

#[test]
fn serialized_log_is_a_json_array_in_wire_form() {
    let mut log = EventLog::new();
    log.append(LogEvent::start(1, "intake".into()));
    log.append(LogEvent::transition(
        2,
        "intake".into(),
        "extraction".into(),
        "done",
    ));

    let json = serde_json::to_value(&log).unwrap();
    let entries = json.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries[0]["fromNodeId"].is_null());
    assert_eq!(entries[1]["fromNodeId"], "intake");
    assert_eq!(entries[1]["toNodeId"], "extraction");
}
