use futures::executor::block_on;

use draftsync::adapter::{BuiltinLoader, UnavailableLoader};
use draftsync::config::EditableRegion;
use draftsync::replay::{parse_script, replay};
use draftsync::sink::{ChangeEvent, Payload};

const SCRIPT: &str = r#"
# a user writes a short plan
{"step": "input", "at": 0, "text": "Plan"}
{"step": "command", "at": 150, "name": "h2"}
{"step": "input", "at": 300, "text": "\n\nwrite tests"}
{"step": "command", "at": 400, "name": "bullet_list"}
{"step": "tick", "at": 2000}
{"step": "input", "at": 2100, "text": "\n\nship"}
{"step": "blur", "at": 2200}
{"step": "tick", "at": 5000}
"#;

fn contents(events: &[ChangeEvent]) -> Vec<&str> {
    events.iter().map(|e| e.payload.content()).collect()
}

#[test]
fn test_rich_replay_emits_markup_snapshots() {
    let steps = parse_script(SCRIPT).unwrap();
    let region = EditableRegion::from_attributes("plan", "", Some("800"));
    let events = block_on(replay(region, &BuiltinLoader, &steps)).unwrap();
    assert_eq!(
        contents(&events),
        vec!["## Plan\n\n- write tests", "## Plan\n\n- write tests\n- ship"]
    );
    assert!(events.iter().all(|e| matches!(
        &e.payload,
        Payload::Section { section, .. } if section == "plan"
    )));
}

#[test]
fn test_plain_replay_keeps_raw_text() {
    let steps = parse_script(SCRIPT).unwrap();
    let region = EditableRegion::from_attributes("plan", "", None);
    let events = block_on(replay(region, &UnavailableLoader, &steps)).unwrap();
    assert_eq!(
        contents(&events),
        vec!["Plan\n\nwrite tests", "Plan\n\nwrite tests\n\nship"]
    );
}

#[test]
fn test_events_serialize_as_json_lines() {
    let steps = parse_script(r#"{"step": "input", "at": 0, "text": "hi"}"#).unwrap();
    let region = EditableRegion::new("notes", "");
    let events = block_on(replay(region, &UnavailableLoader, &steps)).unwrap();
    let line = serde_json::to_string(&events[0]).unwrap();
    assert_eq!(
        line,
        r#"{"event":"content_changed","payload":{"section":"notes","content":"hi"}}"#
    );
}

#[test]
fn test_initial_content_is_not_echoed_back() {
    let steps = parse_script(r#"{"step": "blur", "at": 10}"#).unwrap();
    let region = EditableRegion::new("notes", "## Existing\n\n- item");
    let events = block_on(replay(region, &BuiltinLoader, &steps)).unwrap();
    assert!(events.is_empty());
}
