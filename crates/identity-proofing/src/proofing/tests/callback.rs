use super::common::*;
use serde_json::json;

use crate::proofing::callback::{CallbackBody, CallbackError, CallbackReceiver};
use crate::proofing::stage::Stage;
use crate::proofing::store::{ResultId, ResultStore};
use crate::proofing::vendor_result::VendorResult;

fn passing() -> VendorResult {
    serde_json::from_value(json!({
        "success": true,
        "errors": {},
        "reasons": ["Good number"],
    }))
    .expect("vendor result")
}

fn body(stage: Stage, result_id: &ResultId, result: &VendorResult) -> CallbackBody {
    CallbackBody::for_stage(stage, result_id, result).expect("body")
}

#[test]
fn valid_callbacks_are_stored_under_their_id() {
    let store = store();
    let receiver = CallbackReceiver::new(TOKEN, store.clone());
    let id = ResultId::mint();

    let stored_id = receiver
        .receive(Some(TOKEN), Stage::Phone, body(Stage::Phone, &id, &passing()))
        .expect("accepted");

    assert_eq!(stored_id, id);
    let entry = store.load(&id).expect("loads").expect("stored");
    assert_eq!(entry.result, passing());
}

#[test]
fn wrong_or_missing_tokens_store_nothing() {
    let store = store();
    let receiver = CallbackReceiver::new(TOKEN, store.clone());
    let id = ResultId::mint();

    for token in [None, Some("callback-secreT"), Some("")] {
        let err = receiver
            .receive(token, Stage::Phone, body(Stage::Phone, &id, &passing()))
            .expect_err("rejected");
        assert!(matches!(err, CallbackError::Unauthorized));
    }
    assert!(store.load(&id).expect("loads").is_none());
}

#[test]
fn duplicate_delivery_keeps_the_later_payload() {
    let store = store();
    let receiver = CallbackReceiver::new(TOKEN, store.clone());
    let id = ResultId::mint();

    receiver
        .receive(
            Some(TOKEN),
            Stage::Phone,
            body(Stage::Phone, &id, &VendorResult::job_failed()),
        )
        .expect("first delivery");
    receiver
        .receive(Some(TOKEN), Stage::Phone, body(Stage::Phone, &id, &passing()))
        .expect("redelivery");

    let entry = store.load(&id).expect("loads").expect("stored");
    assert_eq!(entry.result, passing());
}

#[test]
fn result_must_sit_under_the_stage_field() {
    let store = store();
    let receiver = CallbackReceiver::new(TOKEN, store.clone());
    let id = ResultId::mint();

    let err = receiver
        .receive(
            Some(TOKEN),
            Stage::Resolution,
            body(Stage::Phone, &id, &passing()),
        )
        .expect_err("wrong field");
    assert!(matches!(err, CallbackError::MissingResult(field) if field == "resolution_result"));
    assert!(store.load(&id).expect("loads").is_none());
}

#[test]
fn malformed_results_and_ids_are_rejected() {
    let receiver = CallbackReceiver::new(TOKEN, store());

    let malformed: CallbackBody = serde_json::from_value(json!({
        "result_id": ResultId::mint(),
        "phone_result": { "errors": [] },
    }))
    .expect("body");
    let err = receiver
        .receive(Some(TOKEN), Stage::Phone, malformed)
        .expect_err("no success flag");
    assert!(matches!(err, CallbackError::MalformedResult(_)));

    let traversal = CallbackBody {
        result_id: "../../etc/passwd".to_string(),
        ..body(Stage::Phone, &ResultId::mint(), &passing())
    };
    let err = receiver
        .receive(Some(TOKEN), Stage::Phone, traversal)
        .expect_err("bad id");
    assert!(matches!(err, CallbackError::InvalidResultId(_)));
}
