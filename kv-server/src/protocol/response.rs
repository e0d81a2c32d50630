use kv::{ShowAllEntry, TxnId};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Turns a dispatch result into the wire JSON object. Never panics on a
/// well-formed input.
pub fn ok_begin(tid: TxnId) -> Value {
    json!({ "status": "Ok", "transaction_id": tid })
}

pub fn ok_put() -> Value {
    json!({ "status": "Ok" })
}

pub fn ok_get(value: Option<String>) -> Value {
    json!({ "status": "Ok", "result": value })
}

pub fn ok_del() -> Value {
    json!({ "status": "Ok" })
}

pub fn ok_commit() -> Value {
    json!({ "status": "Ok" })
}

pub fn ok_rollback() -> Value {
    json!({ "status": "Ok" })
}

pub fn ok_commit_all() -> Value {
    json!({ "status": "Ok" })
}

pub fn ok_show_all(data: BTreeMap<String, ShowAllEntry>) -> Value {
    let data: BTreeMap<String, Value> = data
        .into_iter()
        .map(|(k, v)| (k, json!({ "value": v.value, "transaction_id": v.transaction_id })))
        .collect();
    json!({ "status": "Ok", "data": data })
}

pub fn error(mesg: impl Into<String>) -> Value {
    json!({ "status": "Error", "mesg": mesg.into() })
}
