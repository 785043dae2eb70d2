use crate::adapter::{InlineDispatcher, ManualDispatcher, StubCatalog, ThreadedDispatcher};
use crate::domain::{
    CatalogError, CategoryId, EditField, EditorState, Part, PartId, SourceRecord,
};
use crate::ports::outbound::{CatalogService, Reply, Request};
use crate::usecase::{CatalogSession, SessionEvent};
use common::adapter::{MemoryLog, NoopLog};
use serde_json::json;
use std::sync::Arc;

fn inline_session(stub: &Arc<StubCatalog>) -> CatalogSession {
    let service: Arc<dyn CatalogService> = stub.clone();
    CatalogSession::new(Box::new(InlineDispatcher::new(service)), Arc::new(NoopLog))
}

fn manual_session() -> (CatalogSession, ManualDispatcher) {
    let dispatcher = ManualDispatcher::new();
    let session = CatalogSession::new(Box::new(dispatcher.clone()), Arc::new(NoopLog));
    (session, dispatcher)
}

fn failures(events: &[SessionEvent]) -> Vec<&CatalogError> {
    events
        .iter()
        .filter_map(|e| match e {
            SessionEvent::Failed(err) => Some(err),
            _ => None,
        })
        .collect()
}

#[test]
fn test_categories_fetched_once_per_session() {
    let stub = Arc::new(StubCatalog::sample());
    let mut session = inline_session(&stub);
    session.start();
    assert_eq!(session.wait_idle(), vec![SessionEvent::CategoriesLoaded(3)]);
    session.start();
    assert!(session.wait_idle().is_empty());
    assert_eq!(stub.count("list_categories"), 1);

    session.set_filter("RESIST");
    let visible: Vec<&str> = session
        .visible_categories()
        .iter()
        .map(|c| c.id.as_str())
        .collect();
    assert_eq!(visible, vec!["RES"]);
}

#[test]
fn test_selecting_same_category_twice_fetches_once() {
    let stub = Arc::new(StubCatalog::new());
    stub.add_category(crate::domain::Category::new("RES", Some("Resistors")));
    let mut session = inline_session(&stub);
    session.start();
    session.wait_idle();

    assert!(session.select_category(CategoryId::new("RES")));
    assert!(!session.select_category(CategoryId::new("RES")));
    let events = session.wait_idle();
    assert_eq!(events, vec![SessionEvent::PartsLoaded(CategoryId::new("RES"))]);
    assert_eq!(stub.count("list_parts"), 1);
}

#[test]
fn test_malformed_parts_listing_yields_empty_list() {
    let stub = Arc::new(StubCatalog::sample());
    stub.set_listing("RES", json!({ "error": "not a list" }));
    let mut session = inline_session(&stub);
    session.select_category(CategoryId::new("RES"));
    let events = session.wait_idle();
    assert!(matches!(
        failures(&events)[..],
        [CatalogError::MalformedResponse { .. }]
    ));
    assert!(session.navigator().parts().is_empty());

    session.select_category(CategoryId::new("IC"));
    session.wait_idle();
    assert_eq!(session.navigator().parts().len(), 1);
}

#[test]
fn test_refresh_and_create_part() {
    let stub = Arc::new(StubCatalog::sample());
    let mut session = inline_session(&stub);
    session.select_category(CategoryId::new("RES"));
    session.wait_idle();
    assert_eq!(session.navigator().parts().len(), 1);

    session.create_part("RES-002-0001", "1k 0603").unwrap();
    let events = session.wait_idle();
    assert_eq!(
        events,
        vec![
            SessionEvent::PartCreated(PartId::new("RES-002-0001")),
            SessionEvent::PartsLoaded(CategoryId::new("RES")),
        ]
    );
    let ids: Vec<&str> = session
        .navigator()
        .parts()
        .iter()
        .map(|p| p.id.as_str())
        .collect();
    assert_eq!(ids, vec!["RES-001-0001", "RES-002-0001"]);
    assert_eq!(stub.count("list_parts"), 2);
}

#[test]
fn test_failed_create_leaves_list_untouched() {
    let stub = Arc::new(StubCatalog::sample());
    stub.fail("create_part");
    let mut session = inline_session(&stub);
    session.select_category(CategoryId::new("RES"));
    session.wait_idle();
    session.create_part("RES-002-0001", "").unwrap();
    let events = session.wait_idle();
    assert!(matches!(
        failures(&events)[..],
        [CatalogError::CreateFailed { .. }]
    ));
    assert_eq!(session.navigator().parts().len(), 1);
    assert_eq!(stub.count("list_parts"), 1);
}

#[test]
fn test_edit_and_save_round_trip() {
    let stub = Arc::new(StubCatalog::sample());
    let mut session = inline_session(&stub);
    session.load_part(PartId::new("IC-001-0001")).unwrap();
    session.wait_idle();

    session.edit(EditField::Mpn { position: 2 }, "NE5532").unwrap();
    let position = session.add_source().unwrap();
    assert_eq!(position, 3);
    session.save().unwrap();
    assert_eq!(
        session.wait_idle(),
        vec![SessionEvent::Saved(PartId::new("IC-001-0001"))]
    );

    assert_eq!(session.editor().state(), EditorState::Loaded);
    let stored = stub.part("IC-001-0001").unwrap();
    assert_eq!(stored.fields()["MPN2"].value, "NE5532");
    assert!(!stored.fields().contains_key("Manufacturer3"));
    assert_eq!(
        session.editor().draft().sources,
        vec![SourceRecord::new("TI", "LM358"), SourceRecord::new("ON", "NE5532")]
    );
}

#[test]
fn test_clearing_all_sources_removes_their_keys() {
    let stub = Arc::new(StubCatalog::sample());
    let mut session = inline_session(&stub);
    session.load_part(PartId::new("RES-001-0001")).unwrap();
    session.wait_idle();

    session.edit(EditField::Manufacturer { position: 1 }, "").unwrap();
    session.edit(EditField::Mpn { position: 1 }, "").unwrap();
    session.save().unwrap();
    session.wait_idle();

    let stored = stub.part("RES-001-0001").unwrap();
    assert!(!stored.fields().contains_key("Manufacturer"));
    assert!(!stored.fields().contains_key("MPN"));
    assert_eq!(stored.fields()["Footprint"].value, "Resistor_SMD:R_0603");
    assert_eq!(session.editor().draft().sources, vec![SourceRecord::default()]);
}

#[test]
fn test_failed_save_keeps_edits_and_can_be_retried() {
    let stub = Arc::new(StubCatalog::sample());
    let mut session = inline_session(&stub);
    session.load_part(PartId::new("RES-001-0001")).unwrap();
    session.wait_idle();
    session.edit(EditField::Description, "10k 1% 0603").unwrap();

    stub.fail("update_part");
    session.save().unwrap();
    let events = session.wait_idle();
    assert!(matches!(failures(&events)[..], [CatalogError::SaveFailed { .. }]));
    assert_eq!(session.editor().state(), EditorState::Editing);
    assert_eq!(session.editor().draft().description, "10k 1% 0603");

    stub.recover("update_part");
    session.save().unwrap();
    session.wait_idle();
    assert_eq!(stub.part("RES-001-0001").unwrap().description(), "10k 1% 0603");
}

#[test]
fn test_second_save_while_pending_is_rejected_without_request() {
    let (mut session, dispatcher) = manual_session();
    session.load_part(PartId::new("IC-001-0001")).unwrap();
    let load = dispatcher.submitted()[0].clone();
    dispatcher.deliver(
        load.ticket,
        Reply::Part(Ok(Part::new("IC-001-0001", "0001").with_field("MPN", "LM358"))),
    );
    session.pump();

    session.edit(EditField::Description, "op-amp").unwrap();
    session.save().unwrap();
    assert_eq!(dispatcher.submitted().len(), 2);

    let err = session.save().unwrap_err();
    assert!(matches!(err, CatalogError::OperationInProgress { operation: "save", .. }));
    assert!(matches!(
        session.start_revision(),
        Err(CatalogError::OperationInProgress { .. })
    ));
    assert_eq!(dispatcher.submitted().len(), 2);
    assert!(!session.is_idle());
}

#[test]
fn test_revision_moves_editor_to_new_part() {
    let stub = Arc::new(StubCatalog::new());
    stub.add_part(Part::new("RES-1234-A", "A").with_field("Description", "10k"));
    stub.set_revision_id("RES-1234-A", "RES-1234-B");
    let mut session = inline_session(&stub);
    session.load_part(PartId::new("RES-1234-A")).unwrap();
    session.wait_idle();

    session.start_revision().unwrap();
    let events = session.wait_idle();
    assert_eq!(
        events,
        vec![
            SessionEvent::RevisionCreated(PartId::new("RES-1234-B")),
            SessionEvent::PartLoaded(PartId::new("RES-1234-B")),
        ]
    );
    let editor = session.editor();
    assert_eq!(editor.target().unwrap().as_str(), "RES-1234-B");
    assert_eq!(editor.part().unwrap().id().as_str(), "RES-1234-B");
    assert_eq!(editor.part().unwrap().revision().as_str(), "B");
    assert_eq!(editor.draft().description, "10k");
}

#[test]
fn test_failed_revision_returns_to_loaded() {
    let stub = Arc::new(StubCatalog::sample());
    stub.fail("start_revision");
    let mut session = inline_session(&stub);
    session.load_part(PartId::new("RES-001-0001")).unwrap();
    session.wait_idle();
    session.start_revision().unwrap();
    let events = session.wait_idle();
    assert!(matches!(
        failures(&events)[..],
        [CatalogError::RevisionFailed { .. }]
    ));
    assert_eq!(session.editor().state(), EditorState::Loaded);
    assert_eq!(stub.count("get_part"), 1);
}

#[test]
fn test_out_of_order_load_replies_keep_latest_target() {
    let log = Arc::new(MemoryLog::new());
    let dispatcher = ManualDispatcher::new();
    let mut session = CatalogSession::new(Box::new(dispatcher.clone()), log.clone());

    session.load_part(PartId::new("RES-001-0001")).unwrap();
    session.load_part(PartId::new("IC-001-0001")).unwrap();
    let submitted = dispatcher.submitted();
    assert_eq!(submitted[1].request, Request::GetPart(PartId::new("IC-001-0001")));

    // 後に出した要求の応答が先に届く
    dispatcher.deliver(
        submitted[1].ticket,
        Reply::Part(Ok(Part::new("IC-001-0001", "0001"))),
    );
    dispatcher.deliver(
        submitted[0].ticket,
        Reply::Part(Ok(Part::new("RES-001-0001", "0001"))),
    );
    let events = session.pump();
    assert_eq!(
        events,
        vec![
            SessionEvent::PartLoaded(PartId::new("IC-001-0001")),
            SessionEvent::Discarded(submitted[0].ticket),
        ]
    );
    assert_eq!(
        session.editor().part().unwrap().id().as_str(),
        "IC-001-0001"
    );
    assert_eq!(log.count_kind("stale"), 1);
    assert!(session.is_idle());
}

#[test]
fn test_late_parts_reply_for_previous_category_is_discarded() {
    let (mut session, dispatcher) = manual_session();
    session.select_category(CategoryId::new("RES"));
    session.select_category(CategoryId::new("CAP"));
    let submitted = dispatcher.submitted();

    dispatcher.deliver(
        submitted[1].ticket,
        Reply::Parts(Ok(json!([{ "id": "CAP-001-0001", "name": "100nF" }]))),
    );
    dispatcher.deliver(
        submitted[0].ticket,
        Reply::Parts(Ok(json!([{ "id": "RES-001-0001" }]))),
    );
    session.pump();
    let parts = session.navigator().parts();
    assert_eq!(parts.len(), 1);
    assert_eq!(parts[0].id.as_str(), "CAP-001-0001");
}

#[test]
fn test_threaded_dispatcher_session() {
    let stub = Arc::new(StubCatalog::sample());
    let service: Arc<dyn CatalogService> = stub.clone();
    let mut session =
        CatalogSession::new(Box::new(ThreadedDispatcher::new(service)), Arc::new(NoopLog));
    session.start();
    session.select_category(CategoryId::new("RES"));
    session.load_part(PartId::new("IC-001-0001")).unwrap();
    let events = session.wait_idle();
    assert_eq!(events.len(), 3);
    assert!(events.contains(&SessionEvent::CategoriesLoaded(3)));
    assert!(events.contains(&SessionEvent::PartsLoaded(CategoryId::new("RES"))));
    assert!(events.contains(&SessionEvent::PartLoaded(PartId::new("IC-001-0001"))));
    assert!(session.is_idle());
}
