//! End-to-end change-request scenarios over a real sled-backed store.

use std::sync::Arc;

use directory_approval::config::DirectoryConfig;
use directory_approval::diff::DiffField;
use directory_approval::entity::{ContactMethod, Entity, EntityDraft};
use directory_approval::error::GatewayError;
use directory_approval::gateway::{DirectoryStore, PersistenceGateway};
use directory_approval::reference::ReferenceDirectory;
use directory_approval::validation::ValidationFailure;
use directory_approval::workflow::{ApprovalWorkflow, Mode, Submission, WorkflowState};

use sled::open;
use tempfile::tempdir;

// Sled uses file-based locking to prevent concurrent access, so each test
// creates its own database on temp for simplified cleanup.
fn workflow_on(db_name: &str, dir: &tempfile::TempDir) -> ApprovalWorkflow<DirectoryStore> {
    let db = open(dir.path().join(db_name)).expect("open test db");
    let store = DirectoryStore::new(Arc::new(db), ReferenceDirectory::with_defaults());
    ApprovalWorkflow::new(store, DirectoryConfig::default())
}

fn acme_draft() -> EntityDraft {
    EntityDraft::new()
        .set_name("Acme Co-op")
        .set_web_site("acme.coop")
        .set_contact_name("Jo")
        .add_contact_method(ContactMethod::email("jo@acme.coop", true))
        .add_entity_type("Worker Co-op")
}

fn submit_expect_saved(
    workflow: &ApprovalWorkflow<DirectoryStore>,
    ctx: &mut directory_approval::workflow::WorkflowContext,
) -> (Entity, String, bool) {
    match workflow.submit(ctx) {
        Submission::Saved {
            entity,
            confirmation,
            return_to_listing,
        } => (entity, confirmation, return_to_listing),
        other => panic!("expected Saved, got {other:?}"),
    }
}

#[test]
fn create_new_entity() {
    let dir = tempdir().unwrap();
    let workflow = workflow_on("create_new_entity.db", &dir);

    let mut ctx = workflow.open_create();
    assert_eq!(ctx.mode, Mode::Create);
    assert!(ctx.baseline.is_none());
    // seeded from configured defaults
    assert_eq!(ctx.draft.country.as_deref(), Some("US"));
    assert_eq!(ctx.draft.state.as_deref(), Some("IL"));

    ctx.draft = acme_draft()
        .set_country("US")
        .set_state("IL")
        .set_city("Chicago");

    let (entity, confirmation, return_to_listing) = submit_expect_saved(&workflow, &mut ctx);

    assert_eq!(ctx.state, WorkflowState::Succeeded);
    assert!(confirmation.contains("Acme Co-op"));
    assert!(!return_to_listing);

    // create mode never flags changed fields
    assert!(!ctx.diffs.any_changed());

    // the record is durable and the identifier was minted by the store
    let id = entity.id.expect("created entity carries an id");
    assert!(id.starts_with("org_1"));
    let stored = workflow.gateway().fetch_entity(&id).unwrap();
    assert_eq!(stored.name, "Acme Co-op");
    assert!(stored.proposed_changes.is_none());
}

#[test]
fn propose_update_to_existing_entity() {
    let dir = tempdir().unwrap();
    let workflow = workflow_on("propose_update.db", &dir);

    let mut ctx = workflow.open_create();
    ctx.draft = acme_draft()
        .set_name("Old Name")
        .set_city("Chicago")
        .set_state("IL");
    let (created, _, _) = submit_expect_saved(&workflow, &mut ctx);
    let id = created.id.unwrap();

    // submitter opens the record for editing, pre-filled from the baseline
    let mut ctx = workflow.open_update(&id);
    assert_eq!(ctx.mode, Mode::Update);
    assert_eq!(ctx.draft.name.as_deref(), Some("Old Name"));
    assert_eq!(ctx.draft.city.as_deref(), Some("Chicago"));

    ctx.draft.name = Some("New Name".to_string());
    workflow.field_edited(&mut ctx);

    let (returned, _, return_to_listing) = submit_expect_saved(&workflow, &mut ctx);
    assert!(return_to_listing);

    // the diff flags exactly the renamed field
    let name = ctx.diffs.get(DiffField::Name);
    assert!(name.changed);
    assert_eq!(name.baseline.as_deref(), Some("Old Name"));
    assert!(!ctx.diffs.get(DiffField::City).changed);

    // the live record is untouched; the proposal rides alongside it
    assert!(returned.proposed_changes.is_some());
    let stored = workflow.gateway().fetch_entity(&id).unwrap();
    assert_eq!(stored.name, "Old Name");
    let proposed = stored.proposed_changes.expect("pending proposed change");
    assert_eq!(proposed.name.as_deref(), Some("New Name"));
}

#[test]
fn approve_pending_proposal() {
    let dir = tempdir().unwrap();
    let workflow = workflow_on("approve_pending.db", &dir);

    let mut ctx = workflow.open_create();
    ctx.draft = acme_draft().set_name("Old Name").set_city("Chicago").set_state("IL");
    let (created, _, _) = submit_expect_saved(&workflow, &mut ctx);
    let id = created.id.unwrap();

    let mut ctx = workflow.open_update(&id);
    ctx.draft.name = Some("New Name".to_string());
    workflow.field_edited(&mut ctx);
    submit_expect_saved(&workflow, &mut ctx);

    // reviewer opens the approval form: editable values are the proposed
    // ones, previous values ride along for the changed fields
    let mut ctx = workflow.open_approve(&id);
    assert_eq!(ctx.mode, Mode::Approve);
    assert_eq!(ctx.draft.name.as_deref(), Some("New Name"));
    let name = ctx.diffs.get(DiffField::Name);
    assert!(name.changed);
    assert_eq!(name.previous_display.as_deref(), Some("Old Name"));
    assert!(!ctx.diffs.get(DiffField::City).changed);

    let (approved, _, return_to_listing) = submit_expect_saved(&workflow, &mut ctx);
    assert!(!return_to_listing);
    assert_eq!(approved.name, "New Name");
    assert!(approved.proposed_changes.is_none());

    // finalized: live record carries the proposed values, pending change gone
    let stored = workflow.gateway().fetch_entity(&id).unwrap();
    assert_eq!(stored.name, "New Name");
    assert!(stored.proposed_changes.is_none());
}

#[test]
fn second_proposal_replaces_the_first() {
    let dir = tempdir().unwrap();
    let workflow = workflow_on("second_proposal.db", &dir);

    let mut ctx = workflow.open_create();
    ctx.draft = acme_draft();
    let (created, _, _) = submit_expect_saved(&workflow, &mut ctx);
    let id = created.id.unwrap();

    let mut ctx = workflow.open_update(&id);
    ctx.draft.name = Some("First Proposal".to_string());
    submit_expect_saved(&workflow, &mut ctx);

    let mut ctx = workflow.open_update(&id);
    ctx.draft.name = Some("Second Proposal".to_string());
    submit_expect_saved(&workflow, &mut ctx);

    let stored = workflow.gateway().fetch_entity(&id).unwrap();
    let proposed = stored.proposed_changes.unwrap();
    assert_eq!(proposed.name.as_deref(), Some("Second Proposal"));
}

#[test]
fn required_field_gate_blocks_without_network() {
    let dir = tempdir().unwrap();
    let workflow = workflow_on("required_gate.db", &dir);

    let mut ctx = workflow.open_create();
    ctx.draft.entity_types = Vec::new();

    match workflow.submit(&mut ctx) {
        Submission::Blocked => {}
        other => panic!("expected Blocked, got {other:?}"),
    }

    assert_eq!(ctx.state, WorkflowState::Editing);
    assert!(ctx.errors.has_field("entity_types"));
    assert!(ctx.errors.has_field("coop_name"));
    assert!(ctx.errors.has_field("contact"));
}

#[test]
fn editing_a_field_clears_only_its_error() {
    let dir = tempdir().unwrap();
    let workflow = workflow_on("error_clear_scope.db", &dir);

    let mut ctx = workflow.open_create();
    workflow.submit(&mut ctx);
    assert!(ctx.errors.has_field("coop_name"));
    assert!(ctx.errors.has_field("websites"));

    ctx.draft.name = Some("Acme Co-op".to_string());
    workflow.field_edited(&mut ctx);

    assert!(!ctx.errors.has_field("coop_name"));
    assert!(ctx.errors.has_field("websites"));
}

#[test]
fn server_rejection_preserves_entered_values() {
    let dir = tempdir().unwrap();
    let workflow = workflow_on("server_rejection.db", &dir);

    // a state code outside the country's province list passes the client
    // gate but fails store-side validation
    let mut ctx = workflow.open_create();
    ctx.draft = acme_draft().set_state("ZZ").set_country("US");

    match workflow.submit(&mut ctx) {
        Submission::Rejected => {}
        other => panic!("expected Rejected, got {other:?}"),
    }

    assert_eq!(ctx.state, WorkflowState::Rejected);
    assert!(ctx.errors.has_field("state"));
    // entered values survive the rejection
    assert_eq!(ctx.draft.name.as_deref(), Some("Acme Co-op"));
    assert_eq!(ctx.draft.web_site.as_deref(), Some("acme.coop"));

    // the first edit re-enters Editing
    ctx.draft.state = Some("IL".to_string());
    workflow.field_edited(&mut ctx);
    assert_eq!(ctx.state, WorkflowState::Editing);
}

#[test]
fn load_failure_degrades_to_create_like_session() {
    let dir = tempdir().unwrap();
    let workflow = workflow_on("load_failure.db", &dir);

    let ctx = workflow.open_update("org_1does0not0exist");

    assert!(ctx.load_error.is_some());
    assert_eq!(ctx.mode, Mode::Create);
    assert!(ctx.target_id.is_none());
    assert!(ctx.baseline.is_none());
    // a load failure is a banner, never field errors
    assert!(!ctx.errors.has_any());
}

#[test]
fn submit_is_a_noop_outside_editing() {
    let dir = tempdir().unwrap();
    let workflow = workflow_on("reentrant_submit.db", &dir);

    let mut ctx = workflow.open_create();
    ctx.draft = acme_draft();

    ctx.state = WorkflowState::Submitting;
    match workflow.submit(&mut ctx) {
        Submission::NotEditing => {}
        other => panic!("expected NotEditing, got {other:?}"),
    }

    ctx.state = WorkflowState::Editing;
    submit_expect_saved(&workflow, &mut ctx);

    // terminal state: a second submit does nothing
    match workflow.submit(&mut ctx) {
        Submission::NotEditing => {}
        other => panic!("expected NotEditing, got {other:?}"),
    }
}

// A gateway double that rejects every write with a fixed payload, for
// driving the Submitting -> Rejected transition deterministically.
struct RejectingGateway;

impl PersistenceGateway for RejectingGateway {
    fn fetch_entity(&self, id: &str) -> Result<Entity, GatewayError> {
        Err(GatewayError::NotFound(id.to_string()))
    }
    fn create_entity(&self, _draft: &EntityDraft) -> Result<Entity, GatewayError> {
        Err(GatewayError::Rejected(ValidationFailure::field(
            "coop_name",
            "This field is required.",
        )))
    }
    fn propose_change(&self, _id: &str, draft: &EntityDraft) -> Result<Entity, GatewayError> {
        self.create_entity(draft)
    }
    fn finalize_approval(&self, _id: &str, draft: &EntityDraft) -> Result<Entity, GatewayError> {
        self.create_entity(draft)
    }
}

#[test]
fn rejected_submission_surfaces_server_errors() {
    let workflow = ApprovalWorkflow::new(RejectingGateway, DirectoryConfig::default());

    let mut ctx = workflow.open_create();
    ctx.draft = acme_draft();

    match workflow.submit(&mut ctx) {
        Submission::Rejected => {}
        other => panic!("expected Rejected, got {other:?}"),
    }

    assert_eq!(ctx.state, WorkflowState::Rejected);
    assert_eq!(
        ctx.errors.messages_for("coop_name"),
        ["This field is required."]
    );
    // other entered values are retained unchanged
    assert_eq!(ctx.draft.web_site.as_deref(), Some("acme.coop"));
    assert_eq!(ctx.draft.contact_name.as_deref(), Some("Jo"));
    assert_eq!(ctx.draft.entity_types, vec!["Worker Co-op".to_string()]);
}

// A gateway double that must never be reached; proves the required-field
// gate blocks before any network call.
struct UnreachableGateway;

impl PersistenceGateway for UnreachableGateway {
    fn fetch_entity(&self, _id: &str) -> Result<Entity, GatewayError> {
        panic!("gateway must not be called");
    }
    fn create_entity(&self, _draft: &EntityDraft) -> Result<Entity, GatewayError> {
        panic!("gateway must not be called");
    }
    fn propose_change(&self, _id: &str, _draft: &EntityDraft) -> Result<Entity, GatewayError> {
        panic!("gateway must not be called");
    }
    fn finalize_approval(&self, _id: &str, _draft: &EntityDraft) -> Result<Entity, GatewayError> {
        panic!("gateway must not be called");
    }
}

#[test]
fn blocked_submission_never_reaches_the_gateway() {
    let workflow = ApprovalWorkflow::new(UnreachableGateway, DirectoryConfig::default());

    let mut ctx = workflow.open_create();
    match workflow.submit(&mut ctx) {
        Submission::Blocked => {}
        other => panic!("expected Blocked, got {other:?}"),
    }
}
