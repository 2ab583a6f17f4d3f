use files::{FileError, WorkflowStage};

use crate::common::{TEST_SUBMISSION_ID, TestStore, artwork_draft, document_draft};

const STAGE: WorkflowStage = WorkflowStage::InternalReview;
const ROUND: i32 = 1;

#[tokio::test]
async fn assigning_unknown_revision_is_rejected() {
    let t = TestStore::spawn().await;
    let err = t
        .binder
        .assign_revision(123, 4, STAGE, ROUND, TEST_SUBMISSION_ID)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        FileError::InvalidRevision {
            file_id: 123,
            revision: 4
        }
    ));
}

#[tokio::test]
async fn pinned_revisions_come_back_exactly() {
    let t = TestStore::spawn().await;
    let artwork = t.insert(artwork_draft(), "artwork v1").await;
    let unassigned = t.insert(document_draft(), "document v1").await;

    t.binder
        .assign_revision(artwork.file_id.unwrap(), 1, STAGE, ROUND, TEST_SUBMISSION_ID)
        .await
        .unwrap();

    assert!(
        t.binder
            .revisions_by_review_round(TEST_SUBMISSION_ID, None, Some(ROUND))
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        t.binder
            .revisions_by_review_round(TEST_SUBMISSION_ID, Some(STAGE), None)
            .await
            .unwrap()
            .is_none()
    );

    let pinned = t
        .binder
        .revisions_by_review_round(TEST_SUBMISSION_ID, Some(STAGE), Some(ROUND))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(pinned, vec![artwork.clone()]);
    assert!(!pinned.contains(&unassigned));
}

#[tokio::test]
async fn reassigning_replaces_the_pin() {
    let t = TestStore::spawn().await;
    let rev1 = t.insert(artwork_draft(), "v1").await;
    let mut draft = rev1.clone();
    draft.revision = None;
    let rev2 = t.insert(draft, "v2").await;
    let file_id = rev1.file_id.unwrap();

    t.binder
        .assign_revision(file_id, 1, STAGE, ROUND, TEST_SUBMISSION_ID)
        .await
        .unwrap();
    t.binder
        .assign_revision(file_id, 2, STAGE, ROUND, TEST_SUBMISSION_ID)
        .await
        .unwrap();

    let pinned = t
        .binder
        .revisions_by_review_round(TEST_SUBMISSION_ID, Some(STAGE), Some(ROUND))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(pinned, vec![rev2]);
}

#[tokio::test]
async fn newer_revisions_than_the_pin_are_reported() {
    let t = TestStore::spawn().await;
    let rev1 = t.insert(artwork_draft(), "v1").await;
    let file_id = rev1.file_id.unwrap();

    t.binder
        .assign_revision(file_id, 1, STAGE, ROUND, TEST_SUBMISSION_ID)
        .await
        .unwrap();

    // Pinned at the latest revision: nothing new yet.
    let fresh = t
        .binder
        .latest_new_revisions(TEST_SUBMISSION_ID, Some(STAGE), Some(ROUND))
        .await
        .unwrap()
        .unwrap();
    assert!(fresh.is_empty());

    let mut draft = rev1.clone();
    draft.revision = None;
    let rev2 = t.insert(draft, "v2").await;

    let fresh = t
        .binder
        .latest_new_revisions(TEST_SUBMISSION_ID, Some(STAGE), Some(ROUND))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fresh, vec![rev2]);

    assert!(
        t.binder
            .latest_new_revisions(TEST_SUBMISSION_ID, None, Some(ROUND))
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn unpinning_a_round_keeps_the_files() {
    let t = TestStore::spawn().await;
    let artwork = t.insert(artwork_draft(), "v1").await;
    t.binder
        .assign_revision(artwork.file_id.unwrap(), 1, STAGE, ROUND, TEST_SUBMISSION_ID)
        .await
        .unwrap();

    assert_eq!(
        t.binder
            .delete_by_review_round(TEST_SUBMISSION_ID, STAGE, ROUND)
            .await
            .unwrap(),
        1
    );
    assert_eq!(
        t.binder
            .delete_by_review_round(TEST_SUBMISSION_ID, STAGE, ROUND)
            .await
            .unwrap(),
        0
    );

    let pinned = t
        .binder
        .revisions_by_review_round(TEST_SUBMISSION_ID, Some(STAGE), Some(ROUND))
        .await
        .unwrap()
        .unwrap();
    assert!(pinned.is_empty());

    // The revision itself survives the unpin.
    assert!(
        t.store
            .get_revision(artwork.file_id, artwork.revision, None, None)
            .await
            .unwrap()
            .is_some()
    );
}
