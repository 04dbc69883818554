use super::common::{actor, at, build_service, draft};
use crate::lifecycle::consent::{CaseWorkerApproval, ConsentError};
use crate::lifecycle::status::StatusKind;
use crate::lifecycle::validation::RejectionReason;

fn approval(justification: &str) -> CaseWorkerApproval {
    CaseWorkerApproval {
        actor: actor(),
        justification: justification.to_string(),
    }
}

#[test]
fn sharing_moves_a_draft_to_pending_signup() {
    let (service, store, consents, _, _) = build_service();
    let record = draft(at(8));
    store.seed(&record);

    let (next, consent) = service
        .share_proposal(&record.id, &actor(), at(9))
        .expect("proposal shares");

    assert_eq!(next.status().kind, StatusKind::PendingSignup);
    assert!(consent.is_pending());
    assert_eq!(consents.all().len(), 1);
}

#[test]
fn repeated_sharing_updates_the_pending_consent_in_place() {
    let (service, store, consents, _, _) = build_service();
    let mut record = draft(at(8));
    store.seed(&record);

    let (next, first) = service
        .share_proposal(&record.id, &actor(), at(9))
        .expect("first share");
    record = next;
    record.background = Some("Updated before the second share.".to_string());
    store.seed(&record);

    let (_, second) = service
        .share_proposal(&record.id, &actor(), at(10))
        .expect("second share");

    assert_eq!(first.id, second.id);
    assert_eq!(consents.all().len(), 1);

    let snapshot_background = second
        .snapshot
        .get("background")
        .and_then(|value| value.as_str())
        .map(str::to_string);
    assert_eq!(
        snapshot_background,
        Some("Updated before the second share.".to_string())
    );
}

#[test]
fn at_most_one_pending_consent_survives_any_number_of_shares() {
    let (service, store, consents, _, _) = build_service();
    let record = draft(at(8));
    store.seed(&record);

    for hour in 9..14 {
        service
            .share_proposal(&record.id, &actor(), at(hour))
            .expect("share succeeds");
    }

    let pending: Vec<_> = consents
        .all()
        .into_iter()
        .filter(|consent| consent.is_pending())
        .collect();
    assert_eq!(pending.len(), 1);
}

#[test]
fn granting_requires_a_justification() {
    let (service, store, _, _, _) = build_service();
    let record = draft(at(8));
    store.seed(&record);

    let error = service
        .grant_on_behalf(&record.id, approval("  "), at(9))
        .expect_err("blank justification is rejected");

    assert!(matches!(
        error,
        crate::lifecycle::service::ServiceError::Consent(ConsentError::Rejected(
            RejectionReason::MissingJustification
        ))
    ));
}

#[test]
fn granting_reuses_the_pending_consent_and_opens_a_decision() {
    let (service, store, consents, decisions, _) = build_service();
    let record = draft(at(8));
    store.seed(&record);

    let (_, pending) = service
        .share_proposal(&record.id, &actor(), at(9))
        .expect("proposal shares");
    let (next, granted) = service
        .grant_on_behalf(&record.id, approval("Person agreed by phone."), at(10))
        .expect("grant succeeds");

    assert_eq!(next.status().kind, StatusKind::AwaitingStart);
    assert_eq!(granted.id, pending.id);
    assert_eq!(granted.granted_at, Some(at(10)));
    assert!(granted.approved_on_behalf.is_some());
    assert!(consents.all().iter().all(|consent| !consent.is_pending()));

    let open_decisions = decisions.all();
    assert_eq!(open_decisions.len(), 1);
    assert_eq!(open_decisions[0].decided_at, None);
    assert!(open_decisions[0].decided_by_case_worker);
}

#[test]
fn finalizing_stamps_the_undecided_decision() {
    let (service, store, _, decisions, _) = build_service();
    let record = draft(at(8));
    store.seed(&record);

    service
        .share_proposal(&record.id, &actor(), at(9))
        .expect("proposal shares");
    service
        .grant_on_behalf(&record.id, approval("Person agreed by phone."), at(10))
        .expect("grant succeeds");

    let decision = service
        .finalize_decision(&record.id, actor(), at(11))
        .expect("decision finalizes");

    assert_eq!(decision.decided_at, Some(at(11)));
    assert_eq!(decisions.all().len(), 1);
    assert!(decisions
        .all()
        .iter()
        .all(|row| row.decided_at.is_some()));

    let error = service
        .finalize_decision(&record.id, actor(), at(12))
        .expect_err("nothing left to decide");
    assert!(matches!(
        error,
        crate::lifecycle::service::ServiceError::Consent(ConsentError::NothingToDecide)
    ));
}

#[test]
fn withdrawing_an_unanswered_proposal_cancels_the_signup() {
    let (service, store, consents, _, _) = build_service();
    let record = draft(at(8));
    store.seed(&record);

    service
        .share_proposal(&record.id, &actor(), at(9))
        .expect("proposal shares");
    let withdrawn = service
        .withdraw(&record.id, &actor(), at(10))
        .expect("withdraw path runs");

    assert!(withdrawn);
    let stored = service.get(&record.id).expect("record remains");
    assert_eq!(stored.status().kind, StatusKind::CancelledSignup);
    assert!(consents.all().iter().all(|consent| !consent.is_pending()));
}

#[test]
fn withdrawing_past_the_proposal_point_reports_nothing_to_do() {
    let (service, store, _, _, _) = build_service();
    let record = draft(at(8));
    store.seed(&record);

    service
        .share_proposal(&record.id, &actor(), at(9))
        .expect("proposal shares");
    service
        .grant_on_behalf(&record.id, approval("Person agreed by phone."), at(10))
        .expect("grant succeeds");

    let withdrawn = service
        .withdraw(&record.id, &actor(), at(11))
        .expect("withdraw path runs");
    assert!(!withdrawn);

    let stored = service.get(&record.id).expect("record remains");
    assert_eq!(stored.status().kind, StatusKind::AwaitingStart);
}
