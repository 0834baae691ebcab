//! Integration tests for the war engine against the in-memory backend.

use std::sync::Arc;
use std::time::Duration;

use warbot_engine::{
    EngineError, RejectionKind, Resolution, RetryPolicy, RoundOutcome, WarConfig, WarDesk,
    WarEvent,
};
use warbot_model::{
    Competitor, EntityRef, Guild, MemberId, ModelError, RoleId, Score, Team, ThreadId,
    TicketStatus, WarTicket,
};
use warbot_ports::{EntityStore, MemoryBackend, TicketStore};

// =========================================================================
// Fixtures
// =========================================================================

const MODERATOR_ROLE: RoleId = RoleId(900);
const STAFF: MemberId = MemberId(1);
const THREAD: ThreadId = ThreadId(77);

/// Ember (guild): leader 10, co-leader 11, roster 10, 12.
/// Rooks (team): leader 20, roster 21, 22.
async fn backend() -> Arc<MemoryBackend> {
    let backend = MemoryBackend::new([MODERATOR_ROLE]);
    backend.permissions.grant_role(STAFF, MODERATOR_ROLE).await;
    backend
        .entities
        .insert(Guild {
            name: "Ember".into(),
            leader: MemberId(10),
            co_leader: Some(MemberId(11)),
            members: vec![MemberId(10), MemberId(12)],
            score: Score::default(),
        })
        .await;
    backend
        .entities
        .insert(Team {
            name: "Rooks".into(),
            leader: MemberId(20),
            members: vec![MemberId(21), MemberId(22)],
            score: Score::default(),
        })
        .await;
    Arc::new(backend)
}

fn fast_config() -> WarConfig {
    WarConfig {
        retry: RetryPolicy {
            attempts: 3,
            backoff_ms: 1,
        },
        ..WarConfig::default()
    }
}

async fn desk_with(config: WarConfig) -> (WarDesk<MemoryBackend>, Arc<MemoryBackend>) {
    let backend = backend().await;
    let desk = WarDesk::new(Arc::clone(&backend), config).unwrap();
    desk.open(THREAD, EntityRef::guild("Ember"), EntityRef::team("Rooks"))
        .await
        .unwrap();
    (desk, backend)
}

async fn desk() -> (WarDesk<MemoryBackend>, Arc<MemoryBackend>) {
    desk_with(fast_config()).await
}

async fn score(backend: &MemoryBackend, entity: &EntityRef) -> Score {
    backend
        .entities
        .get_by_name(&entity.name, entity.kind)
        .await
        .unwrap()
        .unwrap()
        .score()
}

async fn personal(backend: &MemoryBackend, member: u64) -> Score {
    backend
        .profiles
        .peek(MemberId(member))
        .await
        .map(|p| p.personal_score)
        .unwrap_or_default()
}

// =========================================================================
// Acceptance
// =========================================================================

#[tokio::test]
async fn test_enemy_leader_accepts() {
    let (desk, _) = desk().await;
    let ticket = desk.accept(THREAD, MemberId(20)).await.unwrap();
    assert_eq!(ticket.status, TicketStatus::Accepted);
    assert_eq!(ticket.current_round, 1);
}

#[tokio::test]
async fn test_own_leader_cannot_accept() {
    let (desk, backend) = desk().await;
    let err = desk.accept(THREAD, MemberId(11)).await.unwrap_err();
    assert_eq!(err.kind(), RejectionKind::Permission);

    let stored = backend.tickets.get(THREAD).await.unwrap().unwrap();
    assert_eq!(stored.status, TicketStatus::AwaitingAcceptance);
}

#[tokio::test]
async fn test_accept_twice_is_wrong_state() {
    let (desk, _) = desk().await;
    desk.accept(THREAD, STAFF).await.unwrap();
    let err = desk.accept(THREAD, STAFF).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidState { .. }));
}

#[tokio::test]
async fn test_accept_unknown_thread() {
    let (desk, _) = desk().await;
    let err = desk.accept(ThreadId(5), STAFF).await.unwrap_err();
    assert!(matches!(err, EngineError::TicketNotFound(ThreadId(5))));
}

#[tokio::test]
async fn test_open_twice_is_rejected() {
    let (desk, _) = desk().await;
    let err = desk
        .open(THREAD, EntityRef::guild("Ember"), EntityRef::team("Rooks"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::AlreadyOpen(THREAD)));
}

#[tokio::test]
async fn test_same_name_guild_and_team_cannot_war() {
    let backend = backend().await;
    backend
        .entities
        .insert(Guild {
            name: "Rooks".into(),
            leader: MemberId(30),
            co_leader: None,
            members: vec![MemberId(31)],
            score: Score::default(),
        })
        .await;
    let desk = WarDesk::new(Arc::clone(&backend), fast_config()).unwrap();

    let err = desk
        .open(ThreadId(9), EntityRef::guild("Rooks"), EntityRef::team("Rooks"))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Model(ModelError::NameClash(_))));
    assert_eq!(err.kind(), RejectionKind::BadInput);
    assert!(backend.tickets.get(ThreadId(9)).await.unwrap().is_none());
}

#[tokio::test]
async fn test_open_replaces_ticket_left_over_from_resolved_war() {
    let backend = backend().await;
    let desk = WarDesk::new(Arc::clone(&backend), fast_config()).unwrap();

    // A concluded war whose cleanup stopped before the delete.
    let mut leftover = WarTicket::new(
        ThreadId(8),
        EntityRef::guild("Ember"),
        EntityRef::team("Rooks"),
    )
    .unwrap();
    leftover.status = TicketStatus::Concluded;
    backend.tickets.put(leftover).await.unwrap();

    let ticket = desk
        .open(ThreadId(8), EntityRef::team("Rooks"), EntityRef::guild("Ember"))
        .await
        .unwrap();

    assert_eq!(ticket.status, TicketStatus::AwaitingAcceptance);
    assert_eq!(ticket.your_entity, EntityRef::team("Rooks"));
    assert_eq!(ticket.version, 2);
}

#[tokio::test]
async fn test_failed_write_leaves_ticket_untouched_and_is_retryable() {
    let (desk, backend) = desk().await;
    backend.tickets.fail_next_puts(1);

    let err = desk.accept(THREAD, STAFF).await.unwrap_err();
    assert!(err.is_retryable());
    let stored = backend.tickets.get(THREAD).await.unwrap().unwrap();
    assert_eq!(stored.status, TicketStatus::AwaitingAcceptance);

    let ticket = desk.accept(THREAD, STAFF).await.unwrap();
    assert_eq!(ticket.status, TicketStatus::Accepted);
}

// =========================================================================
// Rounds
// =========================================================================

#[tokio::test]
async fn test_best_of_three_full_flow() {
    let (desk, backend) = desk().await;
    let mut events = desk.subscribe();
    desk.accept(THREAD, MemberId(20)).await.unwrap();

    let r1 = desk.report_round(THREAD, STAFF, "ember", 1).await.unwrap();
    assert_eq!(r1.outcome, RoundOutcome::Continue);
    let r2 = desk.report_round(THREAD, STAFF, "Rooks", 2).await.unwrap();
    assert_eq!(r2.outcome, RoundOutcome::Continue);
    let r3 = desk.report_round(THREAD, STAFF, "Ember", 3).await.unwrap();

    assert_eq!(r3.ticket.status, TicketStatus::Concluded);
    match r3.resolution {
        Some(Resolution::Won { winner, score, .. }) => {
            assert_eq!(winner, EntityRef::guild("Ember"));
            assert_eq!(score.to_string(), "Ember 2 - 1 Rooks");
        }
        other => panic!("expected a win, got {other:?}"),
    }

    // Scores: entities once, every member once.
    assert_eq!(score(&backend, &EntityRef::guild("Ember")).await.wins, 1);
    assert_eq!(score(&backend, &EntityRef::team("Rooks")).await.losses, 1);
    for m in [10, 11, 12] {
        assert_eq!(personal(&backend, m).await, Score { wins: 1, losses: 0 });
    }
    for m in [20, 21, 22] {
        assert_eq!(personal(&backend, m).await, Score { wins: 0, losses: 1 });
    }

    // Thread closed, ticket gone.
    let thread = backend.channels.record(THREAD).await;
    assert!(thread.restricted && thread.archived);
    assert!(backend.tickets.get(THREAD).await.unwrap().is_none());

    assert!(matches!(
        events.recv().await.unwrap(),
        WarEvent::ScorePropagated { .. }
    ));
    assert!(matches!(
        events.recv().await.unwrap(),
        WarEvent::TicketResolved { thread_id: THREAD, .. }
    ));
}

#[tokio::test]
async fn test_member_on_both_rosters_gets_one_win_and_one_loss() {
    let (desk, backend) = desk().await;
    // Member 12 also plays for Rooks.
    backend
        .entities
        .insert(Team {
            name: "Rooks".into(),
            leader: MemberId(20),
            members: vec![MemberId(21), MemberId(22), MemberId(12)],
            score: Score::default(),
        })
        .await;

    desk.accept(THREAD, STAFF).await.unwrap();
    desk.report_round(THREAD, STAFF, "Ember", 1).await.unwrap();
    desk.report_round(THREAD, STAFF, "Ember", 2).await.unwrap();

    assert_eq!(personal(&backend, 12).await, Score { wins: 1, losses: 1 });
    assert_eq!(personal(&backend, 10).await, Score { wins: 1, losses: 0 });
    assert_eq!(personal(&backend, 21).await, Score { wins: 0, losses: 1 });
}

#[tokio::test]
async fn test_two_straight_wins_end_after_round_two() {
    let (desk, _) = desk().await;
    desk.accept(THREAD, STAFF).await.unwrap();
    desk.report_round(THREAD, STAFF, "Rooks", 1).await.unwrap();
    let report = desk.report_round(THREAD, STAFF, "Rooks", 2).await.unwrap();
    assert!(matches!(report.outcome, RoundOutcome::MatchWon { .. }));

    let err = desk.report_round(THREAD, STAFF, "Rooks", 3).await.unwrap_err();
    assert!(matches!(err, EngineError::TicketNotFound(_)));
}

#[tokio::test]
async fn test_resubmitting_a_round_is_stale() {
    let (desk, backend) = desk().await;
    desk.accept(THREAD, STAFF).await.unwrap();
    desk.report_round(THREAD, STAFF, "Ember", 1).await.unwrap();

    let err = desk.report_round(THREAD, STAFF, "Ember", 1).await.unwrap_err();
    assert!(matches!(err, EngineError::StaleRound { claimed: 1, current: 2 }));
    let stored = backend.tickets.get(THREAD).await.unwrap().unwrap();
    assert_eq!(stored.round_scores["Ember"], 1);
}

#[tokio::test]
async fn test_concurrent_duplicate_rounds_apply_once() {
    let (desk, backend) = desk().await;
    desk.accept(THREAD, STAFF).await.unwrap();

    let (a, b) = tokio::join!(
        desk.report_round(THREAD, STAFF, "Ember", 1),
        desk.report_round(THREAD, STAFF, "Ember", 1),
    );

    let accepted = [&a, &b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(accepted, 1);
    let rejected = if a.is_ok() { b } else { a };
    assert!(matches!(rejected, Err(EngineError::StaleRound { .. })));

    let stored = backend.tickets.get(THREAD).await.unwrap().unwrap();
    assert_eq!(stored.current_round, 2);
    assert_eq!(stored.round_scores["Ember"], 1);
}

#[tokio::test]
async fn test_leader_cannot_report_rounds() {
    let (desk, _) = desk().await;
    desk.accept(THREAD, STAFF).await.unwrap();
    let err = desk
        .report_round(THREAD, MemberId(20), "Rooks", 1)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), RejectionKind::Permission);
}

#[tokio::test]
async fn test_unknown_winner_is_bad_input() {
    let (desk, _) = desk().await;
    desk.accept(THREAD, STAFF).await.unwrap();
    let err = desk.report_round(THREAD, STAFF, "Ash", 1).await.unwrap_err();
    assert_eq!(err.kind(), RejectionKind::BadInput);
}

#[tokio::test]
async fn test_unresolved_war_changes_no_scores() {
    let config = WarConfig {
        rounds_to_win: 3,
        max_rounds: 4,
        ..fast_config()
    };
    let (desk, backend) = desk_with(config).await;
    desk.accept(THREAD, STAFF).await.unwrap();
    for (round, winner) in [(1, "Ember"), (2, "Rooks"), (3, "Ember")] {
        desk.report_round(THREAD, STAFF, winner, round).await.unwrap();
    }
    let last = desk.report_round(THREAD, STAFF, "Rooks", 4).await.unwrap();

    assert_eq!(last.outcome, RoundOutcome::Unresolved);
    assert!(matches!(last.resolution, Some(Resolution::Unresolved { .. })));
    assert_eq!(score(&backend, &EntityRef::guild("Ember")).await, Score::default());
    assert_eq!(personal(&backend, 10).await, Score::default());
    assert!(backend.tickets.get(THREAD).await.unwrap().is_none());
    assert!(backend.channels.record(THREAD).await.restricted);
}

// =========================================================================
// Dodges
// =========================================================================

#[tokio::test]
async fn test_dodge_before_acceptance() {
    let (desk, backend) = desk().await;
    let report = desk.declare_dodge(THREAD, STAFF, "rooks").await.unwrap();

    assert_eq!(report.ticket.status, TicketStatus::Dodged);
    assert_eq!(report.winner, EntityRef::guild("Ember"));
    assert_eq!(report.loser, EntityRef::team("Rooks"));
    assert_eq!(score(&backend, &EntityRef::guild("Ember")).await.wins, 1);
    assert_eq!(personal(&backend, 21).await.losses, 1);

    let notices = backend.audit.notices().await;
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].dodging, EntityRef::team("Rooks"));
    assert_eq!(notices[0].declared_by, STAFF);
    assert!(backend.tickets.get(THREAD).await.unwrap().is_none());
}

#[tokio::test]
async fn test_leader_cannot_declare_dodge() {
    let (desk, backend) = desk().await;
    let err = desk
        .declare_dodge(THREAD, MemberId(20), "Ember")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Unauthorized { .. }));
    assert!(backend.tickets.get(THREAD).await.unwrap().is_some());
}

#[tokio::test]
async fn test_dodge_on_concluded_ticket_is_invalid_state() {
    let backend = backend().await;
    let desk = WarDesk::new(Arc::clone(&backend), fast_config()).unwrap();

    // A concluded ticket whose cleanup never finished.
    let mut ticket = WarTicket::new(
        ThreadId(8),
        EntityRef::guild("Ember"),
        EntityRef::team("Rooks"),
    )
    .unwrap();
    ticket.status = TicketStatus::Concluded;
    backend.tickets.put(ticket).await.unwrap();

    let err = desk
        .declare_dodge(ThreadId(8), STAFF, "Rooks")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::InvalidState { status: TicketStatus::Concluded, .. }
    ));
}

#[tokio::test]
async fn test_side_effect_failures_do_not_undo_the_result() {
    let (desk, backend) = desk().await;
    backend.audit.set_offline(true);
    backend.channels.set_offline(true);

    let report = desk.declare_dodge(THREAD, STAFF, "Ember").await.unwrap();

    assert_eq!(report.winner, EntityRef::team("Rooks"));
    assert_eq!(score(&backend, &EntityRef::team("Rooks")).await.wins, 1);
    assert!(backend.audit.notices().await.is_empty());
    assert!(backend.tickets.get(THREAD).await.unwrap().is_none());
}

// =========================================================================
// Actors
// =========================================================================

#[tokio::test]
async fn test_resolved_ticket_actor_is_retired() {
    let (desk, _) = desk().await;
    assert_eq!(desk.actor_count().await, 1);
    desk.declare_dodge(THREAD, STAFF, "Ember").await.unwrap();
    assert_eq!(desk.actor_count().await, 0);
}

#[tokio::test(start_paused = true)]
async fn test_idle_actor_stops_and_is_respawned() {
    let config = WarConfig {
        idle_timeout_secs: 5,
        ..fast_config()
    };
    let (desk, _) = desk_with(config).await;
    let first = desk.handle(THREAD).await;

    tokio::time::sleep(Duration::from_secs(6)).await;
    assert!(first.is_closed());

    let ticket = desk.accept(THREAD, STAFF).await.unwrap();
    assert_eq!(ticket.status, TicketStatus::Accepted);
    assert!(!desk.handle(THREAD).await.is_closed());
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let backend = backend().await;
    let config = WarConfig {
        max_rounds: 1,
        ..WarConfig::default()
    };
    assert!(WarDesk::new(backend, config).is_err());
}
