//! Score propagation: writes a decided war into entity and profile records.
//!
//! A decided war touches up to four groups of records:
//!
//! 1. the winning entity's aggregate score (`wins += 1`)
//! 2. the losing entity's aggregate score (`losses += 1`)
//! 3. every member of the winner (`personal wins += 1`)
//! 4. every member of the loser (`personal losses += 1`)
//!
//! There is no transaction spanning them. Each write is retried on its own
//! and a failure is logged without stopping the others. Writes run
//! concurrently, except that a member on both sides gets a single write
//! carrying both results: two concurrent read-modify-write cycles on one
//! profile would lose one of them.

use std::collections::{BTreeMap, BTreeSet};

use futures_util::future::{join, join_all};
use tokio::sync::Mutex;
use warbot_model::{Competitor, Entity, EntityRef, MemberId, WarResult};
use warbot_ports::{Backend, EntityStore, ProfileStore};

use crate::RetryPolicy;
use crate::retry::with_retry;

/// What a propagation run managed to write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropagationReport {
    pub winner_recorded: bool,
    pub loser_recorded: bool,
    pub profiles_updated: usize,
    pub profiles_failed: Vec<MemberId>,
}

/// Applies war results to entity and profile stores.
#[derive(Debug)]
pub struct ScorePropagator {
    retry: RetryPolicy,
    /// Serializes propagation runs so two wars sharing an entity or member
    /// can't interleave their read-modify-write cycles.
    ledger: Mutex<()>,
}

impl ScorePropagator {
    pub fn new(retry: RetryPolicy) -> Self {
        Self {
            retry,
            ledger: Mutex::new(()),
        }
    }

    /// Records a win for `winner` and a loss for `loser`, on the entities
    /// and on every de-duplicated member of each.
    ///
    /// Missing entities are skipped with a warning. Never fails: the
    /// report says what was written.
    pub async fn propagate<B: Backend>(
        &self,
        backend: &B,
        winner: &EntityRef,
        loser: &EntityRef,
    ) -> PropagationReport {
        let _ledger = self.ledger.lock().await;

        let (winner_entity, loser_entity) =
            join(self.load(backend, winner), self.load(backend, loser)).await;

        let winner_members = member_set(winner_entity.as_ref());
        let loser_members = member_set(loser_entity.as_ref());

        let profile_writes = results_by_member(&winner_members, &loser_members)
            .into_iter()
            .map(|(member, results)| self.record_profile(backend, member, results));

        let ((winner_recorded, loser_recorded), profile_results) = join(
            join(
                self.record_entity(backend, winner_entity, WarResult::Win),
                self.record_entity(backend, loser_entity, WarResult::Loss),
            ),
            join_all(profile_writes),
        )
        .await;

        let mut report = PropagationReport {
            winner_recorded,
            loser_recorded,
            ..PropagationReport::default()
        };
        for (member, ok) in profile_results {
            if ok {
                report.profiles_updated += 1;
            } else {
                report.profiles_failed.push(member);
            }
        }

        tracing::info!(
            winner = %winner,
            loser = %loser,
            profiles = report.profiles_updated,
            failed = report.profiles_failed.len(),
            "scores propagated"
        );
        report
    }

    async fn load<B: Backend>(&self, backend: &B, entity: &EntityRef) -> Option<Entity> {
        let entities = backend.entities();
        let loaded = with_retry(&self.retry, "entity load", || {
            entities.get_by_name(&entity.name, entity.kind)
        })
        .await;
        match loaded {
            Ok(Some(found)) => Some(found),
            Ok(None) => {
                tracing::warn!(%entity, "entity not found, skipping its score update");
                None
            }
            Err(e) => {
                tracing::warn!(%entity, error = %e, "entity load failed, skipping its score update");
                None
            }
        }
    }

    /// Adds the result once, then retries saving that same snapshot.
    async fn record_entity<B: Backend>(
        &self,
        backend: &B,
        entity: Option<Entity>,
        result: WarResult,
    ) -> bool {
        let Some(mut entity) = entity else {
            return false;
        };
        entity.add_score(result);

        let entities = backend.entities();
        let saved = with_retry(&self.retry, "entity save", || entities.save(entity.clone())).await;
        if let Err(e) = &saved {
            tracing::warn!(entity = %entity.entity_ref(), error = %e, "entity score write failed");
        }
        saved.is_ok()
    }

    /// Applies all of `member`'s results in one read-modify-write. Re-reads
    /// the profile on every attempt; a failed save never landed.
    async fn record_profile<B: Backend>(
        &self,
        backend: &B,
        member: MemberId,
        results: Vec<WarResult>,
    ) -> (MemberId, bool) {
        let profiles = backend.profiles();
        let results = &results;
        let saved = with_retry(&self.retry, "profile save", move || async move {
            let mut profile = profiles.get_or_create(member).await?;
            for result in results {
                profile.personal_score.record(*result);
            }
            profiles.save(profile).await
        })
        .await;
        if let Err(e) = &saved {
            tracing::warn!(%member, error = %e, "profile score write failed");
        }
        (member, saved.is_ok())
    }
}

fn member_set(entity: Option<&Entity>) -> BTreeSet<MemberId> {
    entity.map(|e| e.members()).unwrap_or_default()
}

/// One entry per member: a win for each winner-side membership, a loss for
/// each loser-side one.
fn results_by_member(
    winners: &BTreeSet<MemberId>,
    losers: &BTreeSet<MemberId>,
) -> BTreeMap<MemberId, Vec<WarResult>> {
    let mut results: BTreeMap<MemberId, Vec<WarResult>> = BTreeMap::new();
    for member in winners {
        results.entry(*member).or_default().push(WarResult::Win);
    }
    for member in losers {
        results.entry(*member).or_default().push(WarResult::Loss);
    }
    results
}
