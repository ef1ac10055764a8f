use itertools::Itertools;
use tracing::{debug, info, instrument, warn};

use crate::config::ServiceConfig;
use crate::error::{ListingError, Result};
use crate::model::{Listing, ListingId, ListingUpdate, Requester};
use crate::reconcile::reconcile_winners;
use crate::store::{ListingCommit, ListingStore};
use crate::webhook::WebhookNotifier;

/// The main entry point for sponsor-side listing updates.
///
/// `ListingService` wraps a [`ListingStore`] and runs each update as a
/// read → reconcile → commit sequence, retrying on concurrent edits.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> listing_rewards::Result<()> {
/// use listing_rewards::{ListingService, ListingUpdate, MemoryStore, Requester};
///
/// let service = ListingService::new(MemoryStore::new());
/// let update = ListingUpdate::from_json(r#"{"rewards": {"first": 500}}"#)?;
/// let listing = service
///     .update_listing(&Requester::sponsor("user-1", "sponsor-1"), &"listing-1".into(), update)
///     .await?;
/// println!("{} winners selected", listing.total_winners_selected);
/// # Ok(())
/// # }
/// ```
pub struct ListingService<S> {
    store: S,
    config: ServiceConfig,
    webhook: Option<WebhookNotifier>,
}

impl<S: ListingStore> ListingService<S> {
    /// Create a service with default settings.
    pub fn new(store: S) -> Self {
        Self::with_config(store, ServiceConfig::default())
    }

    pub fn with_config(store: S, config: ServiceConfig) -> Self {
        let webhook = config.webhook_url.as_deref().map(WebhookNotifier::new);
        Self {
            store,
            config,
            webhook,
        }
    }

    /// Replace the webhook built from the config, e.g. to use a custom
    /// [`reqwest::Client`].
    pub fn with_webhook(mut self, webhook: WebhookNotifier) -> Self {
        self.webhook = Some(webhook);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Apply a sponsor's update to a listing.
    ///
    /// Winners on reward tiers the update removes lose their winner status in
    /// the same commit that stores the new fields. On failure nothing changes.
    #[instrument(skip(self, requester, update), fields(user_id = %requester.user_id))]
    pub async fn update_listing(
        &self,
        requester: &Requester,
        listing_id: &ListingId,
        update: ListingUpdate,
    ) -> Result<Listing> {
        update.validate()?;

        let timeout = self.config.request_timeout;
        let listing = tokio::time::timeout(
            timeout,
            self.update_with_retry(requester, listing_id, &update),
        )
        .await
        .map_err(|_| ListingError::Timeout {
            listing_id: listing_id.clone(),
            timeout,
        })??;

        info!(
            version = listing.version,
            total_winners_selected = listing.total_winners_selected,
            "listing updated"
        );

        self.notify(&listing).await;
        Ok(listing)
    }

    async fn update_with_retry(
        &self,
        requester: &Requester,
        listing_id: &ListingId,
        update: &ListingUpdate,
    ) -> Result<Listing> {
        let mut attempt = 1;
        loop {
            match self.try_update(requester, listing_id, update).await {
                Err(err @ ListingError::ConcurrencyConflict { .. })
                    if attempt < self.config.max_update_attempts =>
                {
                    warn!(attempt, %err, "listing changed during update, retrying");
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    async fn try_update(
        &self,
        requester: &Requester,
        listing_id: &ListingId,
        update: &ListingUpdate,
    ) -> Result<Listing> {
        let listing = self
            .store
            .find_listing(listing_id)
            .await?
            .ok_or_else(|| ListingError::NotFound {
                listing_id: listing_id.clone(),
            })?;

        authorize(requester, &listing)?;
        update.validate_against(&listing)?;

        // Omitting rewards keeps the current reward structure.
        let proposed = update.rewards.as_ref().unwrap_or(&listing.rewards);
        let plan = reconcile_winners(&listing.id, listing.total_winners_selected, Some(proposed));

        if plan.clears_anything() {
            info!(
                from = listing.total_winners_selected,
                to = plan.total_winners_selected,
                positions = %plan.positions().join(", "),
                "clearing winners on removed reward tiers"
            );
        } else {
            debug!(
                total_winners_selected = plan.total_winners_selected,
                "no winners to clear"
            );
        }

        self.store
            .commit(ListingCommit {
                listing_id: listing.id.clone(),
                expected_version: listing.version,
                plan,
                update: update.clone(),
            })
            .await
    }

    async fn notify(&self, listing: &Listing) {
        let Some(webhook) = &self.webhook else {
            return;
        };
        match tokio::time::timeout(self.config.request_timeout, webhook.notify(listing)).await {
            Ok(Ok(())) => debug!(url = webhook.url(), "listing webhook delivered"),
            Ok(Err(err)) => warn!(%err, "listing webhook failed"),
            Err(_) => warn!(url = webhook.url(), "listing webhook timed out"),
        }
    }
}

/// The requester must act for the listing's sponsor or its hackathon.
fn authorize(requester: &Requester, listing: &Listing) -> Result<()> {
    let owns_sponsor = requester.current_sponsor_id.as_ref() == Some(&listing.sponsor_id);
    let owns_hackathon = requester.hackathon_id.is_some()
        && requester.hackathon_id.as_ref() == listing.hackathon_id.as_ref();

    if owns_sponsor || owns_hackathon {
        Ok(())
    } else {
        Err(ListingError::Forbidden {
            listing_id: listing.id.clone(),
            user_id: requester.user_id.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use strum::IntoEnumIterator;

    use super::*;
    use crate::model::WinnerPosition::*;
    use crate::model::{
        HackathonId, ListingType, Rewards, Submission, SubmissionId, WinnerPosition,
    };
    use crate::store::MemoryStore;

    fn rewards(count: usize) -> Rewards {
        WinnerPosition::iter()
            .take(count)
            .map(|p| (p, 1000.0 / (p.rank() as f64)))
            .collect()
    }

    fn rewards_update(count: usize) -> ListingUpdate {
        ListingUpdate {
            rewards: Some(rewards(count)),
            ..Default::default()
        }
    }

    fn sponsor() -> Requester {
        Requester::sponsor("user-1", "sponsor-1")
    }

    fn winner(id: &str, position: WinnerPosition) -> (SubmissionId, Option<WinnerPosition>) {
        (SubmissionId::new(id), Some(position))
    }

    fn listing_id() -> ListingId {
        ListingId::new("listing-1")
    }

    /// A listing with `winners` tiers, each occupied by submission `s{rank}`.
    async fn seed(store: &MemoryStore, id: &str, winners: usize) {
        store
            .insert_listing(
                Listing::new(id, "sponsor-1", ListingType::Bounty, "Build an indexer")
                    .with_rewards(rewards(winners)),
            )
            .await;
        for position in WinnerPosition::iter().take(winners) {
            let submission_id = format!("{id}-s{}", position.rank());
            store
                .insert_submission(
                    Submission::new(submission_id.as_str(), id, "talent").winner(position),
                )
                .await;
        }
        store
            .insert_submission(Submission::new(format!("{id}-loser").as_str(), id, "talent"))
            .await;
    }

    async fn seeded_service(winners: usize) -> ListingService<MemoryStore> {
        let store = MemoryStore::new();
        seed(&store, "listing-1", winners).await;
        ListingService::new(store)
    }

    async fn winner_positions<S: ListingStore>(
        service: &ListingService<S>,
        id: &ListingId,
    ) -> Vec<(SubmissionId, Option<WinnerPosition>)> {
        service
            .store()
            .submissions(id)
            .await
            .unwrap()
            .into_iter()
            .filter(|s| s.is_winner)
            .map(|s| (s.id, s.winner_position))
            .collect()
    }

    #[tokio::test]
    async fn test_shrink_five_to_two() {
        let service = seeded_service(5).await;
        let listing = service
            .update_listing(&sponsor(), &listing_id(), rewards_update(2))
            .await
            .unwrap();

        assert_eq!(listing.total_winners_selected, 2);
        assert_eq!(
            winner_positions(&service, &listing_id()).await,
            vec![
                winner("listing-1-s1", First),
                winner("listing-1-s2", Second),
            ]
        );
        let cleared = service.store().submissions(&listing_id()).await.unwrap();
        assert!(cleared[2..5]
            .iter()
            .all(|s| !s.is_winner && s.winner_position.is_none()));
    }

    #[tokio::test]
    async fn test_grow_one_to_three() {
        let service = seeded_service(1).await;
        let listing = service
            .update_listing(&sponsor(), &listing_id(), rewards_update(3))
            .await
            .unwrap();

        assert_eq!(listing.total_winners_selected, 3);
        assert_eq!(
            winner_positions(&service, &listing_id()).await,
            vec![winner("listing-1-s1", First)]
        );
    }

    #[tokio::test]
    async fn test_remove_all_rewards() {
        let service = seeded_service(3).await;
        let listing = service
            .update_listing(&sponsor(), &listing_id(), rewards_update(0))
            .await
            .unwrap();

        assert_eq!(listing.total_winners_selected, 0);
        assert!(listing.rewards.is_empty());
        assert!(winner_positions(&service, &listing_id()).await.is_empty());
    }

    #[tokio::test]
    async fn test_update_without_rewards_keeps_winners() {
        let service = seeded_service(3).await;
        let update = ListingUpdate::from_json(r#"{"title": "Build a faster indexer"}"#).unwrap();
        let listing = service
            .update_listing(&sponsor(), &listing_id(), update)
            .await
            .unwrap();

        assert_eq!(listing.title, "Build a faster indexer");
        assert_eq!(listing.total_winners_selected, 3);
        assert_eq!(winner_positions(&service, &listing_id()).await.len(), 3);
    }

    #[tokio::test]
    async fn test_other_listing_untouched() {
        let service = seeded_service(4).await;
        seed(service.store(), "listing-2", 4).await;

        service
            .update_listing(&sponsor(), &listing_id(), rewards_update(1))
            .await
            .unwrap();

        let other = ListingId::new("listing-2");
        assert_eq!(winner_positions(&service, &other).await.len(), 4);
        assert_eq!(
            service
                .store()
                .find_listing(&other)
                .await
                .unwrap()
                .unwrap()
                .total_winners_selected,
            4
        );
    }

    #[tokio::test]
    async fn test_missing_listing() {
        let service = ListingService::new(MemoryStore::new());
        let err = service
            .update_listing(&sponsor(), &listing_id(), rewards_update(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ListingError::NotFound { listing_id } if listing_id == ListingId::new("listing-1")));
    }

    #[tokio::test]
    async fn test_foreign_sponsor_forbidden() {
        let service = seeded_service(3).await;
        let intruder = Requester::sponsor("user-2", "sponsor-2");
        let err = service
            .update_listing(&intruder, &listing_id(), rewards_update(0))
            .await
            .unwrap_err();

        assert!(matches!(err, ListingError::Forbidden { .. }));
        assert_eq!(winner_positions(&service, &listing_id()).await.len(), 3);
    }

    #[tokio::test]
    async fn test_requester_without_sponsor_forbidden() {
        let service = seeded_service(1).await;
        let nobody = Requester {
            user_id: "user-3".to_owned(),
            current_sponsor_id: None,
            hackathon_id: None,
        };
        assert!(matches!(
            service
                .update_listing(&nobody, &listing_id(), rewards_update(2))
                .await,
            Err(ListingError::Forbidden { .. })
        ));
    }

    #[tokio::test]
    async fn test_hackathon_organiser_allowed() {
        let store = MemoryStore::new();
        let mut listing = Listing::new("track-1", "sponsor-9", ListingType::Hackathon, "Track")
            .with_rewards(rewards(2));
        listing.hackathon_id = Some(HackathonId::new("hack-1"));
        store.insert_listing(listing).await;
        let service = ListingService::new(store);

        let organiser = Requester {
            user_id: "user-4".to_owned(),
            current_sponsor_id: None,
            hackathon_id: Some(HackathonId::new("hack-1")),
        };
        let updated = service
            .update_listing(&organiser, &"track-1".into(), rewards_update(1))
            .await
            .unwrap();
        assert_eq!(updated.total_winners_selected, 1);
    }

    #[tokio::test]
    async fn test_invalid_input_rejected_before_store() {
        let service = seeded_service(3).await;

        let err = service
            .update_listing(&sponsor(), &listing_id(), ListingUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ListingError::InvalidInput(_)));

        let gappy = ListingUpdate::from_json(r#"{"rewards": {"first": 10, "fourth": 1}}"#).unwrap();
        let err = service
            .update_listing(&sponsor(), &listing_id(), gappy)
            .await
            .unwrap_err();
        assert!(matches!(err, ListingError::InvalidInput(_)));

        let listing = service
            .store()
            .find_listing(&listing_id())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(listing.version, 0);
        assert_eq!(listing.total_winners_selected, 3);
    }

    #[tokio::test]
    async fn test_reward_ask_checked_against_stored_listing() {
        let store = MemoryStore::new();
        let mut listing = Listing::new("listing-1", "sponsor-1", ListingType::Project, "Audit");
        listing.max_reward_ask = Some(100.0);
        store.insert_listing(listing).await;
        let service = ListingService::new(store);

        let update = ListingUpdate::from_json(r#"{"minRewardAsk": 900}"#).unwrap();
        let err = service
            .update_listing(&sponsor(), &listing_id(), update)
            .await
            .unwrap_err();
        assert!(matches!(err, ListingError::InvalidInput(_)));

        let stored = service
            .store()
            .find_listing(&listing_id())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.min_reward_ask, None);
        assert_eq!(stored.version, 0);
    }

    /// Lets a rival update commit right before the first commit goes through.
    struct RacingStore {
        inner: MemoryStore,
        rival: Mutex<Option<ListingUpdate>>,
        commits: Mutex<Vec<ListingCommit>>,
    }

    impl ListingStore for RacingStore {
        async fn find_listing(&self, id: &ListingId) -> Result<Option<Listing>> {
            self.inner.find_listing(id).await
        }

        async fn submissions(&self, listing_id: &ListingId) -> Result<Vec<Submission>> {
            self.inner.submissions(listing_id).await
        }

        async fn commit(&self, commit: ListingCommit) -> Result<Listing> {
            let rival = self.rival.lock().unwrap().take();
            if let Some(update) = rival {
                let current = self
                    .inner
                    .find_listing(&commit.listing_id)
                    .await?
                    .unwrap();
                let plan = reconcile_winners(
                    &current.id,
                    current.total_winners_selected,
                    update.rewards.as_ref(),
                );
                self.inner
                    .commit(ListingCommit {
                        listing_id: current.id.clone(),
                        expected_version: current.version,
                        plan,
                        update,
                    })
                    .await?;
            }
            self.commits.lock().unwrap().push(commit.clone());
            self.inner.commit(commit).await
        }
    }

    #[tokio::test]
    async fn test_concurrent_edit_recomputes_plan() {
        let inner = MemoryStore::new();
        seed(&inner, "listing-1", 5).await;
        let service = ListingService::new(RacingStore {
            inner,
            rival: Mutex::new(Some(rewards_update(2))),
            commits: Mutex::new(Vec::new()),
        });

        let listing = service
            .update_listing(&sponsor(), &listing_id(), rewards_update(4))
            .await
            .unwrap();

        let commits = service.store().commits.lock().unwrap().clone();
        assert_eq!(commits.len(), 2);

        // First attempt was planned against five tiers.
        assert_eq!(commits[0].expected_version, 0);
        assert_eq!(commits[0].plan.positions().collect::<Vec<_>>(), vec![Fifth]);

        // Retry saw the rival's two tiers and has nothing left to clear.
        assert_eq!(commits[1].expected_version, 1);
        assert!(!commits[1].plan.clears_anything());

        assert_eq!(listing.version, 2);
        assert_eq!(listing.total_winners_selected, 4);
        assert_eq!(
            winner_positions(&service, &listing_id()).await,
            vec![
                winner("listing-1-s1", First),
                winner("listing-1-s2", Second),
            ]
        );
    }

    /// Reports a conflict or a storage failure on every commit.
    struct FailingStore {
        inner: MemoryStore,
        conflict: bool,
        attempts: AtomicU32,
    }

    impl ListingStore for FailingStore {
        async fn find_listing(&self, id: &ListingId) -> Result<Option<Listing>> {
            self.inner.find_listing(id).await
        }

        async fn submissions(&self, listing_id: &ListingId) -> Result<Vec<Submission>> {
            self.inner.submissions(listing_id).await
        }

        async fn commit(&self, commit: ListingCommit) -> Result<Listing> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            if self.conflict {
                Err(ListingError::ConcurrencyConflict {
                    listing_id: commit.listing_id,
                    expected: commit.expected_version,
                    actual: commit.expected_version + 1,
                })
            } else {
                Err(ListingError::Persistence("connection reset".to_owned()))
            }
        }
    }

    async fn failing_service(conflict: bool) -> ListingService<FailingStore> {
        let inner = MemoryStore::new();
        seed(&inner, "listing-1", 5).await;
        ListingService::with_config(
            FailingStore {
                inner,
                conflict,
                attempts: AtomicU32::new(0),
            },
            ServiceConfig {
                max_update_attempts: 4,
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn test_conflict_retries_are_bounded() {
        let service = failing_service(true).await;
        let err = service
            .update_listing(&sponsor(), &listing_id(), rewards_update(1))
            .await
            .unwrap_err();

        assert!(matches!(err, ListingError::ConcurrencyConflict { .. }));
        assert_eq!(service.store().attempts.load(Ordering::SeqCst), 4);
        assert_eq!(winner_positions(&service, &listing_id()).await.len(), 5);
    }

    #[tokio::test]
    async fn test_persistence_failure_not_retried() {
        let service = failing_service(false).await;
        let err = service
            .update_listing(&sponsor(), &listing_id(), rewards_update(1))
            .await
            .unwrap_err();

        assert!(matches!(err, ListingError::Persistence(_)));
        assert_eq!(service.store().attempts.load(Ordering::SeqCst), 1);
        assert_eq!(winner_positions(&service, &listing_id()).await.len(), 5);
    }

    /// Never answers reads in time.
    struct SlowStore(MemoryStore);

    impl ListingStore for SlowStore {
        async fn find_listing(&self, id: &ListingId) -> Result<Option<Listing>> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            self.0.find_listing(id).await
        }

        async fn submissions(&self, listing_id: &ListingId) -> Result<Vec<Submission>> {
            self.0.submissions(listing_id).await
        }

        async fn commit(&self, commit: ListingCommit) -> Result<Listing> {
            self.0.commit(commit).await
        }
    }

    #[tokio::test]
    async fn test_request_timeout() {
        let store = MemoryStore::new();
        seed(&store, "listing-1", 2).await;
        let service = ListingService::with_config(
            SlowStore(store),
            ServiceConfig {
                request_timeout: Duration::from_millis(20),
                ..Default::default()
            },
        );

        let err = service
            .update_listing(&sponsor(), &listing_id(), rewards_update(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ListingError::Timeout { timeout, .. } if timeout == Duration::from_millis(20)));
    }

    #[tokio::test]
    async fn test_webhook_failure_does_not_fail_update() {
        let store = MemoryStore::new();
        seed(&store, "listing-1", 2).await;
        let service = ListingService::with_config(
            store,
            ServiceConfig {
                webhook_url: Some("http://127.0.0.1:9/hooks/listing".to_owned()),
                ..Default::default()
            },
        );

        let listing = service
            .update_listing(&sponsor(), &listing_id(), rewards_update(1))
            .await
            .unwrap();
        assert_eq!(listing.total_winners_selected, 1);
        assert_eq!(winner_positions(&service, &listing_id()).await.len(), 1);
    }
}
