// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Publication Manager (C5): subscription admission, periodic polling,
//! on-change throttling, and removal/shutdown.

pub mod sender;

use crate::model::{
    AttributeName, BroadcastName, ParticipantId, SubscriptionException, SubscriptionId, SubscriptionPublication,
    SubscriptionQos, SubscriptionRequest,
};
use sender::{ChangeListener, PublicationSender, RequestCaller, NO_EXPIRY};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex as AsyncMutex;
use tokio::sync::{Notify, Semaphore};

fn now_ms() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as i64
}

/// Clamp an `expiry + uplift` computation so it can never overflow `i64`.
fn clamp_deadline(expiry_ms: i64, uplift_ms: i64) -> i64 {
    let max_safe = i64::MAX - Duration::from_secs(3600).as_millis() as i64;
    expiry_ms.saturating_add(uplift_ms).min(max_safe)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SubscriptionKind {
    Attribute(AttributeName),
    Broadcast(BroadcastName),
    Multicast,
}

struct PublicationRecord {
    subscription_id: SubscriptionId,
    provider_id: ParticipantId,
    kind: SubscriptionKind,
    qos: SubscriptionQos,
    sender: Weak<dyn PublicationSender>,
    caller: Weak<dyn RequestCaller>,
    last_publication_time_ms: AtomicI64,
    cancel: Arc<Notify>,
    removed: Arc<AtomicBool>,
}

impl PublicationRecord {
    fn ttl_ms(&self) -> i64 {
        match self.qos.validity_ms() {
            None => NO_EXPIRY,
            Some(_) if self.kind == SubscriptionKind::Multicast => self.qos.validity_ms().unwrap_or(NO_EXPIRY),
            Some(_) => self.qos.publication_ttl_ms(),
        }
    }
}

struct QueuedSubscription {
    sender: Arc<dyn PublicationSender>,
    kind: SubscriptionKind,
    request: SubscriptionRequest,
}

/// Listener bridging a `RequestCaller`'s on-change push into the manager's
/// min-interval throttle for one subscription.
struct AttributeChangeListener {
    manager: Arc<PublicationManagerInner>,
    subscription_id: SubscriptionId,
}

impl ChangeListener for AttributeChangeListener {
    fn on_change(&self, value: serde_json::Value) {
        let manager = Arc::clone(&self.manager);
        let subscription_id = self.subscription_id.clone();
        tokio::spawn(async move {
            manager.on_change_delivery(&subscription_id, Ok(value)).await;
        });
    }
}

/// Listener bridging a `RequestCaller`'s broadcast push into the manager's
/// min-interval throttle for one subscription.
struct BroadcastChangeListener {
    manager: Arc<PublicationManagerInner>,
    subscription_id: SubscriptionId,
}

impl ChangeListener for BroadcastChangeListener {
    fn on_change(&self, value: serde_json::Value) {
        let manager = Arc::clone(&self.manager);
        let subscription_id = self.subscription_id.clone();
        tokio::spawn(async move {
            manager.on_change_delivery(&subscription_id, Ok(value)).await;
        });
    }
}

struct PublicationManagerInner {
    publications: AsyncMutex<HashMap<SubscriptionId, Arc<PublicationRecord>>>,
    queued: AsyncMutex<HashMap<ParticipantId, Vec<QueuedSubscription>>>,
    current_scheduled_publications: AsyncMutex<HashSet<SubscriptionId>>,
    shutting_down: AtomicBool,
    ttl_uplift_ms: i64,
    /// Bounds how many scheduled tasks (poll ticks, end-of-validity timers,
    /// throttled change deliveries) may run concurrently.
    scheduler_permits: Arc<Semaphore>,
}

/// The publication manager. Cloning shares the same state (`Arc` inside).
#[derive(Clone)]
pub struct PublicationManager {
    inner: Arc<PublicationManagerInner>,
}

impl PublicationManager {
    /// `scheduler_threads` bounds the number of scheduled tasks (periodic
    /// polls, validity timers, throttled on-change deliveries) allowed to
    /// run concurrently; it does not limit admission or delivery that
    /// happens inline.
    pub fn new(ttl_uplift_ms: i64, scheduler_threads: usize) -> Self {
        Self {
            inner: Arc::new(PublicationManagerInner {
                publications: AsyncMutex::new(HashMap::new()),
                queued: AsyncMutex::new(HashMap::new()),
                current_scheduled_publications: AsyncMutex::new(HashSet::new()),
                shutting_down: AtomicBool::new(false),
                ttl_uplift_ms,
                scheduler_permits: Arc::new(Semaphore::new(scheduler_threads.max(1))),
            }),
        }
    }

    pub fn from_config(config: &crate::config::CoreConfig) -> Self {
        Self::new(config.ttl_uplift_ms, config.publication_scheduler_threads)
    }

    pub async fn add_attribute_subscription(
        &self,
        provider_id: ParticipantId,
        request_caller: Option<Arc<dyn RequestCaller>>,
        publication_sender: Arc<dyn PublicationSender>,
        request: SubscriptionRequest,
        attribute_name: AttributeName,
    ) {
        let kind = SubscriptionKind::Attribute(attribute_name);
        match request_caller {
            Some(caller) => {
                self.inner
                    .admit(provider_id, caller, publication_sender, kind, request)
                    .await
            }
            None => self.inner.enqueue(provider_id, publication_sender, kind, request).await,
        }
    }

    pub async fn add_broadcast_subscription(
        &self,
        provider_id: ParticipantId,
        request_caller: Option<Arc<dyn RequestCaller>>,
        publication_sender: Arc<dyn PublicationSender>,
        request: SubscriptionRequest,
        broadcast_name: BroadcastName,
    ) {
        let kind = SubscriptionKind::Broadcast(broadcast_name);
        match request_caller {
            Some(caller) => {
                self.inner
                    .admit(provider_id, caller, publication_sender, kind, request)
                    .await
            }
            None => self.inner.enqueue(provider_id, publication_sender, kind, request).await,
        }
    }

    /// Multicast subscriptions need no request caller: the reply is sent
    /// and no further manager state is kept.
    pub async fn add_multicast_subscription(&self, publication_sender: Arc<dyn PublicationSender>, request: SubscriptionRequest) {
        publication_sender.send_subscription_reply(&request.subscription_id, None).await;
    }

    /// Drains `queuedSubscriptionRequests[providerId]` and admits every
    /// non-expired entry now that a request caller has registered.
    pub async fn restore(&self, provider_id: ParticipantId, request_caller: Arc<dyn RequestCaller>, publication_sender: Arc<dyn PublicationSender>) {
        let queued = {
            let mut queue = self.inner.queued.lock().await;
            queue.remove(&provider_id).unwrap_or_default()
        };
        for entry in queued {
            self.inner
                .admit(
                    provider_id.clone(),
                    Arc::clone(&request_caller),
                    publication_sender_or(entry.sender, &publication_sender),
                    entry.kind,
                    entry.request,
                )
                .await;
        }
    }

    pub async fn stop_publication(&self, subscription_id: &SubscriptionId) {
        self.inner.remove_one(subscription_id).await;
    }

    pub async fn remove_all_subscriptions(&self, provider_id: &ParticipantId) {
        let ids: Vec<SubscriptionId> = {
            let publications = self.inner.publications.lock().await;
            publications
                .values()
                .filter(|r| &r.provider_id == provider_id)
                .map(|r| r.subscription_id.clone())
                .collect()
        };
        for id in ids {
            self.inner.remove_one(&id).await;
        }
        self.inner.queued.lock().await.remove(provider_id);
    }

    /// Stop the scheduler and tear down every live subscription exactly as
    /// for explicit removal. Re-entrant calls are no-ops.
    pub async fn shutdown(&self) {
        if self.inner.shutting_down.swap(true, Ordering::SeqCst) {
            return;
        }
        let ids: Vec<SubscriptionId> = {
            let publications = self.inner.publications.lock().await;
            publications.keys().cloned().collect()
        };
        for id in ids {
            self.inner.remove_one(&id).await;
        }
    }

}

fn publication_sender_or(queued: Arc<dyn PublicationSender>, _fallback: &Arc<dyn PublicationSender>) -> Arc<dyn PublicationSender> {
    queued
}

impl PublicationManagerInner {
    async fn enqueue(self: &Arc<Self>, provider_id: ParticipantId, sender: Arc<dyn PublicationSender>, kind: SubscriptionKind, request: SubscriptionRequest) {
        self.queued
            .lock()
            .await
            .entry(provider_id)
            .or_default()
            .push(QueuedSubscription { sender, kind, request });
    }

    async fn admit(
        self: &Arc<Self>,
        provider_id: ParticipantId,
        request_caller: Arc<dyn RequestCaller>,
        publication_sender: Arc<dyn PublicationSender>,
        kind: SubscriptionKind,
        request: SubscriptionRequest,
    ) {
        let subscription_id = request.subscription_id.clone();
        self.remove_one(&subscription_id).await;

        if let Some(expiry) = request.qos.validity_ms() {
            if expiry < now_ms() + self.ttl_uplift_ms {
                publication_sender
                    .send_subscription_reply(
                        &subscription_id,
                        Some(SubscriptionException::new("publication end is in the past", subscription_id.clone()).message.to_string()),
                    )
                    .await;
                return;
            }
        }

        publication_sender.send_subscription_reply(&subscription_id, None).await;

        let record = Arc::new(PublicationRecord {
            subscription_id: subscription_id.clone(),
            provider_id,
            kind: kind.clone(),
            qos: request.qos.clone(),
            sender: Arc::downgrade(&publication_sender),
            caller: Arc::downgrade(&request_caller),
            last_publication_time_ms: AtomicI64::new(0),
            cancel: Arc::new(Notify::new()),
            removed: Arc::new(AtomicBool::new(false)),
        });

        self.publications.lock().await.insert(subscription_id.clone(), Arc::clone(&record));

        match &kind {
            SubscriptionKind::Attribute(attribute_name) => {
                if request.qos.is_on_change() {
                    let listener = Arc::new(AttributeChangeListener {
                        manager: Arc::clone(self),
                        subscription_id: subscription_id.clone(),
                    });
                    request_caller.register_attribute_listener(attribute_name, listener);
                }
                if request.qos.is_periodic() {
                    self.schedule_poll(Arc::clone(&record), Duration::from_millis(0));
                }
            }
            SubscriptionKind::Broadcast(broadcast_name) => {
                let listener = Arc::new(BroadcastChangeListener {
                    manager: Arc::clone(self),
                    subscription_id: subscription_id.clone(),
                });
                request_caller.register_broadcast_listener(broadcast_name, listener);
            }
            SubscriptionKind::Multicast => {}
        }

        if let Some(expiry) = request.qos.validity_ms() {
            self.schedule_end(Arc::clone(&record), expiry);
        }
    }

    fn schedule_end(self: &Arc<Self>, record: Arc<PublicationRecord>, expiry_ms: i64) {
        let inner = Arc::clone(self);
        let deadline = clamp_deadline(expiry_ms, self.ttl_uplift_ms);
        let delay_ms = (deadline - now_ms()).max(0) as u64;
        let cancel = Arc::clone(&record.cancel);
        let subscription_id = record.subscription_id.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_millis(delay_ms)) => {
                    let _permit = inner.scheduler_permits.acquire().await.unwrap();
                    inner.remove_one(&subscription_id).await;
                }
                _ = cancel.notified() => {}
            }
        });
    }

    fn schedule_poll(self: &Arc<Self>, record: Arc<PublicationRecord>, delay: Duration) {
        let inner = Arc::clone(self);
        let cancel = Arc::clone(&record.cancel);
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    let _permit = inner.scheduler_permits.acquire().await.unwrap();
                    Arc::clone(&inner).poll_once(record).await;
                }
                _ = cancel.notified() => {}
            }
        });
    }

    async fn poll_once(self: Arc<Self>, record: Arc<PublicationRecord>) {
        if record.removed.load(Ordering::SeqCst) {
            return;
        }
        let period_ms = record.qos.min_interval_ms().max(record_period_ms(&record.qos));
        let last = record.last_publication_time_ms.load(Ordering::SeqCst);
        let now = now_ms();
        if last != 0 && now - last < period_ms {
            let remaining = (period_ms - (now - last)).max(0) as u64;
            self.schedule_poll(Arc::clone(&record), Duration::from_millis(remaining));
            return;
        }

        let attribute_name = match &record.kind {
            SubscriptionKind::Attribute(name) => name.clone(),
            _ => return,
        };

        let caller = match record.caller.upgrade() {
            Some(c) => c,
            None => {
                tracing::warn!(subscription_id = %record.subscription_id, "no request interpreter for scheduled poll");
                self.schedule_poll(Arc::clone(&record), Duration::from_millis(period_ms as u64));
                return;
            }
        };

        match caller.get_attribute(&attribute_name).await {
            Ok(value) => self.send_publication(&record, SubscriptionPublication::Response {
                subscription_id: record.subscription_id.clone(),
                value,
            }).await,
            Err(e) => {
                self.send_publication(&record, SubscriptionPublication::Error {
                    subscription_id: record.subscription_id.clone(),
                    error: SubscriptionException::new(e.to_string(), record.subscription_id.clone()),
                }).await
            }
        }

        record.last_publication_time_ms.store(now_ms(), Ordering::SeqCst);
        if still_valid(&record) {
            self.schedule_poll(Arc::clone(&record), Duration::from_millis(period_ms as u64));
        }
    }

    /// On-change delivery for either an attribute or broadcast value:
    /// throttled by `minInterval`, deduped via `currentScheduledPublications`.
    async fn on_change_delivery(self: &Arc<Self>, subscription_id: &SubscriptionId, value: Result<serde_json::Value, String>) {
        let record = {
            let publications = self.publications.lock().await;
            match publications.get(subscription_id) {
                Some(r) => Arc::clone(r),
                None => return,
            }
        };

        let min_interval = record.qos.min_interval_ms();
        let last = record.last_publication_time_ms.load(Ordering::SeqCst);
        let now = now_ms();
        let time_since_last = now - last;

        if min_interval > 0 && last != 0 && time_since_last < min_interval {
            let mut scheduled = self.current_scheduled_publications.lock().await;
            if scheduled.contains(subscription_id) {
                return;
            }
            scheduled.insert(subscription_id.clone());
            drop(scheduled);

            let delay = Duration::from_millis((min_interval - time_since_last).max(0) as u64);
            let inner = Arc::clone(self);
            let record = Arc::clone(&record);
            let subscription_id = subscription_id.clone();
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                let _permit = inner.scheduler_permits.acquire().await.unwrap();
                inner.current_scheduled_publications.lock().await.remove(&subscription_id);
                inner.send_change_now(&record, value).await;
            });
            return;
        }

        self.send_change_now(&record, value).await;
    }

    async fn send_change_now(self: &Arc<Self>, record: &Arc<PublicationRecord>, value: Result<serde_json::Value, String>) {
        let publication = match value {
            Ok(v) => SubscriptionPublication::Response {
                subscription_id: record.subscription_id.clone(),
                value: v,
            },
            Err(e) => SubscriptionPublication::Error {
                subscription_id: record.subscription_id.clone(),
                error: SubscriptionException::new(e, record.subscription_id.clone()),
            },
        };
        self.send_publication(record, publication).await;
        record.last_publication_time_ms.store(now_ms(), Ordering::SeqCst);
    }

    async fn send_publication(&self, record: &Arc<PublicationRecord>, publication: SubscriptionPublication) {
        if let Some(sender) = record.sender.upgrade() {
            sender.send_publication(publication, record.ttl_ms()).await;
        }
    }

    async fn remove_one(&self, subscription_id: &SubscriptionId) {
        let record = self.publications.lock().await.remove(subscription_id);
        if let Some(record) = record {
            record.removed.store(true, Ordering::SeqCst);
            record.cancel.notify_waiters();
            if let (SubscriptionKind::Attribute(name), Some(caller)) = (&record.kind, record.caller.upgrade()) {
                caller.unregister_attribute_listener(name);
            }
            if let (SubscriptionKind::Broadcast(name), Some(caller)) = (&record.kind, record.caller.upgrade()) {
                caller.unregister_broadcast_listener(name);
            }
        }
        self.current_scheduled_publications.lock().await.remove(subscription_id);
    }
}

fn still_valid(record: &PublicationRecord) -> bool {
    match record.qos.validity_ms() {
        None => true,
        Some(expiry) => now_ms() < expiry,
    }
}

fn record_period_ms(qos: &SubscriptionQos) -> i64 {
    match qos {
        SubscriptionQos::Periodic { period_ms, .. } => *period_ms,
        _ => 0,
    }
}
