// End-to-end tests of the matching pipeline over the in-memory store.

use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use uuid::Uuid;

use emlak_match::core::Matcher;
use emlak_match::models::{
    AttributeBag, Category, Listing, ListingStatus, Location, LocationFilter, MatchStatus,
    PropertyRequest, RequestStatus,
};
use emlak_match::services::{
    EngineError, EngineOptions, InProcessQueue, JobQueue, MatchEngine, MatchRepository, MatchStore,
    MemoryStore, RequestRepository, ScoringWorker,
};

const THRESHOLD: f64 = 0.35;

fn engine(store: &Arc<MemoryStore>) -> Arc<MatchEngine<MemoryStore, MemoryStore, MemoryStore>> {
    Arc::new(MatchEngine::new(
        Arc::clone(store),
        Arc::clone(store),
        MatchStore::new(Arc::clone(store), THRESHOLD),
        Matcher::with_default_weights(),
        EngineOptions::default(),
    ))
}

fn request(status: RequestStatus) -> PropertyRequest {
    PropertyRequest {
        id: Uuid::new_v4(),
        customer_id: Uuid::new_v4(),
        status,
        category: Category::Residence,
        sub_category: None,
        min_price: Some(400_000.0),
        max_price: Some(600_000.0),
        currency: "TRY".to_string(),
        min_area: Some(80.0),
        max_area: Some(140.0),
        location: LocationFilter {
            city: Some("Istanbul".to_string()),
            district: None,
            neighbourhood: None,
        },
        features: AttributeBag::new(),
        priority: 5,
        created_at: Utc::now(),
        last_activity_at: Utc::now(),
        last_matched_at: None,
    }
}

fn listing(price: f64, area: f64) -> Listing {
    Listing {
        id: Uuid::new_v4(),
        title: format!("Daire {price}"),
        category: Category::Residence,
        sub_category: Some("daire".to_string()),
        status: ListingStatus::Active,
        price,
        currency: "TRY".to_string(),
        area,
        location: Location {
            city: "Istanbul".to_string(),
            district: "Kadikoy".to_string(),
            neighbourhood: "Moda".to_string(),
        },
        attributes: AttributeBag::new(),
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn single_request_ranks_and_persists() {
    let store = Arc::new(MemoryStore::new());
    let engine = engine(&store);

    let req = request(RequestStatus::Active);
    store.put_request(req.clone()).await;

    let good = listing(500_000.0, 120.0);
    let partial = listing(700_000.0, 120.0);
    let hopeless = listing(5_000_000.0, 500.0);
    for l in [good.clone(), partial.clone(), hopeless.clone()] {
        store.put_listing(l).await;
    }

    let ranked = engine.score_request(req.id, true).await.unwrap();

    assert_eq!(ranked.total_candidates, 3);
    assert_eq!(ranked.ranked.len(), 3);
    assert_eq!(ranked.ranked[0].listing_id, good.id);
    assert!(ranked.ranked[0].score() > ranked.ranked[1].score());
    assert!(ranked.ranked[1].score() >= ranked.ranked[2].score());

    // Only pairs at or above the threshold were written.
    let persisted = store.find_all().await.unwrap();
    assert_eq!(persisted.len(), ranked.persisted);
    assert!(persisted.iter().all(|m| m.score >= THRESHOLD));
    assert!(persisted.iter().all(|m| m.status == MatchStatus::Yeni && m.active));

    // The pass stamped the request for the auto-check cooldown.
    let stamped = store.find(req.id).await.unwrap().unwrap();
    assert!(stamped.last_matched_at.is_some());
}

#[tokio::test]
async fn unknown_and_inactive_requests_are_caller_errors() {
    let store = Arc::new(MemoryStore::new());
    let engine = engine(&store);

    let missing = Uuid::new_v4();
    assert!(matches!(
        engine.score_request(missing, true).await,
        Err(EngineError::RequestNotFound(id)) if id == missing
    ));

    let paused = request(RequestStatus::Paused);
    store.put_request(paused.clone()).await;
    assert!(matches!(
        engine.score_request(paused.id, true).await,
        Err(EngineError::RequestNotActive(id)) if id == paused.id
    ));
}

#[tokio::test]
async fn rescoring_is_idempotent() {
    let store = Arc::new(MemoryStore::new());
    let engine = engine(&store);

    store.put_request(request(RequestStatus::Active)).await;
    store.put_request(request(RequestStatus::Active)).await;
    store.put_listing(listing(450_000.0, 100.0)).await;
    store.put_listing(listing(550_000.0, 130.0)).await;

    engine.score_all_active(None).await.unwrap();
    let mut first = store.find_all().await.unwrap();
    first.sort_by_key(|m| m.pair());

    engine.score_all_active(None).await.unwrap();
    let mut second = store.find_all().await.unwrap();
    second.sort_by_key(|m| m.pair());

    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(a.pair(), b.pair());
        assert_eq!(a.score, b.score);
        assert_eq!(a.status, b.status);
        assert_eq!(a.created_at, b.created_at);
    }
}

#[tokio::test]
async fn batch_isolates_poisoned_request() {
    let store = Arc::new(MemoryStore::new());
    let engine = engine(&store);

    let mut poisoned_id = None;
    for i in 0..10 {
        let mut req = request(RequestStatus::Active);
        if i == 3 {
            // Inverted area range: normalization must fail for this one only.
            req.min_area = Some(200.0);
            req.max_area = Some(100.0);
            poisoned_id = Some(req.id);
        }
        store.put_request(req).await;
    }
    store.put_listing(listing(500_000.0, 120.0)).await;

    let summary = engine.score_all_active(None).await.unwrap();

    assert_eq!(summary.processed, 10);
    assert_eq!(summary.succeeded(), 9);
    assert_eq!(summary.failed(), 1);

    let failed: Vec<_> = summary.outcomes.iter().filter(|o| o.error.is_some()).collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(Some(failed[0].request_id), poisoned_id);
    assert!(failed[0].error.as_deref().unwrap().contains("range"));
}

#[tokio::test]
async fn batch_reports_progress() {
    let store = Arc::new(MemoryStore::new());
    let engine = engine(&store);

    for _ in 0..3 {
        store.put_request(request(RequestStatus::Active)).await;
    }

    let events: Mutex<Vec<(usize, usize)>> = Mutex::new(Vec::new());
    let sink = |processed: usize, total: usize| {
        events.lock().unwrap().push((processed, total));
    };

    engine.score_all_active(Some(&sink)).await.unwrap();

    assert_eq!(*events.lock().unwrap(), vec![(1, 3), (2, 3), (3, 3)]);
}

#[tokio::test]
async fn human_decision_survives_rescore() {
    let store = Arc::new(MemoryStore::new());
    let engine = engine(&store);

    let req = request(RequestStatus::Active);
    let lst = listing(500_000.0, 120.0);
    store.put_request(req.clone()).await;
    store.put_listing(lst.clone()).await;

    engine.score_request(req.id, true).await.unwrap();

    let mut record = store.find_pair(req.id, lst.id).await.unwrap().unwrap();
    record.status = MatchStatus::Sunuldu;
    store.update(record).await.unwrap();

    engine.score_request(req.id, true).await.unwrap();

    let record = store.find_pair(req.id, lst.id).await.unwrap().unwrap();
    assert_eq!(record.status, MatchStatus::Sunuldu);
    assert!(record.active);
}

#[tokio::test]
async fn catalog_shrink_deactivates_matches() {
    let store = Arc::new(MemoryStore::new());
    let engine = engine(&store);

    let req = request(RequestStatus::Active);
    let mut lst = listing(500_000.0, 120.0);
    store.put_request(req.clone()).await;
    store.put_listing(lst.clone()).await;

    engine.score_request(req.id, true).await.unwrap();
    assert!(store.find_pair(req.id, lst.id).await.unwrap().unwrap().active);

    // The listing sells; the pair is no longer feasible.
    lst.status = ListingStatus::Sold;
    store.put_listing(lst.clone()).await;

    engine.score_request(req.id, true).await.unwrap();

    let record = store.find_pair(req.id, lst.id).await.unwrap().unwrap();
    assert!(!record.active, "sold listing should deactivate the match");
    assert_eq!(record.status, MatchStatus::Yeni);
}

#[tokio::test]
async fn auto_check_selects_only_stale_requests() {
    let store = Arc::new(MemoryStore::new());
    let engine = engine(&store);

    let mut fresh = request(RequestStatus::Active);
    fresh.last_matched_at = Some(Utc::now() - Duration::days(1));
    fresh.last_activity_at = Utc::now();

    let mut cooled = request(RequestStatus::Active);
    cooled.last_matched_at = Some(Utc::now() - Duration::days(10));
    cooled.last_activity_at = Utc::now();

    let never_scored = request(RequestStatus::Active);

    let mut idle = request(RequestStatus::Active);
    idle.last_matched_at = Some(Utc::now() - Duration::days(1));
    idle.last_activity_at = Utc::now() - Duration::hours(48);

    let paused = request(RequestStatus::Paused);

    for req in [&fresh, &cooled, &never_scored, &idle, &paused] {
        store.put_request(req.clone()).await;
    }

    let (queue, mut rx) = InProcessQueue::new();
    let summary = engine.auto_check(&queue).await.unwrap();
    drop(queue);

    assert_eq!(summary.scanned, 4);
    assert_eq!(summary.enqueued.len(), 3);
    assert!(!summary.enqueued.contains(&fresh.id));
    assert!(summary.enqueued.contains(&cooled.id));
    assert!(summary.enqueued.contains(&never_scored.id));
    assert!(summary.enqueued.contains(&idle.id));

    let mut received = Vec::new();
    while let Some(id) = rx.recv().await {
        received.push(id);
    }
    assert_eq!(received, summary.enqueued);
}

#[tokio::test]
async fn worker_drains_queue_and_persists() {
    let store = Arc::new(MemoryStore::new());
    let engine = engine(&store);

    let req = request(RequestStatus::Active);
    store.put_request(req.clone()).await;
    store.put_listing(listing(500_000.0, 120.0)).await;

    let (queue, rx) = InProcessQueue::new();
    queue.enqueue(req.id).await.unwrap();
    // A bad id must not stall the worker.
    queue.enqueue(Uuid::new_v4()).await.unwrap();
    drop(queue);

    let processed = ScoringWorker::new(Arc::clone(&engine), rx).run().await;

    assert_eq!(processed, 2);
    assert_eq!(store.find_for_request(req.id).await.unwrap().len(), 1);
}
