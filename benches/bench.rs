// Criterion benchmarks for the scoring hot path.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::collections::BTreeMap;

use chrono::Utc;
use emlak_match::core::{score_listing, Matcher};
use emlak_match::models::{
    AttributeBag, AttributeValue, BoundedRange, Category, Listing, ListingStatus, Location,
    LocationFilter, RequestCriteria, ScoringWeights,
};
use uuid::Uuid;

fn create_criteria() -> RequestCriteria {
    RequestCriteria {
        request_id: Uuid::new_v4(),
        category: Category::Residence,
        sub_category: Some("daire".to_string()),
        price_range: BoundedRange::new(Some(400_000.0), Some(600_000.0)),
        area_range: BoundedRange::new(Some(80.0), Some(140.0)),
        currency: "TRY".to_string(),
        location: LocationFilter {
            city: Some("Istanbul".to_string()),
            district: Some("Kadikoy".to_string()),
            neighbourhood: None,
        },
        feature_prefs: BTreeMap::from([
            ("oda_sayisi".to_string(), AttributeValue::Number(3.0)),
            ("havuz_var_mi".to_string(), AttributeValue::Bool(true)),
            ("esyali".to_string(), AttributeValue::Bool(false)),
        ]),
        priority: 5,
    }
}

fn create_listing(i: usize) -> Listing {
    Listing {
        id: Uuid::new_v4(),
        title: format!("Daire {i}"),
        category: Category::Residence,
        sub_category: Some("daire".to_string()),
        status: ListingStatus::Active,
        price: 350_000.0 + (i % 50) as f64 * 10_000.0,
        currency: "TRY".to_string(),
        area: 70.0 + (i % 20) as f64 * 5.0,
        location: Location {
            city: "Istanbul".to_string(),
            district: if i % 3 == 0 { "Kadikoy" } else { "Besiktas" }.to_string(),
            neighbourhood: "Moda".to_string(),
        },
        attributes: AttributeBag::new()
            .with("oda_sayisi", (2 + i % 4) as f64)
            .with("havuz_var_mi", i % 5 == 0),
        created_at: Utc::now(),
    }
}

fn bench_score_listing(c: &mut Criterion) {
    let criteria = create_criteria();
    let listing = create_listing(0);
    let weights = ScoringWeights::default();

    c.bench_function("score_listing", |b| {
        b.iter(|| {
            score_listing(
                black_box(&criteria),
                black_box(&listing),
                black_box(&weights),
                black_box(0.20),
            )
        });
    });
}

fn bench_rank(c: &mut Criterion) {
    let matcher = Matcher::with_default_weights();
    let criteria = create_criteria();

    let mut group = c.benchmark_group("rank");

    for candidate_count in [10, 100, 1000].iter() {
        let candidates: Vec<Listing> = (0..*candidate_count).map(create_listing).collect();

        group.bench_with_input(
            BenchmarkId::from_parameter(candidate_count),
            &candidates,
            |b, candidates| {
                b.iter(|| matcher.rank(black_box(&criteria), black_box(candidates.clone())));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_score_listing, bench_rank);
criterion_main!(benches);
