use career_radar::news::{DeduplicationService, RelevanceFilterService, RssArticle};
use career_radar::streaming::StreamingContentProcessor;
use chrono::{Duration, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

const PLAN: &str = r#"{"overview":{"goals":["Grow revenue","Hire team"],"successCriteria":["Profitability"]},"phases":[{"name":"Discovery","duration":"2w"},{"name":"Build","duration":"8w"}],"tasks":[{"title":"Research"},{"title":"Prototype"},{"title":"Launch"}],"timeline":{"start":"Q1","end":"Q3","milestones":[{"title":"Beta","due":"Q2"}]},"resources":{"team":[{"role":"Engineer","count":3}]},"budget":{"items":[{"label":"Cloud","cost":"2000"}],"total":"2000"},"risks":[{"item":"Delays","likelihood":"low","impact":"medium"}],"kpis":[{"metric":"Signups","target":"1000"}],"next90Days":{"day30":["Interviews"],"day60":["Beta"],"day90":["GA"]}}"#;

fn bench_streaming(c: &mut Criterion) {
    let chunks: Vec<String> = PLAN
        .chars()
        .collect::<Vec<_>>()
        .chunks(24)
        .map(|c| c.iter().collect())
        .collect();

    c.bench_function("process_plan_in_chunks", |b| {
        b.iter(|| {
            let mut processor = StreamingContentProcessor::new();
            for chunk in &chunks {
                black_box(processor.process_chunk(chunk));
            }
        })
    });

    c.bench_function("process_plan_whole", |b| {
        b.iter(|| {
            let mut processor = StreamingContentProcessor::new();
            black_box(processor.process_chunk(black_box(PLAN)))
        })
    });
}

fn bench_curation(c: &mut Criterion) {
    let now = Utc::now();
    let articles: Vec<RssArticle> = (0..200)
        .map(|i| {
            RssArticle::new(
                format!("a{}", i),
                format!("AI automation drives layoffs at company {}", i % 50),
                format!("https://news.test/{}", i % 120),
                now - Duration::hours(i as i64),
            )
            .with_description("Robots and machine learning replace workers in logistics.")
        })
        .collect();

    let dedup = DeduplicationService::default();
    let relevance = RelevanceFilterService::default();

    c.bench_function("dedup_200_articles", |b| {
        b.iter(|| black_box(dedup.deduplicate_articles(articles.clone(), None)))
    });

    c.bench_function("relevance_200_articles", |b| {
        b.iter(|| black_box(relevance.filter_relevant_articles(articles.clone(), None)))
    });
}

criterion_group!(benches, bench_streaming, bench_curation);
criterion_main!(benches);
