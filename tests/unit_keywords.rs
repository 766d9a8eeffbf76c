// Keyword extraction tests — tokenizer → extractor → profile, without a model.
//
// Rankings here use either the deterministic HashEmbedder or a fixed
// table of vectors, so results are reproducible and need no downloads.

use anyhow::Result;
use chrono::NaiveDate;

use themebuzz::corpus::TextRecord;
use themebuzz::error::AnalysisError;
use themebuzz::keywords::embeddings::Embedding;
use themebuzz::keywords::extractor::KeywordExtractor;
use themebuzz::keywords::hashing::HashEmbedder;
use themebuzz::keywords::profile::KeywordMap;
use themebuzz::keywords::tokenizer::NounTokenizer;
use themebuzz::keywords::traits::TextEmbedder;

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn record(entity: &str, title: &str, body: &str) -> TextRecord {
    TextRecord::new(entity, d("2022-03-01"), title, body)
}

/// Documents point along the first axis; listed tokens get a fixed cosine
/// to it, everything else is orthogonal.
struct FixedEmbedder(Vec<(&'static str, f64)>);

impl TextEmbedder for FixedEmbedder {
    fn embed_document(&self, _text: &str) -> Result<Embedding> {
        Ok(Embedding::new(vec![1.0, 0.0]))
    }

    fn embed_token(&self, token: &str) -> Result<Embedding> {
        let score = self
            .0
            .iter()
            .find(|(t, _)| *t == token)
            .map(|&(_, s)| s)
            .unwrap_or(0.0);
        Ok(Embedding::new(vec![score, (1.0 - score * score).sqrt()]))
    }
}

fn kona_corpus() -> Vec<TextRecord> {
    vec![
        record("코나아이", "지역화폐 기본소득", "전자결제 플랫폼 지역화폐"),
        record("코나아이", "기본소득 공약", "지역화폐 전자결제"),
        record("코나아이", "전자결제 확대", "기본소득 반도체"),
        record("안랩", "백신 보안", "보안 백신"),
    ]
}

// ============================================================
// Output size and key provenance
// ============================================================

#[test]
fn output_size_is_min_of_top_k_and_surviving_candidates() {
    let embedder = HashEmbedder::default();
    let records = kona_corpus();

    let tokenizer = NounTokenizer::new();
    let surviving = tokenizer
        .count(
            records
                .iter()
                .filter(|r| r.entity == "코나아이")
                .flat_map(|r| [r.title.as_deref(), r.body.as_deref()]),
        )
        .surviving(2);
    assert_eq!(surviving.len(), 3, "지역화폐, 기본소득, 전자결제");

    for top_k in [1, 2, 3, 10] {
        let extractor = KeywordExtractor::new(&embedder, top_k, 2).unwrap();
        let profile = extractor.extract("코나아이", &records).unwrap();
        assert_eq!(profile.len(), top_k.min(surviving.len()), "top_k={top_k}");
    }
}

#[test]
fn keywords_are_surviving_candidates_with_raw_frequencies() {
    let embedder = HashEmbedder::default();
    let records = kona_corpus();
    let extractor = KeywordExtractor::new(&embedder, 15, 2).unwrap();
    let profile = extractor.extract("코나아이", &records).unwrap();

    assert_eq!(profile.frequency("지역화폐"), Some(3));
    assert_eq!(profile.frequency("기본소득"), Some(3));
    assert_eq!(profile.frequency("전자결제"), Some(3));
    // Seen once: below min_freq.
    assert_eq!(profile.frequency("플랫폼"), None);
    assert_eq!(profile.frequency("반도체"), None);
    // Other entities' text never leaks in.
    assert_eq!(profile.frequency("백신"), None);
}

#[test]
fn ranking_follows_similarity_not_frequency() {
    let embedder = FixedEmbedder(vec![("전자결제", 0.9), ("기본소득", 0.5), ("지역화폐", 0.1)]);
    let extractor = KeywordExtractor::new(&embedder, 2, 2).unwrap();
    let profile = extractor.extract("코나아이", &kona_corpus()).unwrap();

    let keys: Vec<&str> = profile.keywords().collect();
    assert_eq!(keys, vec!["전자결제", "기본소득"]);
}

#[test]
fn extraction_is_idempotent() {
    let embedder = HashEmbedder::default();
    let records = kona_corpus();
    let extractor = KeywordExtractor::new(&embedder, 2, 2).unwrap();

    let first = extractor.extract("코나아이", &records).unwrap();
    let second = extractor.extract("코나아이", &records).unwrap();
    assert_eq!(first, second);
}

// ============================================================
// Empty and degenerate input
// ============================================================

#[test]
fn no_records_gives_empty_profile() {
    let embedder = HashEmbedder::default();
    let extractor = KeywordExtractor::new(&embedder, 15, 2).unwrap();

    let profile = extractor.extract("코나아이", &[]).unwrap();
    assert!(profile.is_empty());
    assert_eq!(profile.entity, "코나아이");
}

#[test]
fn no_frequent_candidate_gives_empty_profile() {
    let embedder = HashEmbedder::default();
    let extractor = KeywordExtractor::new(&embedder, 15, 5).unwrap();

    let profile = extractor.extract("코나아이", &kona_corpus()).unwrap();
    assert!(profile.is_empty());
}

#[test]
fn missing_title_and_body_are_skipped() {
    let embedder = HashEmbedder::default();
    let extractor = KeywordExtractor::new(&embedder, 15, 2).unwrap();
    let records = vec![
        TextRecord {
            entity: "덕성".to_string(),
            date: d("2022-03-01"),
            title: None,
            body: Some("마스크 원단".to_string()),
        },
        TextRecord {
            entity: "덕성".to_string(),
            date: d("2022-03-02"),
            title: Some("마스크".to_string()),
            body: None,
        },
    ];

    let profile = extractor.extract("덕성", &records).unwrap();
    assert_eq!(profile.frequency("마스크"), Some(2));
    assert_eq!(profile.len(), 1);
}

#[test]
fn zero_parameters_are_rejected() {
    let embedder = HashEmbedder::default();
    assert!(matches!(
        KeywordExtractor::new(&embedder, 0, 2),
        Err(AnalysisError::InvalidParameter(_))
    ));
    assert!(matches!(
        KeywordExtractor::new(&embedder, 15, 0),
        Err(AnalysisError::InvalidParameter(_))
    ));
}

// ============================================================
// Batch extraction
// ============================================================

#[test]
fn extract_all_labels_candidate_and_skips_empty_entities() {
    let embedder = HashEmbedder::default();
    let mut records = kona_corpus();
    records.push(record("서연", "일회성", "언급"));

    let extractor = KeywordExtractor::new(&embedder, 15, 2).unwrap();
    let profiles = extractor.extract_all(&records, Some("이재명")).unwrap();

    let entities: Vec<&str> = profiles.iter().map(|p| p.entity.as_str()).collect();
    assert_eq!(entities, vec!["안랩", "코나아이"]);
    assert!(profiles
        .iter()
        .all(|p| p.candidate.as_deref() == Some("이재명")));
}

// ============================================================
// Similarity
// ============================================================

#[test]
fn similarity_is_symmetric_and_bounded() {
    let embedder = HashEmbedder::default();
    let a = embedder.embed_token("지역화폐").unwrap();
    let b = embedder.embed_document("지역화폐 기본소득 전자결제").unwrap();

    let ab = a.similarity(&b);
    let ba = b.similarity(&a);
    assert!((ab - ba).abs() < 1e-12);
    assert!((-1.0..=1.0).contains(&ab));
    assert!((a.similarity(&a) - 1.0).abs() < 1e-9);
}

// ============================================================
// Persisted keyword maps
// ============================================================

#[test]
fn strict_keyword_map_parsing() {
    let map = KeywordMap::from_json("코나아이", r#"{"지역화폐": 12, "코나": 30}"#).unwrap();
    assert_eq!(map.len(), 2);
    assert_eq!(map.entries()[0].keyword, "지역화폐");

    for bad in [
        r#"{"지역화폐": -1}"#,
        r#"{"지역화폐": 1.5}"#,
        r#"{"지역화폐": "12"}"#,
        r#"{"지역화폐": 1, "지역화폐": 2}"#,
        "{'지역화폐': 12}",
    ] {
        let err = KeywordMap::from_json("코나아이", bad).unwrap_err();
        assert!(
            matches!(err, AnalysisError::MalformedProfile { .. }),
            "accepted {bad}"
        );
    }
}
