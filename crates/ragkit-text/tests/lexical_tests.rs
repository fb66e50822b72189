use std::sync::Arc;

use ragkit_core::config::Bm25Config;
use ragkit_core::traits::{Retriever, Tokenizer};
use ragkit_core::Chunk;
use ragkit_text::{AnalyzerTokenizer, Bm25Index, Bm25Ranker, LexicalIndex, MixedScriptTokenizer, TantivyIndex};

fn chunks(texts: &[&str]) -> Vec<Chunk> {
    texts.iter().map(|t| Chunk::new(*t)).collect()
}

#[test]
fn cat_query_prefers_matching_chunk() {
    let ranker = Bm25Ranker::default();
    let corpus = chunks(&["the cat sat", "a dog ran"]);
    let hits = ranker.retrieve("cat", &corpus, 2, None).unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].chunk.content, "the cat sat");
    assert!(hits[0].score > hits[1].score);

    assert!(ranker.retrieve("cat", &corpus, 2, Some(100.0)).unwrap().is_empty());
}

#[test]
fn empty_inputs_return_nothing() {
    let ranker = Bm25Ranker::default();
    assert!(ranker.retrieve("cat", &[], 5, None).unwrap().is_empty());
    assert!(ranker.retrieve("cat", &chunks(&["cat"]), 0, None).unwrap().is_empty());
}

#[test]
fn ties_keep_input_order() {
    let ranker = Bm25Ranker::default();
    let corpus = chunks(&["zebra one", "zebra two", "zebra three"]);
    let hits = ranker.retrieve("zebra", &corpus, 3, None).unwrap();
    let order: Vec<_> = hits.iter().map(|h| h.chunk.content.as_str()).collect();
    assert_eq!(order, vec!["zebra one", "zebra two", "zebra three"]);
}

#[test]
fn min_score_filters_before_truncation() {
    let ranker = Bm25Ranker::default();
    let corpus = chunks(&["apple pie", "banana bread", "apple apple tart", "cherry"]);
    let all = ranker.retrieve("apple", &corpus, 10, None).unwrap();
    let threshold = all[1].score;
    let hits = ranker.retrieve("apple", &corpus, 1, Some(threshold)).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].chunk.content, all[0].chunk.content);
}

#[test]
fn shorter_documents_score_higher_for_same_tf() {
    let ranker = Bm25Ranker::default();
    let corpus = chunks(&["rust is a language with many many extra words here", "rust rocks", "python"]);
    let hits = ranker.retrieve("rust", &corpus, 3, None).unwrap();
    assert_eq!(hits[0].chunk.content, "rust rocks");
}

#[test]
fn index_matches_per_call_ranker() {
    let corpus = chunks(&["the quick brown fox", "lazy dogs sleep", "quick quick fox"]);
    let ranker = Bm25Ranker::default();
    let index = ranker.index(&corpus).unwrap();
    assert_eq!(LexicalIndex::len(&index), 3);
    assert_eq!(index.search("quick fox", 3, None), ranker.retrieve("quick fox", &corpus, 3, None).unwrap());
    assert_eq!(index.term_frequencies(2).unwrap()["quick"], 2);
    assert!(index.term_frequencies(9).is_none());
    assert!(index.idf("quick").unwrap() > 0.0);
}

#[test]
fn invalid_parameters_are_rejected() {
    let bad = Bm25Config { k1: -1.0, ..Bm25Config::default() };
    assert!(Bm25Ranker::new(bad, Arc::new(MixedScriptTokenizer)).is_err());
}

#[test]
fn mixed_script_tokenizer_splits_cjk() {
    let tokens = MixedScriptTokenizer.tokenize("Hello, 世界! Rust2024");
    assert_eq!(tokens, vec!["hello", "世", "界", "rust2024"]);
}

#[test]
fn cjk_queries_match_cjk_chunks() {
    let ranker = Bm25Ranker::default();
    let corpus = chunks(&["今天天气很好", "我喜欢编程"]);
    let hits = ranker.retrieve("编程", &corpus, 2, None).unwrap();
    assert_eq!(hits[0].chunk.content, "我喜欢编程");
}

#[test]
fn analyzer_tokenizer_drops_stop_words() {
    let tokens = AnalyzerTokenizer::default().tokenize("The Cat and the Hat");
    assert_eq!(tokens, vec!["cat", "hat"]);
    let tokens = AnalyzerTokenizer::new(false).tokenize("The Cat");
    assert_eq!(tokens, vec!["the", "cat"]);
}

#[test]
fn tantivy_index_ranks_and_filters() {
    let corpus = chunks(&["the cat sat", "a dog ran", "cat and cat"]);
    let index = TantivyIndex::build(&corpus).unwrap();
    let hits = index.search("cat", 10, None).unwrap();
    assert_eq!(hits.len(), 2);
    assert!(hits.iter().all(|h| h.chunk.content.contains("cat")));
    assert!(hits[0].score >= hits[1].score);
    assert!(index.search("cat", 0, None).unwrap().is_empty());
    assert!(index.search("cat", 10, Some(1000.0)).unwrap().is_empty());
    assert!(index.search("AND (", 10, None).is_ok());
}

#[test]
fn indexes_share_the_trait() {
    let corpus = chunks(&["alpha beta", "gamma"]);
    let indexes: Vec<Box<dyn LexicalIndex>> = vec![
        Box::new(Bm25Index::build(&corpus, &Bm25Config::default(), Arc::new(MixedScriptTokenizer)).unwrap()),
        Box::new(TantivyIndex::build(&corpus).unwrap()),
    ];
    for index in &indexes {
        assert!(!index.is_empty());
        let hits = index.search("gamma", 1, None).unwrap();
        assert_eq!(hits[0].chunk.content, "gamma");
    }
}
