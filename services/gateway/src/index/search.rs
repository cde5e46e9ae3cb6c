use crate::backend::{MultiMatchQuery, SearchHits};
use crate::error::BackendResult;
use crate::index::IndexManager;
use std::time::Instant;
use tantivy::collector::{Count, TopDocs};
use tantivy::query::{BooleanQuery, EmptyQuery, FuzzyTermQuery, Occur, Query};
use tantivy::schema::{Field, TantivyDocument};
use tantivy::tokenizer::TokenStream;
use tantivy::{Index, Term};

/// Runs a fuzzy multi-field match and returns one page of stored sources.
///
/// `skip` and `take` are clamped against the index size, so pages past the
/// last hit are empty rather than an error.
pub fn search(
    manager: &IndexManager,
    query: &MultiMatchQuery,
    skip: u64,
    take: u64,
) -> BackendResult<SearchHits> {
    let started = Instant::now();
    let searcher = manager.reader().searcher();
    let parsed = parse_query(manager, query)?;

    let num_docs = searcher.num_docs();
    let mut hits = Vec::new();

    let total_hits = if take == 0 || skip >= num_docs {
        searcher.search(parsed.as_ref(), &Count)? as u64
    } else {
        let limit = take.min(num_docs - skip) as usize;
        let top_docs = TopDocs::with_limit(limit).and_offset(skip as usize);
        let (page, count) = searcher.search(parsed.as_ref(), &(top_docs, Count))?;

        for (_score, doc_address) in page {
            let doc: TantivyDocument = searcher.doc(doc_address)?;
            hits.push(manager.schema().to_source(&doc));
        }
        count as u64
    };

    Ok(SearchHits {
        took_millis: started.elapsed().as_millis() as u64,
        total_hits,
        hits,
    })
}

/// A document matches when, in at least one field, the number of query terms
/// matching within the edit distance reaches `minimum_should_match` (capped at
/// the number of terms).
pub fn parse_query(
    manager: &IndexManager,
    query: &MultiMatchQuery,
) -> BackendResult<Box<dyn Query>> {
    let mut field_clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();

    for name in &query.fields {
        let field = manager.schema().text_field(name)?;
        let terms = analyze(manager.index(), field, &query.text)?;
        if terms.is_empty() {
            continue;
        }

        let required = query.minimum_should_match.clamp(1, terms.len());
        field_clauses.push((
            Occur::Should,
            minimum_match_query(field, &terms, required, query.fuzziness),
        ));
    }

    if field_clauses.is_empty() {
        return Ok(Box::new(EmptyQuery {}));
    }
    Ok(Box::new(BooleanQuery::new(field_clauses)))
}

fn analyze(index: &Index, field: Field, text: &str) -> BackendResult<Vec<String>> {
    let mut analyzer = index.tokenizer_for_field(field)?;
    let mut stream = analyzer.token_stream(text);
    let mut terms = Vec::new();
    while stream.advance() {
        terms.push(stream.token().text.clone());
    }
    Ok(terms)
}

fn fuzzy_term(field: Field, term: &str, fuzziness: u8) -> Box<dyn Query> {
    Box::new(FuzzyTermQuery::new(
        Term::from_field_text(field, term),
        fuzziness,
        true,
    ))
}

/// One flat disjunction of fuzzy clauses that needs `required` of them to match.
fn minimum_match_query(
    field: Field,
    terms: &[String],
    required: usize,
    fuzziness: u8,
) -> Box<dyn Query> {
    let clauses: Vec<(Occur, Box<dyn Query>)> = terms
        .iter()
        .map(|term| (Occur::Should, fuzzy_term(field, term, fuzziness)))
        .collect();

    if required <= 1 {
        return Box::new(BooleanQuery::new(clauses));
    }
    Box::new(BooleanQuery::with_minimum_required_clauses(clauses, required))
}
