#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    use crate::backend::MultiMatchQuery;
    use crate::index::batch::batch_add_documents;
    use crate::index::manager::IndexManager;
    use crate::index::search::search;
    use crate::model::Document;

    fn create_test_manager() -> IndexManager {
        IndexManager::create_in_ram().unwrap()
    }

    fn document(id: &str, title: &str, content: &str) -> Document {
        Document {
            id: id.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    fn query(text: &str, minimum_should_match: usize) -> MultiMatchQuery {
        MultiMatchQuery {
            text: text.to_string(),
            fields: vec!["title".to_string(), "content".to_string()],
            fuzziness: 2,
            minimum_should_match,
        }
    }

    #[test]
    fn test_batch_is_visible_after_commit() {
        let manager = create_test_manager();
        assert_eq!(manager.reader().searcher().num_docs(), 0);

        let docs = vec![
            document("1", "Alpha Report", "quarterly results"),
            document("2", "Beta Memo", "hiring plan"),
        ];
        let added = batch_add_documents(&manager, &docs).unwrap();

        assert_eq!(added, 2);
        assert_eq!(manager.reader().searcher().num_docs(), 2);
    }

    #[test]
    fn test_empty_batch_commits_nothing() {
        let manager = create_test_manager();
        assert_eq!(batch_add_documents(&manager, &[]).unwrap(), 0);
        assert_eq!(manager.reader().searcher().num_docs(), 0);
    }

    #[test]
    fn test_stored_source_keeps_every_field() {
        let manager = create_test_manager();
        batch_add_documents(&manager, &[document("abc", "Alpha Report", "quarterly results")])
            .unwrap();

        let hits = search(&manager, &query("alpha", 2), 0, 10).unwrap();
        assert_eq!(hits.total_hits, 1);
        assert_eq!(hits.hits[0]["id"], "abc");
        assert_eq!(hits.hits[0]["title"], "Alpha Report");
        assert_eq!(hits.hits[0]["content"], "quarterly results");
        assert_eq!(hits.hits[0]["created_at"], "2024-03-01T12:00:00Z");
    }

    #[test]
    fn test_fuzzy_match_within_two_edits() {
        let manager = create_test_manager();
        batch_add_documents(&manager, &[document("1", "Elasticsearch", "")]).unwrap();

        assert_eq!(search(&manager, &query("elasticsaerch", 2), 0, 10).unwrap().total_hits, 1);
        assert_eq!(search(&manager, &query("elastcsearh", 2), 0, 10).unwrap().total_hits, 1);
        assert_eq!(search(&manager, &query("plasticsxarcx", 2), 0, 10).unwrap().total_hits, 0);
    }

    #[test]
    fn test_minimum_should_match_within_a_field() {
        let manager = create_test_manager();
        batch_add_documents(
            &manager,
            &[
                document("both", "red apple", "fruit"),
                document("split", "red", "apple"),
                document("one", "red", "vegetable"),
            ],
        )
        .unwrap();

        let hits = search(&manager, &query("red apple", 2), 0, 10).unwrap();
        assert_eq!(hits.total_hits, 1);
        assert_eq!(hits.hits[0]["id"], "both");

        let loose = search(&manager, &query("red apple", 1), 0, 10).unwrap();
        assert_eq!(loose.total_hits, 3);
    }

    #[test]
    fn test_two_of_many_terms_is_enough() {
        let manager = create_test_manager();
        batch_add_documents(
            &manager,
            &[
                document("two", "red apple pie", ""),
                document("one", "red wagon", ""),
            ],
        )
        .unwrap();

        let hits = search(&manager, &query("apple red harvest moon", 2), 0, 10).unwrap();
        assert_eq!(hits.total_hits, 1);
        assert_eq!(hits.hits[0]["id"], "two");
    }

    #[test]
    fn test_long_query_completes() {
        let manager = create_test_manager();
        batch_add_documents(
            &manager,
            &[
                document("1", "Alpha Report", "quarterly results"),
                document("2", "Zebra", "stripes"),
            ],
        )
        .unwrap();

        let mut words: Vec<String> = (0..400).map(|i| format!("w{}x{}", i, i * 7)).collect();
        words.push("alpha".to_string());
        words.push("report".to_string());
        let text = words.join(" ");
        assert!(text.len() > 2_000);

        let hits = search(&manager, &query(&text, 2), 0, 10).unwrap();
        assert_eq!(hits.total_hits, 1);
        assert_eq!(hits.hits[0]["id"], "1");
    }

    #[test]
    fn test_single_term_is_not_held_to_two_matches() {
        let manager = create_test_manager();
        batch_add_documents(&manager, &[document("1", "Zebra", "stripes")]).unwrap();

        assert_eq!(search(&manager, &query("zebra", 2), 0, 10).unwrap().total_hits, 1);
    }

    #[test]
    fn test_blank_text_matches_nothing() {
        let manager = create_test_manager();
        batch_add_documents(&manager, &[document("1", "Zebra", "stripes")]).unwrap();

        let hits = search(&manager, &query("  ,. ", 2), 0, 10).unwrap();
        assert_eq!(hits.total_hits, 0);
        assert!(hits.hits.is_empty());
    }

    #[test]
    fn test_pagination_bounds() {
        let manager = create_test_manager();
        let docs: Vec<Document> = (0..7)
            .map(|i| document(&i.to_string(), &format!("Zebra {}", i), "herd"))
            .collect();
        batch_add_documents(&manager, &docs).unwrap();

        let tail = search(&manager, &query("zebra", 2), 5, 10).unwrap();
        assert_eq!(tail.total_hits, 7);
        assert_eq!(tail.hits.len(), 2);

        let past_end = search(&manager, &query("zebra", 2), 50, 10).unwrap();
        assert_eq!(past_end.total_hits, 7);
        assert!(past_end.hits.is_empty());

        let count_only = search(&manager, &query("zebra", 2), 0, 0).unwrap();
        assert_eq!(count_only.total_hits, 7);
        assert!(count_only.hits.is_empty());

        let huge = search(&manager, &query("zebra", 2), 0, u64::MAX).unwrap();
        assert_eq!(huge.hits.len(), 7);
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let manager = create_test_manager();
        let mut bad = query("zebra", 2);
        bad.fields = vec!["id".to_string()];

        assert!(search(&manager, &bad, 0, 10).is_err());
    }

    #[test]
    fn test_on_disk_index_survives_reopen() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("test_index");

        {
            let manager = IndexManager::open_or_create(&path).unwrap();
            batch_add_documents(&manager, &[document("1", "Alpha Report", "persisted")]).unwrap();
        }

        let reopened = IndexManager::open_or_create(&path).unwrap();
        assert_eq!(reopened.reader().searcher().num_docs(), 1);
        let hits = search(&reopened, &query("persisted", 2), 0, 10).unwrap();
        assert_eq!(hits.hits[0]["title"], "Alpha Report");
    }
}
