#[cfg(test)]
pub mod fixtures {
    use serde_json::json;

    /// One schema-valid item as JSON text.
    pub fn valid_item_json(question: &str, answer_index: u8) -> String {
        json!({
            "question": question,
            "options": ["A", "B", "C", "D"],
            "answer_index": answer_index
        })
        .to_string()
    }

    /// A valid array of `n` items with questions "Q1".."Qn".
    pub fn batch_json(n: usize) -> String {
        let items: Vec<String> = (1..=n)
            .map(|i| valid_item_json(&format!("Q{}", i), (i % 4) as u8))
            .collect();
        format!("[{}]", items.join(","))
    }
}

#[cfg(test)]
pub mod test_helpers {
    use crate::models::domain::McqItem;

    /// Asserts the result has the requested length and every item keeps its invariants.
    pub fn assert_well_formed(items: &[McqItem], count: usize) {
        assert_eq!(items.len(), count, "expected {} items", count);
        for item in items {
            assert!(!item.question().trim().is_empty());
            assert_eq!(item.options().len(), 4);
            assert!(item.answer_index() <= 3);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use crate::services::schema_validator::validate;

    #[test]
    fn test_fixtures_batch_json_is_valid() {
        let value: serde_json::Value = serde_json::from_str(&batch_json(3)).unwrap();
        let items = validate(&value).expect("fixture should validate");

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].question(), "Q1");
        assert_eq!(items[2].answer_index(), 3);
    }

    #[test]
    fn test_fixtures_empty_batch() {
        assert_eq!(batch_json(0), "[]");
    }
}
