use crate::models::domain::McqItem;

const PLACEHOLDER_QUESTION: &str = "Generate a meaningful question from the document.";
const PLACEHOLDER_OPTIONS: [&str; 4] = ["Option A", "Option B", "Option C", "Option D"];
const DISTRACTORS: [&str; 3] = ["Not related", "Partially related", "Opposite"];

/// Build exactly `count` questions from `source_text` without any external call.
///
/// One question per sentence, in order; slots beyond the available sentences
/// get a fixed placeholder item.
pub fn generate_fallback(source_text: &str, count: usize) -> Vec<McqItem> {
    let mut items: Vec<McqItem> = sentences(source_text)
        .take(count)
        .map(sentence_item)
        .collect();

    items.resize_with(count, placeholder_item);
    items
}

/// Period-delimited fragments, trimmed, with `\n` folded to a space and empties dropped.
///
/// A `\r` inside a fragment is kept.
fn sentences(source_text: &str) -> impl Iterator<Item = String> + '_ {
    source_text
        .split('.')
        .map(|fragment| fragment.replace('\n', " ").trim().to_string())
        .filter(|fragment| !fragment.is_empty())
}

fn sentence_item(sentence: String) -> McqItem {
    let [first, second, third] = DISTRACTORS.map(str::to_string);
    McqItem::new(
        format!("What is the main idea of: {sentence}?"),
        [sentence, first, second, third],
        0,
    )
}

fn placeholder_item() -> McqItem {
    McqItem::new(PLACEHOLDER_QUESTION, PLACEHOLDER_OPTIONS.map(str::to_string), 0)
}
