use serde_json::{Map, Value};

use crate::{
    errors::ValidationError,
    models::domain::{mcq_item::OPTION_COUNT, McqItem},
};

/// Validate a parsed completion against the MCQ item schema.
///
/// All-or-nothing: the first invalid element rejects the whole batch.
pub fn validate(raw: &Value) -> Result<Vec<McqItem>, ValidationError> {
    let items = raw.as_array().ok_or(ValidationError::NotAList)?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| validate_item(index, item))
        .collect()
}

fn validate_item(index: usize, item: &Value) -> Result<McqItem, ValidationError> {
    let malformed = |detail: &str| ValidationError::MalformedItem {
        index,
        detail: detail.to_string(),
    };

    let object = item
        .as_object()
        .ok_or_else(|| malformed("item is not an object"))?;

    let question = required(object, "question")
        .ok_or_else(|| malformed("missing field `question`"))?
        .as_str()
        .ok_or_else(|| malformed("`question` must be a string"))?;
    if question.trim().is_empty() {
        return Err(malformed("`question` must not be empty"));
    }

    let options = required(object, "options")
        .ok_or_else(|| malformed("missing field `options`"))?
        .as_array()
        .ok_or_else(|| malformed("`options` must be an array"))?;
    let options = options
        .iter()
        .map(|option| option.as_str().map(str::to_string))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| malformed("`options` must contain only strings"))?;

    let answer_index = required(object, "answer_index")
        .ok_or_else(|| malformed("missing field `answer_index`"))?;
    let answer_index = answer_index
        .as_i64()
        .or_else(|| answer_index.as_u64().map(|_| i64::MAX))
        .ok_or_else(|| malformed("`answer_index` must be an integer"))?;

    let options: [String; OPTION_COUNT] = options
        .try_into()
        .map_err(|_| ValidationError::WrongOptionCount { index })?;

    if !(0..OPTION_COUNT as i64).contains(&answer_index) {
        return Err(ValidationError::AnswerIndexOutOfRange { index });
    }

    Ok(McqItem::new(question, options, answer_index as u8))
}

/// A present, non-null field.
fn required<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    object.get(key).filter(|value| !value.is_null())
}
