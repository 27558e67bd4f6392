use std::sync::Arc;

use crate::value::Value;

/// The key naming an item's output file.
pub const OUTPUT_FILE_KEY: &str = "output_file";

/// One entry of a collection, written to its own `output_file`.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    /// Position in the collection's `items` sequence.
    pub index: usize,
    pub output_file: Arc<str>,
    pub context: Value,
}

impl Item {
    /// Returns the reason `value` can't be rendered as an item, if any.
    pub fn from_value(index: usize, value: &Value) -> Result<Self, &'static str> {
        let fields = value.as_dict().ok_or("item is not a mapping")?;
        let output_file = match fields.get(OUTPUT_FILE_KEY) {
            Some(Value::String(file)) => file.clone(),
            Some(_) => return Err("`output_file` is not a string"),
            None => return Err("missing `output_file`"),
        };

        Ok(Item { index, output_file, context: value.clone() })
    }
}
