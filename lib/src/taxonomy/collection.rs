use std::sync::Arc;

use crate::event::{Event, Recorder};
use crate::taxonomy::Item;
use crate::value::Value;

/// The key holding a collection's item sequence.
pub const ITEMS_KEY: &str = "items";

/// A named group of items sharing the template `<name>.html`.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    pub name: Arc<str>,
    pub items: Vec<Item>,
}

impl Collection {
    /// Reads a collection definition, tolerating malformed data: a definition
    /// without an `items` sequence yields `None`, and items without a string
    /// `output_file` are left out. Each omission is recorded.
    pub fn from_definition<N, R>(name: N, definition: &Value, recorder: &R) -> Option<Self>
        where N: Into<Arc<str>>, R: Recorder + ?Sized
    {
        let name = name.into();
        let items = match definition.get(ITEMS_KEY) {
            Some(Value::Array(items)) => items,
            Some(_) => return skip(recorder, name, "`items` is not a sequence"),
            None if definition.as_dict().is_none() => {
                return skip(recorder, name, "definition is not a mapping")
            }
            None => return skip(recorder, name, "no `items` field"),
        };

        let items = items.iter()
            .enumerate()
            .filter_map(|(i, value)| match Item::from_value(i, value) {
                Ok(item) => Some(item),
                Err(reason) => {
                    recorder.record(Event::ItemSkipped { collection: name.clone(), index: i, reason });
                    None
                }
            })
            .collect();

        Some(Collection { name, items })
    }

    pub fn template_name(&self) -> String {
        format!("{}.html", self.name)
    }
}

fn skip<R: Recorder + ?Sized>(recorder: &R, collection: Arc<str>, reason: &'static str) -> Option<Collection> {
    recorder.record(Event::CollectionSkipped { collection, reason });
    None
}
