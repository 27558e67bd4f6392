use std::sync::Arc;

use crate::value::{Dict, Value};

/// The reserved top-level key holding the shared base data.
pub const BASE_KEY: &str = "base";

/// Builds the render context for one page or item.
///
/// Without a base, `value` is the context as-is. With a base, the context is
/// `{ "base": base }` with every field of `value` copied alongside it, if
/// `value` is a mapping. A field named `base` replaces the base entry.
pub fn merge_context(base: Option<&Arc<Dict>>, value: &Value) -> Value {
    let Some(base) = base else {
        return value.clone();
    };

    let mut context = Dict::new();
    context.insert(BASE_KEY.into(), Value::Dict(base.clone()));
    if let Some(fields) = value.as_dict() {
        context.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    Value::Dict(Arc::new(context))
}

/// Whether merging `value` over `base` replaces the base entry.
pub fn shadows_base(base: Option<&Arc<Dict>>, value: &Value) -> bool {
    base.is_some() && value.get(BASE_KEY).is_some()
}
