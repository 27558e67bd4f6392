use std::sync::Arc;

use crate::config::Configuration;
use crate::event::Recorder;
use crate::taxonomy::*;
use crate::value::Dict;

/// Everything that gets rendered, in render order.
#[derive(Debug, Clone, PartialEq)]
pub struct Site {
    pub template_id: Arc<str>,
    pub base: Option<Arc<Dict>>,
    pub pages: Vec<Page>,
    pub collections: Vec<Collection>,
}

impl Site {
    /// Pages and collections are taken in key order. Malformed collections
    /// and items are left out and reported to `recorder`.
    pub fn new<R: Recorder + ?Sized>(config: &Configuration, recorder: &R) -> Site {
        let pages = config.pages.iter()
            .map(|(name, context)| Page::new(name.clone(), context.clone()))
            .collect();

        let collections = config.collections.iter()
            .filter_map(|(name, definition)| {
                Collection::from_definition(name.clone(), definition, recorder)
            })
            .collect();

        Site {
            template_id: config.template_id.as_str().into(),
            base: config.base.clone(),
            pages,
            collections,
        }
    }

    pub fn has_base(&self) -> bool {
        self.base.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::MemoryRecorder;

    #[test]
    fn pages_and_collections_are_sorted_by_name() {
        let config = Configuration::from_yaml(r#"
            pages: { projects: {}, about: {}, index: {} }
            collections:
              talks: { items: [] }
              broken: 12
              posts: { items: [{ output_file: a.html }] }
        "#).unwrap();

        let site = Site::new(&config, &MemoryRecorder::new());
        let pages: Vec<_> = site.pages.iter().map(|p| &*p.name).collect();
        let collections: Vec<_> = site.collections.iter().map(|c| &*c.name).collect();
        assert_eq!(pages, ["about", "index", "projects"]);
        assert_eq!(collections, ["posts", "talks"]);
        assert!(!site.has_base());
    }
}
