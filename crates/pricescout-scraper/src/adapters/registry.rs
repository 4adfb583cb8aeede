use std::collections::BTreeMap;
use std::sync::Arc;

use super::{
    AdapterContext, BugAdapter, KspAdapter, SourceAdapter, WisebuyAdapter, ZapAdapter,
};

struct Entry {
    priority: u32,
    adapter: Arc<dyn SourceAdapter>,
}

/// Maps `(country, site)` to adapters, ordered by per-site priority
/// (lower runs first).
#[derive(Default)]
pub struct AdapterRegistry {
    by_country: BTreeMap<String, Vec<Entry>>,
}

impl AdapterRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in Israeli sources:
    /// zap (1), wisebuy (2), ksp (3), bug (4).
    #[must_use]
    pub fn with_defaults(ctx: &AdapterContext) -> Self {
        let mut registry = Self::new();
        registry.register(1, Arc::new(ZapAdapter::new(ctx.clone())));
        registry.register(2, Arc::new(WisebuyAdapter::new(ctx.clone())));
        registry.register(3, Arc::new(KspAdapter::new(ctx.clone())));
        registry.register(4, Arc::new(BugAdapter::new(ctx.clone())));
        registry
    }

    /// Adds `adapter` under its own country. Re-registering a name replaces
    /// the earlier entry.
    pub fn register(&mut self, priority: u32, adapter: Arc<dyn SourceAdapter>) {
        let entries = self
            .by_country
            .entry(adapter.country().to_ascii_uppercase())
            .or_default();
        entries.retain(|e| e.adapter.name() != adapter.name());
        let at = entries.partition_point(|e| e.priority <= priority);
        entries.insert(at, Entry { priority, adapter });
    }

    /// Adapters for `country` in execution order.
    #[must_use]
    pub fn adapters_for(&self, country: &str) -> Vec<Arc<dyn SourceAdapter>> {
        self.by_country
            .get(&country.to_ascii_uppercase())
            .map(|entries| entries.iter().map(|e| Arc::clone(&e.adapter)).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn get(&self, country: &str, name: &str) -> Option<Arc<dyn SourceAdapter>> {
        self.by_country
            .get(&country.to_ascii_uppercase())?
            .iter()
            .find(|e| e.adapter.name() == name)
            .map(|e| Arc::clone(&e.adapter))
    }

    #[must_use]
    pub fn priority_of(&self, country: &str, name: &str) -> Option<u32> {
        self.by_country
            .get(&country.to_ascii_uppercase())?
            .iter()
            .find(|e| e.adapter.name() == name)
            .map(|e| e.priority)
    }

    pub fn countries(&self) -> impl Iterator<Item = &str> {
        self.by_country.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use pricescout_core::{AppConfig, PriceOption, SourcesConfig};

    use crate::error::AdapterError;

    struct Named {
        name: &'static str,
        country: &'static str,
        ctx: AdapterContext,
    }

    #[async_trait]
    impl SourceAdapter for Named {
        fn name(&self) -> &'static str {
            self.name
        }
        fn country(&self) -> &'static str {
            self.country
        }
        fn context(&self) -> &AdapterContext {
            &self.ctx
        }
        async fn search(&self, _: &str, _: usize) -> Result<Vec<PriceOption>, AdapterError> {
            Ok(Vec::new())
        }
    }

    fn ctx() -> AdapterContext {
        AdapterContext::from_config(&AppConfig::default(), &SourcesConfig::default())
            .expect("context")
    }

    #[test]
    fn defaults_are_ordered_by_priority() {
        let registry = AdapterRegistry::with_defaults(&ctx());
        let names: Vec<&str> = registry.adapters_for("il").iter().map(|a| a.name()).collect();
        assert_eq!(names, vec!["zap", "wisebuy", "ksp", "bug"]);
        assert_eq!(registry.priority_of("IL", "ksp"), Some(3));
        assert!(registry.adapters_for("US").is_empty());
    }

    #[test]
    fn register_orders_and_replaces() {
        let ctx = ctx();
        let mut registry = AdapterRegistry::new();
        registry.register(5, Arc::new(Named { name: "late", country: "IL", ctx: ctx.clone() }));
        registry.register(1, Arc::new(Named { name: "early", country: "IL", ctx: ctx.clone() }));
        registry.register(9, Arc::new(Named { name: "early", country: "IL", ctx: ctx.clone() }));
        registry.register(1, Arc::new(Named { name: "us", country: "US", ctx }));

        let names: Vec<&str> = registry.adapters_for("IL").iter().map(|a| a.name()).collect();
        assert_eq!(names, vec!["late", "early"]);
        assert!(registry.get("us", "us").is_some());
        assert_eq!(registry.countries().collect::<Vec<_>>(), vec!["IL", "US"]);
    }
}
