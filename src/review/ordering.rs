//! Review queue ordering

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::models::{Category, QueueEntry};

/// Settings key holding the ordering preference
pub const ORDERING_SETTINGS_KEY: &str = "reviewOrdering";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderingMode {
    /// Grouped by category in priority order
    #[default]
    Prioritized,
    /// Uniformly shuffled
    Mixed,
}

impl OrderingMode {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "prioritized" => Some(OrderingMode::Prioritized),
            "mixed" => Some(OrderingMode::Mixed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderingSpec {
    pub mode: OrderingMode,
    /// Every category exactly once, highest priority first
    pub priorities: Vec<Category>,
}

impl Default for OrderingSpec {
    fn default() -> Self {
        Self {
            mode: OrderingMode::Prioritized,
            priorities: Category::DEFAULT_ORDER.to_vec(),
        }
    }
}

/// Anything that can be grouped by queue category
pub trait Categorized {
    fn category(&self) -> Category;
}

impl Categorized for QueueEntry {
    fn category(&self) -> Category {
        self.category
    }
}

/// Turn an arbitrary ordering preference into a complete ordering
///
/// Accepts `{ "mode": ..., "priorities": [...] }` or a bare mode string.
pub fn normalize_ordering(raw: Option<&Value>) -> OrderingSpec {
    let (mode, priorities) = match raw {
        Some(Value::String(mode)) => (OrderingMode::from_name(mode), None),
        Some(Value::Object(obj)) => (
            obj.get("mode").and_then(Value::as_str).and_then(OrderingMode::from_name),
            obj.get("priorities"),
        ),
        _ => (None, None),
    };

    OrderingSpec {
        mode: mode.unwrap_or_default(),
        priorities: normalize_priorities(priorities),
    }
}

fn normalize_priorities(raw: Option<&Value>) -> Vec<Category> {
    let mut priorities: Vec<Category> = Vec::with_capacity(Category::DEFAULT_ORDER.len());
    if let Some(entries) = raw.and_then(Value::as_array) {
        for category in entries
            .iter()
            .filter_map(Value::as_str)
            .filter_map(|name| Category::from_name(&name.trim().to_lowercase()))
        {
            if !priorities.contains(&category) {
                priorities.push(category);
            }
        }
    }

    for category in Category::DEFAULT_ORDER {
        if !priorities.contains(&category) {
            priorities.push(category);
        }
    }
    priorities
}

/// Order a queue according to an ordering preference
pub fn order_entries<T: Categorized>(entries: Vec<T>, spec: &OrderingSpec) -> Vec<T> {
    order_entries_with_rng(entries, spec, &mut rand::thread_rng())
}

/// Order a queue with an explicit random source for the mixed mode
pub fn order_entries_with_rng<T: Categorized, G: Rng + ?Sized>(
    mut entries: Vec<T>,
    spec: &OrderingSpec,
    rng: &mut G,
) -> Vec<T> {
    match spec.mode {
        OrderingMode::Mixed => {
            entries.shuffle(rng);
            entries
        }
        OrderingMode::Prioritized => prioritize(entries, &spec.priorities),
    }
}

/// Stable partition by category, buckets concatenated in priority order
fn prioritize<T: Categorized>(entries: Vec<T>, priorities: &[Category]) -> Vec<T> {
    let mut order: Vec<Category> = priorities.to_vec();
    for category in Category::DEFAULT_ORDER {
        if !order.contains(&category) {
            order.push(category);
        }
    }

    let mut buckets: Vec<Vec<T>> = order.iter().map(|_| Vec::new()).collect();
    for entry in entries {
        let category = entry.category();
        let slot = order.iter().position(|c| *c == category).unwrap_or(order.len() - 1);
        buckets[slot].push(entry);
    }

    buckets.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq)]
    struct Card(&'static str, Category);

    impl Categorized for Card {
        fn category(&self) -> Category {
            self.1
        }
    }

    fn cards() -> Vec<Card> {
        vec![
            Card("l1", Category::Learning),
            Card("n1", Category::New),
            Card("r1", Category::Review),
            Card("l2", Category::Learning),
            Card("r2", Category::Review),
        ]
    }

    #[test]
    fn test_normalize_defaults() {
        assert_eq!(normalize_ordering(None), OrderingSpec::default());
        assert_eq!(normalize_ordering(Some(&json!(42))), OrderingSpec::default());
        assert_eq!(
            normalize_ordering(Some(&json!({ "mode": "chaos", "priorities": "review" }))),
            OrderingSpec::default()
        );
    }

    #[test]
    fn test_normalize_partial_priorities() {
        let spec = normalize_ordering(Some(&json!({
            "mode": "Mixed",
            "priorities": ["new", "bogus", "new", 3]
        })));
        assert_eq!(spec.mode, OrderingMode::Mixed);
        assert_eq!(spec.priorities, vec![Category::New, Category::Review, Category::Learning]);
    }

    #[test]
    fn test_normalize_bare_mode() {
        let spec = normalize_ordering(Some(&json!("mixed")));
        assert_eq!(spec.mode, OrderingMode::Mixed);
        assert_eq!(spec.priorities, Category::DEFAULT_ORDER.to_vec());
    }

    #[test]
    fn test_prioritized_is_stable() {
        let spec = OrderingSpec {
            mode: OrderingMode::Prioritized,
            priorities: vec![Category::Review, Category::Learning, Category::New],
        };
        let ordered = order_entries(cards(), &spec);
        let names: Vec<&str> = ordered.iter().map(|c| c.0).collect();
        assert_eq!(names, vec!["r1", "r2", "l1", "l2", "n1"]);
    }

    #[test]
    fn test_missing_priority_appended_last() {
        let spec = OrderingSpec {
            mode: OrderingMode::Prioritized,
            priorities: vec![Category::New],
        };
        let ordered = order_entries(cards(), &spec);
        let names: Vec<&str> = ordered.iter().map(|c| c.0).collect();
        assert_eq!(names, vec!["n1", "r1", "r2", "l1", "l2"]);
    }

    #[test]
    fn test_mixed_is_a_permutation() {
        let spec = OrderingSpec {
            mode: OrderingMode::Mixed,
            ..OrderingSpec::default()
        };
        let mut rng = StdRng::seed_from_u64(7);
        let shuffled = order_entries_with_rng(cards(), &spec, &mut rng);
        assert_eq!(shuffled.len(), 5);

        let mut names: Vec<&str> = shuffled.iter().map(|c| c.0).collect();
        names.sort();
        assert_eq!(names, vec!["l1", "l2", "n1", "r1", "r2"]);
    }

    #[test]
    fn test_mixed_is_reproducible_with_seed() {
        let spec = normalize_ordering(Some(&json!("mixed")));
        let a = order_entries_with_rng(cards(), &spec, &mut StdRng::seed_from_u64(99));
        let b = order_entries_with_rng(cards(), &spec, &mut StdRng::seed_from_u64(99));
        assert_eq!(a, b);
    }
}
