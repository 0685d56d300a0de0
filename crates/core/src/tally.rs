use crate::category::Category;
use crate::timeline::TimelineItem;
use std::collections::BTreeMap;

/// Per-category action counts. Every category is present, zero or not.
pub fn tally_categories(items: &[TimelineItem]) -> BTreeMap<Category, usize> {
    let mut counts: BTreeMap<Category, usize> =
        Category::ALL.iter().map(|category| (*category, 0)).collect();
    for action in items.iter().filter_map(TimelineItem::as_action) {
        *counts.entry(action.category).or_default() += 1;
    }
    counts
}
