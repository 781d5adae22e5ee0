//! Stale content evaluator.
//!
//! Pure decision logic: no I/O, no store access. Age is a hard gate;
//! engagement qualifies when either signal (views or comments) is low.

use chrono::{DateTime, Utc};

use crate::content::ContentItem;
use crate::criteria::FilterCriteria;

/// Age gate: strictly older than the threshold, in whole days
pub fn is_old_enough(item: &ContentItem, criteria: &FilterCriteria, now: DateTime<Utc>) -> bool {
    item.age_days(now) > criteria.age_threshold_days
}

/// Engagement gate: view count OR comment count below the threshold
pub fn is_low_engagement(item: &ContentItem, criteria: &FilterCriteria) -> bool {
    below(item.view_count, criteria.engagement_threshold)
        || below(item.comment_count, criteria.engagement_threshold)
}

pub fn is_selected_type(item: &ContentItem, criteria: &FilterCriteria) -> bool {
    criteria.content_types.iter().any(|t| *t == item.content_type)
}

/// Empty category list means no restriction
pub fn is_in_selected_category(item: &ContentItem, criteria: &FilterCriteria) -> bool {
    criteria.category_ids.is_empty() || item.in_any_category(&criteria.category_ids)
}

/// Returns true if the item qualifies for disposition
pub fn matches(item: &ContentItem, criteria: &FilterCriteria, now: DateTime<Utc>) -> bool {
    is_old_enough(item, criteria, now)
        && is_low_engagement(item, criteria)
        && is_selected_type(item, criteria)
        && is_in_selected_category(item, criteria)
}

/// Split a batch into `(keep, act_on)`, preserving input order in both
pub fn partition(
    items: Vec<ContentItem>,
    criteria: &FilterCriteria,
    now: DateTime<Utc>,
) -> (Vec<ContentItem>, Vec<ContentItem>) {
    let (act_on, keep) = items
        .into_iter()
        .partition(|item| matches(item, criteria, now));
    (keep, act_on)
}

/// `count < threshold`, never true for a negative threshold
pub(crate) fn below(count: u64, threshold: i64) -> bool {
    u64::try_from(threshold).is_ok_and(|threshold| count < threshold)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn criteria() -> FilterCriteria {
        FilterCriteria::new(["post"], 30, 10)
    }

    fn stale_post() -> ContentItem {
        ContentItem::new(1, "post", now() - Duration::days(40)).with_engagement(2, 1)
    }

    #[test]
    fn test_each_axis_independently() {
        struct Case {
            name: &'static str,
            item: ContentItem,
            criteria: FilterCriteria,
            expected: bool,
        }

        let cases = vec![
            Case {
                name: "all conditions hold",
                item: stale_post(),
                criteria: criteria(),
                expected: true,
            },
            Case {
                name: "too recent",
                item: ContentItem::new(1, "post", now() - Duration::days(10)).with_engagement(2, 1),
                criteria: criteria(),
                expected: false,
            },
            Case {
                name: "exactly at age threshold is not older",
                item: ContentItem::new(1, "post", now() - Duration::days(30)).with_engagement(2, 1),
                criteria: criteria(),
                expected: false,
            },
            Case {
                name: "only views low",
                item: stale_post().with_engagement(3, 500),
                criteria: criteria(),
                expected: true,
            },
            Case {
                name: "only comments low",
                item: stale_post().with_engagement(500, 3),
                criteria: criteria(),
                expected: true,
            },
            Case {
                name: "both signals high",
                item: stale_post().with_engagement(10, 10),
                criteria: criteria(),
                expected: false,
            },
            Case {
                name: "type not selected",
                item: ContentItem::new(1, "page", now() - Duration::days(40)).with_engagement(2, 1),
                criteria: criteria(),
                expected: false,
            },
            Case {
                name: "category restriction satisfied",
                item: stale_post().with_categories([5, 6]),
                criteria: criteria().with_categories([6]),
                expected: true,
            },
            Case {
                name: "category restriction not satisfied",
                item: stale_post().with_categories([5]),
                criteria: criteria().with_categories([6]),
                expected: false,
            },
            Case {
                name: "uncategorized item with restriction",
                item: stale_post(),
                criteria: criteria().with_categories([6]),
                expected: false,
            },
            Case {
                name: "zero engagement threshold selects nothing",
                item: stale_post().with_engagement(0, 0),
                criteria: FilterCriteria::new(["post"], 30, 0),
                expected: false,
            },
        ];

        for case in cases {
            assert_eq!(
                matches(&case.item, &case.criteria, now()),
                case.expected,
                "case: {}",
                case.name
            );
        }
    }

    #[test]
    fn test_partial_day_does_not_count() {
        let item = ContentItem::new(1, "post", now() - Duration::days(31) + Duration::hours(1))
            .with_engagement(0, 0);
        assert!(!is_old_enough(&item, &criteria(), now()));
    }

    #[test]
    fn test_partition_preserves_order() {
        let items = vec![
            stale_post(),
            ContentItem::new(2, "post", now()).with_engagement(0, 0),
            ContentItem::new(3, "post", now() - Duration::days(90)),
            ContentItem::new(4, "post", now() - Duration::days(90)).with_engagement(99, 99),
        ];
        let (keep, act_on) = partition(items, &criteria(), now());
        let keep: Vec<u64> = keep.iter().map(|i| i.id).collect();
        let act_on: Vec<u64> = act_on.iter().map(|i| i.id).collect();
        assert_eq!(keep, vec![2, 4]);
        assert_eq!(act_on, vec![1, 3]);
    }
}
