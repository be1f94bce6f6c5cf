/// Merging of near-duplicate hits
///
/// A correlation peak usually clears the threshold at several adjacent
/// positions. Grouping collapses those into one point per on-screen object.
use super::types::Match;

/// Default max distance (per axis, in pixels) for two hits to merge
pub const DEFAULT_GROUP_DISTANCE: u32 = 5;

/// Greedily merge `matches` into clusters and sort them by (x, y).
///
/// Each hit joins the first cluster whose current center is within
/// `max_distance` on both axes; the center then moves to the integer average
/// of the old center and the hit. The result depends on input order.
pub fn group_matches(matches: &[Match], max_distance: u32) -> Vec<Match> {
    let mut groups: Vec<Match> = Vec::new();

    for m in matches {
        let existing = groups
            .iter_mut()
            .find(|g| g.x.abs_diff(m.x) <= max_distance && g.y.abs_diff(m.y) <= max_distance);

        match existing {
            Some(group) => {
                group.x = (group.x + m.x) / 2;
                group.y = (group.y + m.y) / 2;
                group.score = group.score.max(m.score);
            }
            None => groups.push(m.clone()),
        }
    }

    groups.sort_by_key(|g| (g.x, g.y));
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(x: u32, y: u32) -> Match {
        Match::new("btn", x, y, 0.95)
    }

    #[test]
    fn test_close_hits_merge_far_hit_stays() {
        let grouped = group_matches(&[m(200, 200), m(100, 100), m(102, 101)], 5);
        assert_eq!(grouped.len(), 2);
        assert_eq!((grouped[0].x, grouped[0].y), (101, 100));
        assert_eq!((grouped[1].x, grouped[1].y), (200, 200));
    }

    #[test]
    fn test_grouping_is_idempotent() {
        let once = group_matches(&[m(50, 10), m(10, 90), m(30, 30), m(10, 20)], 5);
        let twice = group_matches(&once, 5);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_rolling_average_is_order_dependent() {
        // 0 and 5 merge to 2, then 7 is within 5 of 2 and merges to 4
        let forward = group_matches(&[m(0, 0), m(5, 0), m(7, 0)], 5);
        assert_eq!(forward.len(), 1);
        assert_eq!(forward[0].x, 4);

        // 7 and 5 merge to 6, then 0 is 6 away and starts its own cluster
        let backward = group_matches(&[m(7, 0), m(5, 0), m(0, 0)], 5);
        assert_eq!(backward.len(), 2);
    }

    #[test]
    fn test_sorted_by_x_then_y() {
        let grouped = group_matches(&[m(40, 9), m(10, 50), m(40, 1)], 2);
        let coords: Vec<_> = grouped.iter().map(|g| (g.x, g.y)).collect();
        assert_eq!(coords, vec![(10, 50), (40, 1), (40, 9)]);
    }

    #[test]
    fn test_nothing_to_group() {
        assert!(group_matches(&[], DEFAULT_GROUP_DISTANCE).is_empty());
    }

    #[test]
    fn test_group_keeps_first_label() {
        let grouped = group_matches(
            &[Match::new("first", 10, 10, 0.9), Match::new("second", 11, 11, 0.99)],
            5,
        );
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped[0].label, "first");
        assert_eq!(grouped[0].score, 0.99);
    }
}
