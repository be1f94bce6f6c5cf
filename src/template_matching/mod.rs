/// Template matching for UI recognition in captured frames
///
/// This module provides:
/// - Reference templates loaded from disk, labeled by file stem
/// - Zero-mean normalized cross-correlation with exact integer sums
/// - Greedy grouping of near-duplicate hits into single points
pub mod grouper;
pub mod matcher;
pub mod types;

pub use grouper::{DEFAULT_GROUP_DISTANCE, group_matches};
pub use matcher::{DEFAULT_THRESHOLD, Haystack, find_matches, match_template_file};
pub use types::{Match, Template, TemplateSet};
