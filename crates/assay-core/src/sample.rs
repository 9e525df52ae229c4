//! Sample-name parsing: time offsets, display trimming and group classification.
//!
//! Sample identifiers look like `101 d5`, `101w-1` or `201 m2 control`: a
//! numeric subject prefix, optional time-point tokens (`d` days, `w` weeks,
//! `m` months, a `-` marking a pre-dose offset) and free text.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::models::SampleGroup;

/// Default lowest group id.
pub const DEFAULT_BASE_ID: u64 = 101;

/// Default width of one group bucket.
pub const DEFAULT_INCREMENT: u64 = 100;

/// Literal token dropped from display names (replicate marker).
const REPLICATE_TOKEN: &str = "1-2";

fn negative_unit_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[dwm]-\d+").expect("regex is valid"))
}

fn signed_unit_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([dwm])-?(\d+)").expect("regex is valid"))
}

fn unit_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([dwm])(\d+)").expect("regex is valid"))
}

fn numeric_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+").expect("regex is valid"))
}

// ── Time offsets ──────────────────────────────────────────────────────────────

/// Days represented by one step of `unit`.
fn unit_days(unit: &str) -> i64 {
    match unit {
        "w" => 7,
        "m" => 30,
        _ => 1,
    }
}

/// Parse the signed day offset from a raw (untrimmed) sample name.
///
/// `d5` → 5, `w2` → 14, `m1` → 30, `d-5` → −5, `w-2` → −14. When any unit is
/// followed by `-`, the first unit occurrence in the string is read as
/// negative. Returns `None` when no unit/digit pattern is present.
pub fn extract_time_unit(sample: &str) -> Option<i64> {
    if negative_unit_re().is_match(sample) {
        let caps = signed_unit_re().captures(sample)?;
        let magnitude: i64 = caps[2].parse().ok()?;
        return magnitude.checked_mul(unit_days(&caps[1])).map(|d| -d);
    }

    let caps = unit_re().captures(sample)?;
    let magnitude: i64 = caps[2].parse().ok()?;
    magnitude.checked_mul(unit_days(&caps[1]))
}

// ── Display trimming ──────────────────────────────────────────────────────────

/// Strip time-point and replicate tokens from a sample name.
///
/// Whitespace-separated tokens starting with a lowercase `m`, `w` or `d`, and
/// the literal `1-2`, are dropped. A time point fused onto a numeric id
/// (`101d5`, `101w-1`) is cut off at the unit letter. Survivors are joined
/// with single spaces.
pub fn trim_sample_name(sample: &str) -> String {
    sample
        .split_whitespace()
        .filter(|token| !token.starts_with(['m', 'w', 'd']) && *token != REPLICATE_TOKEN)
        .filter_map(|token| {
            let kept = strip_fused_time_point(token);
            (!kept.is_empty()).then_some(kept)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn strip_fused_time_point(token: &str) -> &str {
    if !token.starts_with(|c: char| c.is_ascii_digit()) {
        return token;
    }
    match signed_unit_re().find(token) {
        Some(m) => &token[..m.start()],
        None => token,
    }
}

// ── Group classification ──────────────────────────────────────────────────────

/// Bucketing parameters for sample groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupingConfig {
    pub base_id: u64,
    pub increment: u64,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            base_id: DEFAULT_BASE_ID,
            increment: DEFAULT_INCREMENT,
        }
    }
}

impl GroupingConfig {
    /// Group of a single sample name, from its leading digits.
    ///
    /// `((prefix - base_id) / increment) * increment + base_id`, defined only
    /// when `prefix >= base_id`.
    pub fn group_of(&self, sample: &str) -> Option<SampleGroup> {
        let prefix: u64 = numeric_prefix_re().find(sample)?.as_str().parse().ok()?;
        if prefix < self.base_id {
            return None;
        }
        let bucket = (prefix - self.base_id).checked_div(self.increment)?;
        Some(SampleGroup(bucket * self.increment + self.base_id))
    }
}

/// Classify a column of sample names by majority vote over their groups.
///
/// Ties go to the group seen first. Returns `None` when no sample has a
/// qualifying numeric prefix.
pub fn determine_sample_group<'a, I>(samples: I, config: &GroupingConfig) -> Option<SampleGroup>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: HashMap<SampleGroup, usize> = HashMap::new();
    let mut seen_order: Vec<SampleGroup> = Vec::new();

    for group in samples.into_iter().filter_map(|s| config.group_of(s)) {
        let count = counts.entry(group).or_insert(0);
        if *count == 0 {
            seen_order.push(group);
        }
        *count += 1;
    }

    let mut best: Option<(SampleGroup, usize)> = None;
    for group in seen_order {
        let count = counts[&group];
        if best.map_or(true, |(_, top)| count > top) {
            best = Some((group, count));
        }
    }
    best.map(|(group, _)| group)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── extract_time_unit ─────────────────────────────────────────────────────

    #[test]
    fn test_extract_time_unit_positive_units() {
        assert_eq!(extract_time_unit("d5"), Some(5));
        assert_eq!(extract_time_unit("w2"), Some(14));
        assert_eq!(extract_time_unit("m1"), Some(30));
    }

    #[test]
    fn test_extract_time_unit_negative_units() {
        assert_eq!(extract_time_unit("d-5"), Some(-5));
        assert_eq!(extract_time_unit("w-2"), Some(-14));
        assert_eq!(extract_time_unit("m-1"), Some(-30));
    }

    #[test]
    fn test_extract_time_unit_embedded_in_name() {
        assert_eq!(extract_time_unit("101d5"), Some(5));
        assert_eq!(extract_time_unit("101w-1"), Some(-7));
        assert_eq!(extract_time_unit("201 m2 control"), Some(60));
    }

    #[test]
    fn test_extract_time_unit_first_match_wins() {
        assert_eq!(extract_time_unit("101 d3 w2"), Some(3));
    }

    #[test]
    fn test_extract_time_unit_negative_anywhere_negates_first_unit() {
        // A `-` after any unit switches to the signed extractor, which reads
        // the first unit occurrence.
        assert_eq!(extract_time_unit("101 d3 w-2"), Some(-3));
    }

    #[test]
    fn test_extract_time_unit_absent() {
        assert_eq!(extract_time_unit("101 control"), None);
        assert_eq!(extract_time_unit("C0-1"), None);
        assert_eq!(extract_time_unit(""), None);
    }

    // ── trim_sample_name ──────────────────────────────────────────────────────

    #[test]
    fn test_trim_sample_name_drops_time_tokens() {
        assert_eq!(trim_sample_name("101 m2 w1 d3 control"), "101 control");
    }

    #[test]
    fn test_trim_sample_name_drops_replicate_token() {
        assert_eq!(trim_sample_name("101 1-2 control"), "101 control");
    }

    #[test]
    fn test_trim_sample_name_fused_time_point() {
        assert_eq!(trim_sample_name("101d5"), "101");
        assert_eq!(trim_sample_name("101w-1"), "101");
        assert_eq!(trim_sample_name("201d5 plasma"), "201 plasma");
    }

    #[test]
    fn test_trim_sample_name_uppercase_kept() {
        assert_eq!(trim_sample_name("101 D3 Mouse"), "101 D3 Mouse");
    }

    #[test]
    fn test_trim_sample_name_collapses_whitespace() {
        assert_eq!(trim_sample_name("  101   control  "), "101 control");
    }

    #[test]
    fn test_trim_sample_name_non_numeric_tokens_untouched() {
        assert_eq!(trim_sample_name("S01"), "S01");
        assert_eq!(trim_sample_name("C0-1"), "C0-1");
    }

    // ── group_of ──────────────────────────────────────────────────────────────

    #[test]
    fn test_group_of_buckets() {
        let cfg = GroupingConfig::default();
        assert_eq!(cfg.group_of("101"), Some(SampleGroup(101)));
        assert_eq!(cfg.group_of("150C"), Some(SampleGroup(101)));
        assert_eq!(cfg.group_of("200"), Some(SampleGroup(101)));
        assert_eq!(cfg.group_of("201 d5"), Some(SampleGroup(201)));
        assert_eq!(cfg.group_of("355"), Some(SampleGroup(301)));
    }

    #[test]
    fn test_group_of_below_base_or_no_prefix() {
        let cfg = GroupingConfig::default();
        assert_eq!(cfg.group_of("100"), None);
        assert_eq!(cfg.group_of("C0-1"), None);
        assert_eq!(cfg.group_of(""), None);
    }

    #[test]
    fn test_group_of_custom_increment() {
        let cfg = GroupingConfig {
            base_id: 1,
            increment: 10,
        };
        assert_eq!(cfg.group_of("25"), Some(SampleGroup(21)));
    }

    #[test]
    fn test_group_of_zero_increment_is_none() {
        let cfg = GroupingConfig {
            base_id: 1,
            increment: 0,
        };
        assert_eq!(cfg.group_of("25"), None);
    }

    // ── determine_sample_group ────────────────────────────────────────────────

    #[test]
    fn test_determine_sample_group_majority() {
        let cfg = GroupingConfig::default();
        let group = determine_sample_group(["101A", "101B", "150C"], &cfg);
        assert_eq!(group, Some(SampleGroup(101)));
        assert_eq!(group.unwrap().to_string(), "101");
    }

    #[test]
    fn test_determine_sample_group_mixed_prefixes() {
        let cfg = GroupingConfig::default();
        let group = determine_sample_group(["201", "101", "201", "C0-1"], &cfg);
        assert_eq!(group, Some(SampleGroup(201)));
    }

    #[test]
    fn test_determine_sample_group_tie_goes_to_first_seen() {
        let cfg = GroupingConfig::default();
        assert_eq!(
            determine_sample_group(["301", "101", "101", "301"], &cfg),
            Some(SampleGroup(301))
        );
    }

    #[test]
    fn test_determine_sample_group_none() {
        let cfg = GroupingConfig::default();
        assert_eq!(determine_sample_group(["S01", "neat"], &cfg), None);
        assert_eq!(determine_sample_group(Vec::<&str>::new(), &cfg), None);
    }
}
