//! Segment grouping: batching contiguous segments for LLM calls.
//!
//! Grouping is a pure function of the ordered segment sequence and the
//! character budget, so repeated runs produce identical groups. Groups
//! never split a segment and never reorder segments.

use crate::model::Segment;

/// A contiguous run of segments, bounded by the character budget.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentGroup {
    /// Segments in this group, in transcript order.
    pub segments: Vec<Segment>,
    /// Zero-based group index within the episode.
    pub index: usize,
}

impl SegmentGroup {
    /// Start of the group's time range, in seconds.
    pub fn start_seconds(&self) -> f64 {
        self.segments.first().map(|s| s.start_seconds).unwrap_or(0.0)
    }

    /// End of the group's time range, in seconds.
    pub fn end_seconds(&self) -> f64 {
        self.segments.last().map(|s| s.end_seconds).unwrap_or(0.0)
    }

    /// Combined speaker-attributed text, one line per segment.
    pub fn transcript_text(&self) -> String {
        self.segments
            .iter()
            .map(|s| format!("{}: {}", s.speaker, s.display_text))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Combined display text without speaker attribution.
    pub fn plain_text(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.display_text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn char_count(&self) -> usize {
        self.segments.iter().map(|s| s.display_text.len()).sum()
    }
}

/// Partition ordered segments into contiguous groups.
///
/// A group is closed once adding the next segment would exceed
/// `max_chars`. A single segment larger than the budget still gets its
/// own group: segments are never split.
pub fn group_segments(segments: &[Segment], max_chars: usize) -> Vec<SegmentGroup> {
    let mut groups: Vec<SegmentGroup> = Vec::new();
    let mut current: Vec<Segment> = Vec::new();
    let mut current_chars = 0usize;

    for segment in segments {
        let len = segment.display_text.len();

        if !current.is_empty() && current_chars + len > max_chars {
            groups.push(SegmentGroup {
                segments: std::mem::take(&mut current),
                index: groups.len(),
            });
            current_chars = 0;
        }

        current_chars += len;
        current.push(segment.clone());
    }

    if !current.is_empty() {
        groups.push(SegmentGroup {
            segments: current,
            index: groups.len(),
        });
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(position: i64, text: &str) -> Segment {
        Segment {
            id: format!("s{}", position),
            episode_id: "e1".to_string(),
            start_seconds: position as f64 * 10.0,
            end_seconds: (position + 1) as f64 * 10.0,
            raw_text: text.to_string(),
            display_text: text.to_string(),
            speaker: if position % 2 == 0 {
                "Speaker A".to_string()
            } else {
                "Speaker B".to_string()
            },
            confidence: 0.9,
            position,
        }
    }

    #[test]
    fn test_groups_respect_budget() {
        let segments: Vec<Segment> = (0..6).map(|i| segment(i, "0123456789")).collect();

        // Budget fits two 10-char segments per group
        let groups = group_segments(&segments, 20);
        assert_eq!(groups.len(), 3);
        for group in &groups {
            assert_eq!(group.segments.len(), 2);
        }
    }

    #[test]
    fn test_oversized_segment_gets_own_group() {
        let segments = vec![
            segment(0, "short"),
            segment(1, "this segment text is far longer than the budget"),
            segment(2, "short"),
        ];

        let groups = group_segments(&segments, 10);
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[1].segments.len(), 1);
    }

    #[test]
    fn test_deterministic_and_order_preserving() {
        let segments: Vec<Segment> = (0..20).map(|i| segment(i, "some transcript text")).collect();

        let a = group_segments(&segments, 100);
        let b = group_segments(&segments, 100);
        assert_eq!(a, b);

        // Concatenating group text reproduces the original transcript text
        let rejoined: Vec<String> = a
            .iter()
            .flat_map(|g| g.segments.iter().map(|s| s.display_text.clone()))
            .collect();
        let original: Vec<String> = segments.iter().map(|s| s.display_text.clone()).collect();
        assert_eq!(rejoined, original);

        // Indexes are sequential
        for (i, group) in a.iter().enumerate() {
            assert_eq!(group.index, i);
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(group_segments(&[], 100).is_empty());
    }

    #[test]
    fn test_group_time_range() {
        let segments: Vec<Segment> = (0..3).map(|i| segment(i, "text")).collect();
        let groups = group_segments(&segments, 1000);
        assert_eq!(groups.len(), 1);
        assert!((groups[0].start_seconds() - 0.0).abs() < f64::EPSILON);
        assert!((groups[0].end_seconds() - 30.0).abs() < f64::EPSILON);
    }
}
