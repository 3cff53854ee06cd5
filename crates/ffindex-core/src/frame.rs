use serde::{Deserialize, Serialize};

/// A half-open GPS interval `[start, end)`.
///
/// Half-open is chosen deliberately: adjacency (`a.end == b.start`) must
/// merge, and closed intervals would need off-by-one care at every step
/// of the coalescer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Interval {
    pub start: u64,
    pub end: u64,
}

impl Interval {
    pub fn new(start: u64, end: u64) -> Self {
        Interval { start, end }
    }

    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Two intervals merge iff `self.end >= other.start` (adjacency merges).
    pub fn mergeable_with(&self, other: &Interval) -> bool {
        self.end >= other.start
    }
}

/// The key `(site, frametype, duration, extension)` under which intervals
/// are grouped within a directory. Duration, not start, is part of the
/// key: files belonging to the same logical stream share one `Sfde`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Sfde {
    pub site: String,
    pub frametype: String,
    pub duration: u64,
    pub extension: String,
}

/// A parsed `SITE-FRAMETYPE-GPSSTART-DURATION.EXTENSION` filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameName {
    pub site: String,
    pub frametype: String,
    pub gpsstart: u64,
    pub duration: u64,
    pub extension: String,
}

impl FrameName {
    pub fn sfde(&self) -> Sfde {
        Sfde {
            site: self.site.clone(),
            frametype: self.frametype.clone(),
            duration: self.duration,
            extension: self.extension.clone(),
        }
    }

    pub fn interval(&self) -> Interval {
        Interval::new(self.gpsstart, self.gpsstart + self.duration)
    }
}

/// Parse a frame filename into its components, or `None` if it does not
/// match the `SITE-FRAMETYPE-GPSSTART-DURATION.EXTENSION` grammar.
///
/// Not a frame file is not an error: callers treat `None` as "skip this
/// entry and keep walking". No individual skip is logged.
pub fn parse_frame_name(name: &str) -> Option<FrameName> {
    let mut parts = name.splitn(4, '-');
    let site = parts.next()?;
    let frametype = parts.next()?;
    let gpsstart_str = parts.next()?;
    let rest = parts.next()?;
    if parts.next().is_some() {
        return None;
    }

    if site.is_empty() || site.contains('-') || frametype.is_empty() || frametype.contains('-') {
        return None;
    }

    let mut dot_parts = rest.splitn(2, '.');
    let duration_str = dot_parts.next()?;
    let extension = dot_parts.next()?;
    if extension.is_empty() || extension.contains('.') {
        return None;
    }

    let gpsstart: u64 = gpsstart_str.parse().ok()?;
    let duration: u64 = duration_str.parse().ok()?;

    Some(FrameName {
        site: site.to_string(),
        frametype: frametype.to_string(),
        gpsstart,
        duration,
        extension: extension.to_string(),
    })
}

/// Render a `FrameName` back into the canonical filename. Used by tests
/// to check the parser round-trips, and available to callers that need
/// to synthesize frame filenames.
pub fn format_frame_name(f: &FrameName) -> String {
    format!(
        "{}-{}-{}-{}.{}",
        f.site, f.frametype, f.gpsstart, f.duration, f.extension
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_name() {
        let f = parse_frame_name("H-R-1000000000-16.gwf").unwrap();
        assert_eq!(f.site, "H");
        assert_eq!(f.frametype, "R");
        assert_eq!(f.gpsstart, 1_000_000_000);
        assert_eq!(f.duration, 16);
        assert_eq!(f.extension, "gwf");
    }

    #[test]
    fn round_trips_through_format() {
        let f = FrameName {
            site: "L".into(),
            frametype: "HOFT_C00".into(),
            gpsstart: 123_456,
            duration: 4096,
            extension: "gwf".into(),
        };
        let name = format_frame_name(&f);
        assert_eq!(parse_frame_name(&name), Some(f));
    }

    #[test]
    fn rejects_wrong_field_count() {
        assert!(parse_frame_name("H-R-1000000000.gwf").is_none());
        assert!(parse_frame_name("H-R-S-1000000000-16.gwf").is_none());
    }

    #[test]
    fn rejects_non_numeric_gps_fields() {
        assert!(parse_frame_name("H-R-abc-16.gwf").is_none());
        assert!(parse_frame_name("H-R-1000000000-xyz.gwf").is_none());
    }

    #[test]
    fn rejects_empty_extension_or_extra_dot() {
        assert!(parse_frame_name("H-R-1000000000-16.").is_none());
        assert!(parse_frame_name("H-R-1000000000-16.tar.gz").is_none());
    }

    #[test]
    fn rejects_empty_site_or_frametype() {
        assert!(parse_frame_name("-R-1000000000-16.gwf").is_none());
        assert!(parse_frame_name("H--1000000000-16.gwf").is_none());
    }

    #[test]
    fn rejects_negative_looking_numbers() {
        assert!(parse_frame_name("H-R--1-16.gwf").is_none());
    }
}
