/// Submission format declared by the caller in the `Build-Version` header.
///
/// Old clients can only vote for a single menu and cannot express points, so
/// their submissions get an implicit single point. The header is parsed once
/// at the boundary; the engine only ever sees the variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Protocol {
    /// Major version 1: one menu id, points ignored.
    Legacy,
    /// Everything else, including a missing or malformed header: up to three
    /// menu ids ranked with distinct points 1-3.
    Current,
}

impl Protocol {
    /// A header counts as legacy only when it carries a `1.` major-version
    /// prefix. Any other value falls through to [`Protocol::Current`], which
    /// keeps unknown future versions and absent headers on the newest rules.
    pub fn from_header(value: Option<&str>) -> Self {
        match value {
            Some(version) if version.starts_with("1.") => Protocol::Legacy,
            _ => Protocol::Current,
        }
    }
}
