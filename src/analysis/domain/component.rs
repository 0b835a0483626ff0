use crate::analysis::domain::FirmwareImage;
use serde::Serialize;
use std::fmt;

/// Classification of an embedded region found by signature scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComponentKind {
    Filesystem,
    Kernel,
    Bootloader,
    Archive,
    Certificate,
    DeviceTree,
    Executable,
}

impl ComponentKind {
    /// Human-readable label used in CLI listings and exports.
    pub fn label(&self) -> &'static str {
        match self {
            ComponentKind::Filesystem => "filesystem",
            ComponentKind::Kernel => "kernel",
            ComponentKind::Bootloader => "bootloader",
            ComponentKind::Archive => "archive",
            ComponentKind::Certificate => "certificate",
            ComponentKind::DeviceTree => "device-tree",
            ComponentKind::Executable => "executable",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// How sure the extractor is that a match is real.
///
/// `High` means both the header and a trailer or embedded length field
/// validated; `Low` means a header-only heuristic match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Low,
}

/// A region of the firmware image claimed by one signature rule.
///
/// Holds only offsets into the image; `slice` borrows the underlying bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedComponent {
    pub kind: ComponentKind,
    pub offset: usize,
    pub length: usize,
    pub confidence: Confidence,
    /// Set when this component's byte range overlaps another accepted
    /// component, so storage totals are not double counted.
    pub nested: bool,
    /// Id of the signature rule that produced this component.
    pub rule_id: &'static str,
}

impl ExtractedComponent {
    /// Builds a component, enforcing `offset + length <= image_len`.
    /// Returns `None` for candidates that would overrun the image.
    pub fn new(
        kind: ComponentKind,
        offset: usize,
        length: usize,
        confidence: Confidence,
        rule_id: &'static str,
        image_len: usize,
    ) -> Option<Self> {
        if length == 0 || offset.checked_add(length)? > image_len {
            return None;
        }
        Some(Self {
            kind,
            offset,
            length,
            confidence,
            nested: false,
            rule_id,
        })
    }

    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    /// Borrowed view of this component's bytes within the image.
    pub fn slice<'a>(&self, image: &'a FirmwareImage) -> &'a [u8] {
        &image.bytes()[self.offset..self.end()]
    }

    /// True when `other`'s byte range lies fully inside this component.
    pub fn contains(&self, other: &Self) -> bool {
        self.offset <= other.offset && other.end() <= self.end()
    }

    /// True when the two byte ranges share at least one byte.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.offset < other.end() && other.offset < self.end()
    }
}
