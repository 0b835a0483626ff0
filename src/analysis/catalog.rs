//! Static catalog of binary signatures the extractor scans for.
//!
//! Each rule pairs a magic byte pattern with a boundary policy that decides
//! how far the matched component extends. The catalog is loaded once per
//! process and indexed by the first magic byte so the scan loop only tests
//! rules that could start at the current offset.

use crate::analysis::domain::ComponentKind;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

/// How a rule determines the length of a matched component.
#[derive(Debug, Clone, Copy)]
pub enum Boundary {
    /// The component has a fixed size.
    Fixed(usize),
    /// Length is read from a field inside the component. `adjust` is added
    /// to the field value for formats whose field excludes the header.
    LengthField {
        offset: usize,
        width: usize,
        endian: Endian,
        adjust: usize,
    },
    /// The component ends right after this trailer pattern.
    Trailer(&'static [u8]),
    /// Header-only heuristic: the component runs until the next signature
    /// match or the end of the image. Resolved by the extractor.
    UntilNextMatch,
}

/// One signature in the catalog.
#[derive(Debug)]
pub struct SignatureRule {
    pub id: &'static str,
    pub kind: ComponentKind,
    pub magic: &'static [u8],
    /// Offset of the magic within the component. A match at scan position
    /// `p` means the component starts at `p - magic_offset`.
    pub magic_offset: usize,
    /// Smallest plausible component size for this format.
    pub min_len: usize,
    /// Overlap resolution rank. More specific signatures (a filesystem
    /// superblock) outrank generic containers (a raw gzip member).
    pub priority: u8,
    pub boundary: Boundary,
}

impl SignatureRule {
    /// Resolves the component length at `start`, when the boundary policy
    /// can decide it locally. Returns `None` for `UntilNextMatch` rules and
    /// for corrupt candidates (length field pointing past the image).
    pub fn resolve_length(&self, image: &[u8], start: usize) -> Option<usize> {
        let length = match self.boundary {
            Boundary::Fixed(len) => len,
            Boundary::LengthField {
                offset,
                width,
                endian,
                adjust,
            } => {
                let field_start = start.checked_add(offset)?;
                let field = image.get(field_start..field_start + width)?;
                let value = read_uint(field, endian)?;
                usize::try_from(value).ok()?.checked_add(adjust)?
            }
            Boundary::Trailer(trailer) => {
                let tail = &image[start..];
                let at = find(tail, trailer, self.magic.len())?;
                at + trailer.len()
            }
            Boundary::UntilNextMatch => return None,
        };

        if length < self.min_len || start.checked_add(length)? > image.len() {
            return None;
        }
        Some(length)
    }
}

fn read_uint(bytes: &[u8], endian: Endian) -> Option<u64> {
    if bytes.len() > 8 {
        return None;
    }
    let mut value: u64 = 0;
    match endian {
        Endian::Big => {
            for &b in bytes {
                value = (value << 8) | u64::from(b);
            }
        }
        Endian::Little => {
            for &b in bytes.iter().rev() {
                value = (value << 8) | u64::from(b);
            }
        }
    }
    Some(value)
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() || haystack.len() < from + needle.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}

/// The built-in rule set. Mirrors the formats commonly seen in consumer
/// IoT firmware: filesystem superblocks, bootloader image headers, kernel
/// images, flattened device trees, generic compressed containers, and
/// embedded certificates.
const RULES: &[SignatureRule] = &[
    SignatureRule {
        id: "squashfs-le",
        kind: ComponentKind::Filesystem,
        magic: b"hsqs",
        magic_offset: 0,
        min_len: 96,
        priority: 80,
        // bytes_used, u64 at superblock offset 40
        boundary: Boundary::LengthField {
            offset: 40,
            width: 8,
            endian: Endian::Little,
            adjust: 0,
        },
    },
    SignatureRule {
        id: "squashfs-be",
        kind: ComponentKind::Filesystem,
        magic: b"sqsh",
        magic_offset: 0,
        min_len: 96,
        priority: 80,
        boundary: Boundary::LengthField {
            offset: 40,
            width: 8,
            endian: Endian::Big,
            adjust: 0,
        },
    },
    SignatureRule {
        id: "cramfs",
        kind: ComponentKind::Filesystem,
        magic: b"\x45\x3d\xcd\x28",
        magic_offset: 0,
        min_len: 64,
        priority: 80,
        // total size, u32 at offset 4
        boundary: Boundary::LengthField {
            offset: 4,
            width: 4,
            endian: Endian::Little,
            adjust: 0,
        },
    },
    SignatureRule {
        id: "jffs2-node",
        kind: ComponentKind::Filesystem,
        magic: b"\x85\x19\x02\xe0",
        magic_offset: 0,
        min_len: 12,
        priority: 60,
        boundary: Boundary::UntilNextMatch,
    },
    SignatureRule {
        id: "uboot-legacy",
        kind: ComponentKind::Bootloader,
        magic: b"\x27\x05\x19\x56",
        magic_offset: 0,
        min_len: 64,
        priority: 90,
        // data size, u32 BE at offset 12; the 64-byte header is excluded
        boundary: Boundary::LengthField {
            offset: 12,
            width: 4,
            endian: Endian::Big,
            adjust: 64,
        },
    },
    SignatureRule {
        id: "arm-zimage",
        kind: ComponentKind::Kernel,
        // zImage magic 0x016f2818 sits at offset 36 of the kernel image
        magic: b"\x18\x28\x6f\x01",
        magic_offset: 36,
        min_len: 44,
        priority: 90,
        boundary: Boundary::UntilNextMatch,
    },
    SignatureRule {
        id: "device-tree",
        kind: ComponentKind::DeviceTree,
        magic: b"\xd0\x0d\xfe\xed",
        magic_offset: 0,
        min_len: 40,
        priority: 85,
        // totalsize, u32 BE at offset 4
        boundary: Boundary::LengthField {
            offset: 4,
            width: 4,
            endian: Endian::Big,
            adjust: 0,
        },
    },
    SignatureRule {
        id: "gzip",
        kind: ComponentKind::Archive,
        magic: b"\x1f\x8b\x08",
        magic_offset: 0,
        min_len: 18,
        priority: 20,
        boundary: Boundary::UntilNextMatch,
    },
    SignatureRule {
        id: "xz",
        kind: ComponentKind::Archive,
        magic: b"\xfd\x37\x7a\x58\x5a\x00",
        magic_offset: 0,
        min_len: 32,
        priority: 30,
        boundary: Boundary::UntilNextMatch,
    },
    SignatureRule {
        id: "elf",
        kind: ComponentKind::Executable,
        magic: b"\x7f\x45\x4c\x46",
        magic_offset: 0,
        min_len: 52,
        priority: 50,
        boundary: Boundary::UntilNextMatch,
    },
    SignatureRule {
        id: "pem-certificate",
        kind: ComponentKind::Certificate,
        magic: b"-----BEGIN CERTIFICATE-----",
        magic_offset: 0,
        min_len: 60,
        priority: 70,
        boundary: Boundary::Trailer(b"-----END CERTIFICATE-----"),
    },
    SignatureRule {
        id: "der-certificate",
        kind: ComponentKind::Certificate,
        magic: b"\x30\x82",
        magic_offset: 0,
        min_len: 64,
        priority: 10,
        // ASN.1 long-form length, u16 BE after the 2 magic bytes
        boundary: Boundary::LengthField {
            offset: 2,
            width: 2,
            endian: Endian::Big,
            adjust: 4,
        },
    },
];

/// Process-wide, read-only signature catalog with a first-byte index.
pub struct SignatureCatalog {
    rules: &'static [SignatureRule],
    index: Vec<Vec<&'static SignatureRule>>,
    min_component_len: usize,
}

impl SignatureCatalog {
    fn build(rules: &'static [SignatureRule]) -> Self {
        let mut index: Vec<Vec<&'static SignatureRule>> = vec![Vec::new(); 256];
        for rule in rules {
            index[rule.magic[0] as usize].push(rule);
        }
        let min_component_len = rules.iter().map(|r| r.min_len).min().unwrap_or(0);
        Self {
            rules,
            index,
            min_component_len,
        }
    }

    /// The shared catalog, built on first use and read-only thereafter.
    pub fn global() -> &'static SignatureCatalog {
        static CATALOG: OnceLock<SignatureCatalog> = OnceLock::new();
        CATALOG.get_or_init(|| SignatureCatalog::build(RULES))
    }

    pub fn rules(&self) -> &'static [SignatureRule] {
        self.rules
    }

    /// Rules whose magic starts with `byte`.
    pub fn rules_for_first_byte(&self, byte: u8) -> &[&'static SignatureRule] {
        &self.index[byte as usize]
    }

    /// The smallest `min_len` across all rules. Images shorter than this
    /// cannot contain any component.
    pub fn min_component_len(&self) -> usize {
        self.min_component_len
    }
}
