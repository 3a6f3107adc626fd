//! Tag technologies reported by a Tappy.
//!
//! Tag-detection responses carry a one-byte tag type id. The table maps each
//! id to its NFC Forum type and usable NDEF capacity.

/// One entry of the tag-type catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagType {
    pub id: u8,
    /// NFC Forum tag type (1-4), `0` when unknown, `-1` for proprietary
    /// technologies without a Forum type.
    pub forum_type: i8,
    pub description: &'static str,
    /// NDEF bytes usable on every variant of this technology.
    pub safe_capacity: u32,
    /// NDEF bytes usable on the largest variant.
    pub max_capacity: u32,
}

impl TagType {
    pub fn is_unknown(&self) -> bool {
        self.forum_type == 0
    }

    pub fn is_proprietary(&self) -> bool {
        self.forum_type < 0
    }
}

const fn tag(
    id: u8,
    forum_type: i8,
    description: &'static str,
    safe_capacity: u32,
    max_capacity: u32,
) -> TagType {
    TagType {
        id,
        forum_type,
        description,
        safe_capacity,
        max_capacity,
    }
}

/// Every known tag type, indexed by id.
pub static TAG_TYPES: [TagType; 21] = [
    tag(0, 0, "Unknown tag technology", 0, 0),
    tag(1, 2, "MIFARE Ultralight", 48, 128),
    tag(2, 2, "NTAG 203", 144, 144),
    tag(3, 2, "MIFARE Ultralight C", 48, 48),
    tag(4, -1, "MIFARE Classic 1k", 1024, 1024),
    tag(5, -1, "MIFARE Classic 4k", 4096, 4096),
    tag(6, 4, "MIFARE DESFire EV1 4k", 4096, 4096),
    tag(7, 2, "Generic NFC Forum Type 2", 48, 888),
    tag(8, -1, "MIFARE Plus 2k CL2", 2048, 2048),
    tag(9, -1, "MIFARE Plus 4k CL2", 4096, 4096),
    tag(10, -1, "MIFARE Mini", 320, 320),
    tag(11, 4, "Generic NFC Forum Type 4", 256, 8192),
    tag(12, 4, "MIFARE DESFire EV1 4k", 4096, 4096),
    tag(13, 4, "MIFARE DESFire EV1 8k", 8192, 8192),
    tag(14, 4, "MIFARE DESFire - Unspecified model/capacity", 256, 8192),
    tag(15, 1, "Topaz 512", 454, 454),
    tag(16, 2, "NTAG 210", 48, 48),
    tag(17, 2, "NTAG 212", 128, 128),
    tag(18, 2, "NTAG 213", 144, 144),
    tag(19, 2, "NTAG 215", 504, 504),
    tag(20, 2, "NTAG 216", 888, 888),
];

/// Look up a tag type by id.
pub fn resolve_tag_type(id: u8) -> Option<&'static TagType> {
    TAG_TYPES.get(usize::from(id))
}

pub fn tag_types() -> &'static [TagType] {
    &TAG_TYPES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_match_positions() {
        for (index, tag) in tag_types().iter().enumerate() {
            assert_eq!(usize::from(tag.id), index);
        }
    }

    #[test]
    fn resolve_known_ids() {
        let ntag = resolve_tag_type(18).unwrap();
        assert_eq!(ntag.description, "NTAG 213");
        assert_eq!(ntag.forum_type, 2);
        assert_eq!(ntag.max_capacity, 144);

        let classic = resolve_tag_type(4).unwrap();
        assert!(classic.is_proprietary());
        assert!(resolve_tag_type(0).unwrap().is_unknown());
    }

    #[test]
    fn resolve_unknown_id() {
        assert!(resolve_tag_type(21).is_none());
        assert!(resolve_tag_type(u8::MAX).is_none());
    }

    #[test]
    fn safe_never_exceeds_max() {
        assert!(tag_types().iter().all(|t| t.safe_capacity <= t.max_capacity));
    }
}
