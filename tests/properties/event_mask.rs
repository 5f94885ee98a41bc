//! Property tests for the enabled-kind mask.

use proptest::prelude::*;

use hobbes::{EventKind, EventMask};

fn kind() -> impl Strategy<Value = EventKind> {
    prop_oneof![
        Just(EventKind::Created),
        Just(EventKind::Changed),
        Just(EventKind::Renamed),
        Just(EventKind::Deleted),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: display then parse_list reproduces the mask.
    #[test]
    fn property_mask_display_parse_round_trips(kinds in proptest::collection::vec(kind(), 0..=8)) {
        let mask = EventMask::from_kinds(&kinds);
        prop_assert_eq!(EventMask::parse_list(&mask.to_string()), mask);
    }

    /// PROPERTY: a mask contains exactly the kinds it was built from.
    #[test]
    fn property_mask_membership(kinds in proptest::collection::vec(kind(), 0..=8)) {
        let mask = EventMask::from_kinds(&kinds);
        for k in EventKind::ALL_KINDS {
            prop_assert_eq!(mask.contains(k), kinds.contains(&k));
        }
    }

    /// PROPERTY: parse_list never panics on arbitrary text and only ever
    /// yields known kinds.
    #[test]
    fn property_parse_list_never_panics(s in "(?s).{0,128}") {
        let mask = EventMask::parse_list(&s);
        prop_assert!(mask.kinds().len() <= 4);
    }
}
