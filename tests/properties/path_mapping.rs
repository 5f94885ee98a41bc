//! Property tests for source-to-destination path mapping.

use std::path::{Path, PathBuf};

use proptest::prelude::*;

use hobbes::PathMapper;

/// Path segments drawn from names that show up in real trees: plain
/// ASCII, spaces, percent signs, `#`, `&`, `+`, and non-ASCII.
fn segment() -> impl Strategy<Value = String> {
    let plain = proptest::string::string_regex("[A-Za-z0-9._-]{1,12}").unwrap();
    let spiky = prop_oneof![
        Just("with space".to_string()),
        Just("100% done".to_string()),
        Just("#4 & co".to_string()),
        Just("a+b".to_string()),
        Just("résumé".to_string()),
        Just("ドキュメント".to_string()),
    ];
    prop_oneof![3 => plain, 1 => spiky]
}

fn relative_path() -> impl Strategy<Value = PathBuf> {
    proptest::collection::vec(segment(), 1..=5).prop_map(|segments| segments.iter().collect())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: mapping to the destination and back reproduces the
    /// original source path, including reserved and non-ASCII names.
    #[test]
    fn property_mapping_round_trips(relative in relative_path()) {
        let mapper = PathMapper::new("/data/source", "/backup/dest");
        let original = Path::new("/data/source").join(&relative);

        let mapped = mapper.to_destination(&original).unwrap();
        prop_assert_eq!(&mapped, &Path::new("/backup/dest").join(&relative));

        let back = mapper.to_source(&mapped).unwrap();
        prop_assert_eq!(back, original);
    }

    /// PROPERTY: relativize keeps the relative structure intact.
    #[test]
    fn property_relativize_preserves_components(relative in relative_path()) {
        let mapper = PathMapper::new("/data/source", "/backup/dest");
        let full = Path::new("/data/source").join(&relative);

        prop_assert_eq!(mapper.relativize(&full).unwrap(), relative);
    }

    /// PROPERTY: mapping never panics, whatever the input path looks like.
    #[test]
    fn property_mapping_never_panics(s in "(?s).{0,256}") {
        let mapper = PathMapper::new("/data/source", "/backup/dest");
        let _ = mapper.to_destination(Path::new(&s));
        let _ = mapper.to_source(Path::new(&s));
        let _ = mapper.relativize(Path::new(&s));
    }

    /// PROPERTY: paths outside the source root are always rejected.
    #[test]
    fn property_foreign_roots_rejected(relative in relative_path()) {
        let mapper = PathMapper::new("/data/source", "/backup/dest");
        let foreign = Path::new("/somewhere/else").join(&relative);

        prop_assert!(mapper.to_destination(&foreign).is_err());
    }
}
