//! Registry description lookups through the public handle.

use dasterix::Asterix;
use test_utils::fixture_path;

fn decoder() -> Asterix {
    Asterix::init(fixture_path("config", "definitions.ini")).expect("test definitions load")
}

#[test]
fn describe_layers() {
    let decoder = decoder();

    assert_eq!(
        decoder.describe(48, None, None, None).as_deref(),
        Some("Monoradar Target Reports")
    );
    assert_eq!(
        decoder.describe(48, Some("010"), None, None).as_deref(),
        Some("Data Source Identifier")
    );
    assert_eq!(
        decoder
            .describe(48, Some("010"), Some("SAC"), None)
            .as_deref(),
        Some("System Area Code")
    );
    assert_eq!(
        decoder
            .describe(48, Some("020"), Some("TYP"), Some(5))
            .as_deref(),
        Some("Single ModeS Roll-Call")
    );
}

#[test]
fn describe_unresolved_steps_return_none() {
    let decoder = decoder();

    assert_eq!(decoder.describe(47, None, None, None), None);
    assert_eq!(decoder.describe(48, Some("999"), None, None), None);
    assert_eq!(decoder.describe(48, Some("010"), Some("XYZ"), None), None);
    // SAC declares no enumeration, so the value layer resolves nothing.
    assert_eq!(decoder.describe(48, Some("010"), Some("SAC"), Some(1)), None);
    assert_eq!(decoder.describe(48, Some("020"), Some("TYP"), Some(99)), None);
}

#[test]
fn describe_is_pure() {
    let decoder = decoder();
    for _ in 0..3 {
        assert_eq!(
            decoder.describe(48, Some("020"), Some("TYP"), Some(0)).as_deref(),
            Some("No detection")
        );
    }
}

#[test]
fn describe_accepts_item_prefix() {
    let decoder = decoder();
    assert_eq!(
        decoder.describe(48, Some("I010"), None, None),
        decoder.describe(48, Some("010"), None, None)
    );
}

#[test]
fn describe_reaches_nested_formats() {
    let decoder = decoder();
    // SRR lives inside the compound item 130.
    assert_eq!(
        decoder
            .describe(48, Some("130"), Some("SRR"), None)
            .as_deref(),
        Some("Number of received replies for MSSR")
    );
}

#[test]
fn category_definition_bounds() {
    let decoder = decoder();

    assert!(decoder.is_category_defined(48));
    assert!(decoder.is_category_defined(1));
    assert!(!decoder.is_category_defined(47));
    // Category 0 is reserved, 256 is the internal BDS slot.
    assert!(!decoder.is_category_defined(0));
    assert!(!decoder.is_category_defined(256));
    assert!(!decoder.is_category_defined(1000));
}

#[test]
fn descriptors_summary() {
    let decoder = decoder();
    let lines = decoder.descriptors();

    assert!(lines.contains("CAT048:I010:SAC"));
    assert!(lines.contains("CAT048:I240:AID"));
    assert!(lines.contains("CAT001:I020:TYP"));
    // Spare and FX positions never show up.
    assert!(!lines.contains(":spare"));
    assert!(!lines.contains(":FX"));
}
