use super::*;

#[test]
fn test_fnv1a64_reference_values() {
    // Offset basis for the empty string, and the classic single-byte
    // check: fnv1a64("a") = (offset ^ 0x61) * prime.
    assert_eq!(fnv1a64(""), FNV_OFFSET);
    assert_eq!(
        fnv1a64("a"),
        (FNV_OFFSET ^ 0x61).wrapping_mul(FNV_PRIME)
    );
}

#[test]
fn test_ids_compose_symbolic_names() {
    assert_eq!(module_id("sample.core"), fnv1a64("sample.core"));
    assert_eq!(
        interface_id("sample.core", "Echo"),
        fnv1a64("sample.core.Echo")
    );
    assert_eq!(
        method_id("sample.core", "Echo", "Ping"),
        fnv1a64("sample.core.Echo.Ping")
    );
}

#[test]
fn test_distinct_names_distinct_ids() {
    let ids = [
        module_id("sample"),
        interface_id("sample", "Echo"),
        method_id("sample", "Echo", "Ping"),
        method_id("sample", "Echo", "Pong"),
    ];
    for (i, left) in ids.iter().enumerate() {
        for right in &ids[i + 1..] {
            assert_ne!(left, right);
        }
    }
}
