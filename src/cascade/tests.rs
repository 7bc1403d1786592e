use super::*;
use std::collections::HashSet;

/// Deterministic 64-char hex identifiers, disjoint across tags.
fn make_ids(count: usize, tag: u8) -> HashSet<String> {
    (0..count)
        .map(|i| {
            let mut bytes = [0u8; 32];
            bytes[0] = tag;
            bytes[24..].copy_from_slice(&(i as u64).to_be_bytes());
            hex::encode(bytes)
        })
        .collect()
}

fn test_salt() -> String {
    hex::encode([0x5a; 32])
}

// ===== Construction and query =====

#[test]
fn test_valid_accepted_revoked_rejected() {
    let valid = make_ids(1000, 1);
    let revoked = make_ids(2000, 2);

    let cascade = Cascade::from_sets(&valid, &revoked, 1000).unwrap();

    for id in &valid {
        assert!(cascade.has(id), "valid id rejected: {}", id);
    }
    for id in &revoked {
        assert!(!cascade.has(id), "revoked id accepted: {}", id);
    }
    assert!(cascade.depth() <= 40, "depth {} too deep", cascade.depth());
}

#[test]
fn test_classification_with_padding() {
    // Both sets well below their targets, so most members are padding.
    let valid = make_ids(20, 1);
    let revoked = make_ids(30, 2);

    let cascade = Cascade::from_sets(&valid, &revoked, 50).unwrap();

    for id in &valid {
        assert!(cascade.has(id));
    }
    for id in &revoked {
        assert!(!cascade.has(id));
    }
}

#[test]
fn test_exact_capacity_needs_no_padding() {
    let valid = make_ids(50, 1);
    let revoked = make_ids(100, 2);

    let cascade = Cascade::from_sets(&valid, &revoked, 50).unwrap();

    for id in &valid {
        assert!(cascade.has(id));
    }
    for id in &revoked {
        assert!(!cascade.has(id));
    }
}

#[test]
fn test_capacity_exceeded() {
    let valid = make_ids(1000, 1);
    let revoked = make_ids(2000, 2);

    let result = Cascade::from_sets(&valid, &revoked, 900);
    assert!(matches!(
        result,
        Err(CascadeError::CapacityExceeded {
            valid: 1000,
            revoked: 2000,
            r_hat: 900,
        })
    ));

    // Revoked side over 2 * r_hat fails too.
    let result = Cascade::from_sets(&make_ids(10, 1), &make_ids(300, 2), 100);
    assert!(matches!(result, Err(CascadeError::CapacityExceeded { .. })));
}

#[test]
fn test_empty_sets_build_from_padding_alone() {
    let cascade = Cascade::from_sets(&HashSet::new(), &HashSet::new(), 1).unwrap();
    assert!(cascade.depth() >= 1);
}

#[test]
fn test_single_member_depth_one() {
    let valid = make_ids(1, 1);
    let id = valid.iter().next().unwrap().clone();

    let cascade = Cascade::build(valid, HashSet::new(), test_salt()).unwrap();

    assert_eq!(cascade.depth(), 1);
    assert!(
        cascade.layers()[0].contains(level_key(&id, 1, cascade.salt()).as_bytes())
    );
    assert!(cascade.has(&id));
}

#[test]
fn test_empty_valid_set_yields_no_layers() {
    let cascade = Cascade::build(HashSet::new(), make_ids(5, 2), test_salt()).unwrap();

    assert_eq!(cascade.depth(), 0);
    // Depth 0 is even, so every query answers false.
    assert!(!cascade.has(&make_ids(1, 1).into_iter().next().unwrap()));
}

#[test]
fn test_deterministic_rebuild() {
    let valid = make_ids(200, 1);
    let revoked = make_ids(400, 2);

    let first = Cascade::build(valid.clone(), revoked.clone(), test_salt()).unwrap();
    let second = Cascade::build(valid, revoked, test_salt()).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.depth(), second.depth());
}

#[test]
fn test_layer_membership_and_false_positive_promotion() {
    let valid = make_ids(500, 1);
    let revoked = make_ids(1000, 2);

    let cascade = Cascade::build(valid.clone(), revoked.clone(), test_salt()).unwrap();
    let salt = cascade.salt();

    // Layer 0 contains every valid id under the level-1 key.
    for id in &valid {
        assert!(cascade.layers()[0].contains(level_key(id, 1, salt).as_bytes()));
    }

    // Every revoked id that slips through layer 0 was inserted into layer 1.
    let false_positives: Vec<&String> = revoked
        .iter()
        .filter(|id| cascade.layers()[0].contains(level_key(id, 1, salt).as_bytes()))
        .collect();
    assert!(
        !false_positives.is_empty(),
        "expected layer-0 false positives at this size"
    );
    assert!(cascade.depth() >= 2);
    for id in false_positives {
        assert!(cascade.layers()[1].contains(level_key(id, 2, salt).as_bytes()));
    }
}

#[test]
fn test_layer_sizing() {
    // ceil(-n * ln(p) / (ln 2)^2)
    assert_eq!(optimal_num_bits(1, DEEPER_LAYER_FP_RATE), 2);
    assert_eq!(optimal_num_bits(1, FIRST_LAYER_FP_RATE), 3);
    assert_eq!(optimal_num_bits(1000, DEEPER_LAYER_FP_RATE), 1443);

    let valid = make_ids(100, 1);
    let cascade = Cascade::build(valid, HashSet::new(), test_salt()).unwrap();
    assert_eq!(
        cascade.layers()[0].num_bits(),
        optimal_num_bits(100, FIRST_LAYER_FP_RATE)
    );
}

#[test]
fn test_level_key_encoding() {
    assert_eq!(level_key("ab", 1, "cd"), "ab00000001cd");
    assert_eq!(level_key("ab", 5, "cd"), "ab00000101cd");
    assert_eq!(level_key("", 255, ""), "11111111");
    // Levels of 256 and above widen past eight characters.
    assert_eq!(level_key("", 256, ""), "100000000");
}

// ===== Serialization =====

#[test]
fn test_round_trip() {
    let valid = make_ids(1000, 1);
    let revoked = make_ids(2000, 2);

    let cascade = Cascade::from_sets(&valid, &revoked, 3000).unwrap();
    let restored = Cascade::from_hex(&cascade.to_hex()).unwrap();

    assert_eq!(cascade, restored);
    assert_eq!(cascade.salt(), restored.salt());
    assert_eq!(cascade.depth(), restored.depth());
    for id in valid.iter().chain(revoked.iter()) {
        assert_eq!(cascade.has(id), restored.has(id));
    }
}

#[test]
fn test_trailing_zeros_tolerated() {
    let valid = make_ids(100, 1);
    let revoked = make_ids(200, 2);
    let cascade = Cascade::from_sets(&valid, &revoked, 150).unwrap();
    let serialized = cascade.to_hex();

    // 16 zero bytes: a whole zero layer header plus padding.
    let padded = format!("{}{}", serialized, "00".repeat(16));
    assert_eq!(Cascade::from_hex(&padded).unwrap(), cascade);

    // A single zero byte, shorter than a layer header.
    let padded = format!("{}00", serialized);
    assert_eq!(Cascade::from_hex(&padded).unwrap(), cascade);
}

#[test]
fn test_wire_layout() {
    let valid: HashSet<String> = make_ids(1, 1);
    let cascade = Cascade::build(valid, HashSet::new(), test_salt()).unwrap();
    let serialized = cascade.to_hex();

    assert!(serialized.starts_with("0x"));
    // Salt occupies the first 32 bytes after the prefix.
    assert_eq!(&serialized[2..66], test_salt());

    // Layer header is the bit count as big-endian u32.
    let layer = &cascade.layers()[0];
    let header = u32::from_be_bytes(
        hex::decode(&serialized[66..74]).unwrap().try_into().unwrap(),
    );
    assert_eq!(header, layer.num_bits());

    // Words follow in little-endian byte order, then the string ends.
    let word_hex = &serialized[74..];
    assert_eq!(word_hex.len(), layer.num_words() * 8);
    assert_eq!(&word_hex[..8], hex::encode(layer.words()[0].to_le_bytes()));
}

#[test]
fn test_salt_only_round_trip() {
    let serialized = format!("0x{}", test_salt());
    let cascade = Cascade::from_hex(&serialized).unwrap();

    assert_eq!(cascade.depth(), 0);
    assert_eq!(cascade.salt(), test_salt());
    assert_eq!(cascade.to_hex(), serialized);
}

#[test]
fn test_from_hex_rejects_bad_input() {
    // Missing prefix.
    assert!(matches!(
        Cascade::from_hex("deadbeef"),
        Err(CascadeError::MissingPrefix)
    ));

    // Odd-length hex.
    assert!(matches!(
        Cascade::from_hex("0xabc"),
        Err(CascadeError::InvalidHex(_))
    ));

    // Non-hex characters.
    assert!(matches!(
        Cascade::from_hex("0xzzzz"),
        Err(CascadeError::InvalidHex(_))
    ));

    // Nothing after the prefix.
    assert!(matches!(
        Cascade::from_hex("0x"),
        Err(CascadeError::TruncatedSalt(0))
    ));

    // Shorter than the salt.
    assert!(matches!(
        Cascade::from_hex(&format!("0x{}", "00".repeat(16))),
        Err(CascadeError::TruncatedSalt(16))
    ));
}

#[test]
fn test_from_hex_rejects_truncated_layer() {
    // Header declares 64 bits (two words) but only one word follows.
    let serialized = format!("0x{}00000040aabbccdd", test_salt());
    assert!(matches!(
        Cascade::from_hex(&serialized),
        Err(CascadeError::TruncatedLayer {
            level: 1,
            needed: 8,
            available: 4,
        })
    ));

    // A nonzero header fragment shorter than four bytes.
    let serialized = format!("0x{}0000ff", test_salt());
    assert!(matches!(
        Cascade::from_hex(&serialized),
        Err(CascadeError::TruncatedLayer {
            level: 1,
            needed: 4,
            available: 3,
        })
    ));
}
