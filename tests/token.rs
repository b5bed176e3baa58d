use std::collections::HashSet;

use qrseal::{KdfParams, Payload, TokenError, decode, decode_with_kdf, encode, encode_with_kdf};
use serde_json::json;

fn cheap() -> KdfParams {
    KdfParams::new(16, 8, 1).unwrap()
}

fn demo_payload() -> Payload {
    let mut p = Payload::new();
    p.insert("sub".into(), json!("demo"));
    p.insert("iat".into(), json!("2024-01-01T00:00:00+00:00"));
    p
}

/// Decodes a base64url field, flips one bit of one byte, re-encodes it.
fn flip_field(token: &str, field: usize, byte: usize) -> String {
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
    let mut raw = URL_SAFE_NO_PAD.decode(&parts[field]).unwrap();
    raw[byte] ^= 0x01;
    parts[field] = URL_SAFE_NO_PAD.encode(&raw);
    parts.join(".")
}

#[test]
fn concrete_scenario_with_default_parameters() {
    let passphrase = "correct horse battery staple";

    let token = encode(&demo_payload(), passphrase).unwrap();
    assert!(token.starts_with("v1."));
    let fields: Vec<&str> = token.split('.').collect();
    assert_eq!(fields.len(), 4);
    assert!(fields.iter().all(|f| !f.is_empty()));

    let decoded = decode(&token, passphrase).unwrap();
    assert_eq!(decoded, demo_payload());
    assert_eq!(
        serde_json::to_string(&decoded).unwrap(),
        r#"{"sub":"demo","iat":"2024-01-01T00:00:00+00:00"}"#
    );

    assert!(matches!(
        decode(&token, "wrong"),
        Err(TokenError::AuthenticationFailed)
    ));
}

#[test]
fn token_is_url_safe() {
    let token = encode_with_kdf(&demo_payload(), "pw", cheap()).unwrap();
    assert!(
        token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    );
}

#[test]
fn tampering_any_field_fails_authentication() {
    let token = encode_with_kdf(&demo_payload(), "pw", cheap()).unwrap();
    let ct_len = token.split('.').nth(3).unwrap().len() * 3 / 4;

    let cases = [
        (1, 0),
        (1, 15),
        (2, 0),
        (2, 11),
        (3, 0),
        (3, ct_len / 2),
        (3, ct_len - 1),
    ];
    for (field, byte) in cases {
        let tampered = flip_field(&token, field, byte);
        assert!(
            matches!(
                decode_with_kdf(&tampered, "pw", cheap()),
                Err(TokenError::AuthenticationFailed)
            ),
            "field {field} byte {byte}"
        );
    }
}

#[test]
fn wrong_passphrase_fails_authentication() {
    let token = encode_with_kdf(&demo_payload(), "s1", cheap()).unwrap();
    for other in ["s2", "S1", "s1 ", "s"] {
        assert!(matches!(
            decode_with_kdf(&token, other, cheap()),
            Err(TokenError::AuthenticationFailed)
        ));
    }
}

#[test]
fn wrong_kdf_parameters_fail_authentication() {
    let token = encode_with_kdf(&demo_payload(), "pw", cheap()).unwrap();
    let other = KdfParams::new(16, 4, 1).unwrap();

    assert!(matches!(
        decode_with_kdf(&token, "pw", other),
        Err(TokenError::AuthenticationFailed)
    ));
}

#[test]
fn unknown_version_is_rejected_even_when_decryptable() {
    let token = encode_with_kdf(&demo_payload(), "pw", cheap()).unwrap();
    let rest = token.strip_prefix("v1").unwrap();

    for version in ["v2", "V1", "v0", "1"] {
        let relabeled = format!("{version}{rest}");
        match decode_with_kdf(&relabeled, "pw", cheap()) {
            Err(TokenError::UnsupportedVersion(v)) => assert_eq!(v, version),
            other => panic!("{version}: unexpected {other:?}"),
        }
    }
}

#[test]
fn malformed_shapes_are_format_errors() {
    let token = encode_with_kdf(&demo_payload(), "pw", cheap()).unwrap();
    let fields: Vec<&str> = token.split('.').collect();

    let bad = [
        String::new(),
        "v1".to_string(),
        fields[..3].join("."),
        format!("{token}.extra"),
        format!("{}.{}.{}.", fields[0], fields[1], fields[2]),
        format!("{}.{}+.{}.{}", fields[0], fields[1], fields[2], fields[3]),
        format!("{}.{}.{}.{}/", fields[0], fields[1], fields[2], fields[3]),
        format!("{}.{}.{}.{}", fields[0], &fields[1][..20], fields[2], fields[3]),
        format!("{}.{}.{}A.{}", fields[0], fields[1], fields[2], fields[3]),
    ];

    for token in &bad {
        let err = decode_with_kdf(token, "pw", cheap()).unwrap_err();
        assert!(
            matches!(err, TokenError::MalformedToken(_)),
            "{token:?}: {err:?}"
        );
        assert!(err.is_format_error());
    }
}

#[test]
fn padded_fields_are_accepted() {
    let token = encode_with_kdf(&demo_payload(), "pw", cheap()).unwrap();
    let padded: Vec<String> = token
        .split('.')
        .enumerate()
        .map(|(i, f)| {
            if i == 0 {
                f.to_string()
            } else {
                format!("{f}{}", "=".repeat((4 - f.len() % 4) % 4))
            }
        })
        .collect();

    let decoded = decode_with_kdf(&padded.join("."), "pw", cheap()).unwrap();
    assert_eq!(decoded, demo_payload());
}

#[test]
fn empty_passphrase_is_missing_secret() {
    assert!(matches!(
        encode_with_kdf(&demo_payload(), "", cheap()),
        Err(TokenError::MissingSecret)
    ));

    let token = encode_with_kdf(&demo_payload(), "pw", cheap()).unwrap();
    assert!(matches!(
        decode_with_kdf(&token, "", cheap()),
        Err(TokenError::MissingSecret)
    ));
}

#[test]
fn successive_tokens_never_repeat() {
    let payload = demo_payload();
    let mut tokens = HashSet::new();
    let mut salts = HashSet::new();
    let mut nonces = HashSet::new();

    for _ in 0..10_000 {
        let token = encode_with_kdf(&payload, "pw", cheap()).unwrap();
        let fields: Vec<&str> = token.split('.').collect();

        assert!(salts.insert(fields[1].to_string()));
        assert!(nonces.insert(fields[2].to_string()));
        assert!(tokens.insert(token));
    }
}

#[test]
fn concurrent_encode_decode() {
    let handles: Vec<_> = (0..8)
        .map(|i| {
            std::thread::spawn(move || {
                let mut p = Payload::new();
                p.insert("worker".into(), json!(i));
                let pass = format!("pass-{i}");

                for _ in 0..25 {
                    let token = encode_with_kdf(&p, &pass, cheap()).unwrap();
                    assert_eq!(decode_with_kdf(&token, &pass, cheap()).unwrap(), p);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}
