/// Integration-level tests for the `shared` crate.
///
/// Each section tests one module; unit tests that are tightly coupled to
/// private helpers live inside the modules themselves (see `#[cfg(test)]`
/// blocks in `jwt.rs`, `role.rs` and `server_config.rs`).
// ---------------------------------------------------------------------------
// JWT claims
// ---------------------------------------------------------------------------
#[cfg(test)]
mod jwt_tests {
    use shared::types::*;

    fn sample_claims() -> JwtClaims {
        JwtClaims {
            sub: "alice".to_string(),
            user_id: 42,
            role: Role::User,
            email: "alice@example.com".to_string(),
            exp: 9_999_999_999,
            iat: 1_700_000_000,
        }
    }

    #[test]
    fn claims_serialize_and_deserialize_roundtrip() {
        let c = sample_claims();
        let json = serde_json::to_string(&c).unwrap();
        let back: JwtClaims = serde_json::from_str(&json).unwrap();
        assert_eq!(back.sub, c.sub);
        assert_eq!(back.user_id, c.user_id);
        assert_eq!(back.role, c.role);
        assert_eq!(back.email, c.email);
        assert_eq!(back.exp, c.exp);
        assert_eq!(back.iat, c.iat);
    }

    #[test]
    fn claims_json_contains_expected_keys() {
        let json = serde_json::to_value(sample_claims()).unwrap();
        for key in &["sub", "user_id", "role", "email", "exp", "iat"] {
            assert!(json.get(key).is_some(), "missing key: {}", key);
        }
    }

    #[test]
    fn admin_claims_carry_admin_role() {
        let mut c = sample_claims();
        c.role = Role::Admin;
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["role"], "admin");
    }
}

// ---------------------------------------------------------------------------
// Error envelope
// ---------------------------------------------------------------------------
#[cfg(test)]
mod error_envelope_tests {
    use shared::types::ErrorResponse;

    #[test]
    fn error_response_has_fixed_status() {
        let e = ErrorResponse::new("OWNERSHIP_DENIED", "Access forbidden");
        assert_eq!(e.status, "error");
        assert_eq!(e.code, "OWNERSHIP_DENIED");
        assert_eq!(e.message, "Access forbidden");
    }
}

// ---------------------------------------------------------------------------
// Device / sensor wire types
// ---------------------------------------------------------------------------
#[cfg(test)]
mod device_wire_tests {
    use shared::types::*;

    #[test]
    fn reading_body_has_no_device_id_field() {
        // The ingest endpoint attributes readings to the authenticated
        // device. A body that tries to smuggle a device_id still parses —
        // the field simply does not exist on the type.
        let data: ReadingData =
            serde_json::from_str(r#"{"bpm":72.0,"spo2":98.2,"temp":36.6,"device_id":999}"#)
                .unwrap();
        assert_eq!(data.bpm, 72.0);
        assert_eq!(data.spo2, 98.2);
        assert_eq!(data.temp, 36.6);
    }

    #[test]
    fn device_update_fields_are_optional() {
        let data: DeviceUpdateData = serde_json::from_str(r#"{"delay":30}"#).unwrap();
        assert_eq!(data.delay, Some(30));
        assert!(data.current_state.is_none());
    }
}
