use shared::types::ProfileUpdateData;

use crate::database::utils;

/// First invalid optional field in a profile update, as an (error code,
/// message) pair ready for the JSON envelope. Both the self-service and the
/// admin update paths run this, so an admin cannot write a username or email
/// the owner could not have set themselves.
pub fn profile_field_error(update: &ProfileUpdateData) -> Option<(&'static str, &'static str)> {
    if let Some(ref username) = update.username {
        if !utils::is_valid_username(username) {
            return Some((
                "INVALID_USERNAME",
                "Username must be 3-20 characters, letters, digits or underscore",
            ));
        }
    }
    if let Some(ref email) = update.email {
        if !utils::is_valid_email(email) {
            return Some(("INVALID_EMAIL", "Email address is not valid"));
        }
    }
    if let Some(ref dob) = update.date_of_birth {
        if !utils::is_valid_date(dob) {
            return Some(("INVALID_DATE", "Date of birth must be YYYY-MM-DD"));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update_with_username(username: &str) -> ProfileUpdateData {
        ProfileUpdateData {
            username: Some(username.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn empty_update_is_valid() {
        assert!(profile_field_error(&ProfileUpdateData::default()).is_none());
    }

    #[test]
    fn bad_username_is_rejected() {
        let (code, _) = profile_field_error(&update_with_username("x")).unwrap();
        assert_eq!(code, "INVALID_USERNAME");

        let (code, _) = profile_field_error(&update_with_username("has spaces")).unwrap();
        assert_eq!(code, "INVALID_USERNAME");
    }

    #[test]
    fn bad_email_is_rejected() {
        let update = ProfileUpdateData {
            email: Some("not-an-email".to_string()),
            ..Default::default()
        };
        assert_eq!(profile_field_error(&update).unwrap().0, "INVALID_EMAIL");
    }

    #[test]
    fn bad_date_is_rejected() {
        let update = ProfileUpdateData {
            date_of_birth: Some("31-12-1999".to_string()),
            ..Default::default()
        };
        assert_eq!(profile_field_error(&update).unwrap().0, "INVALID_DATE");
    }

    #[test]
    fn well_formed_fields_pass() {
        let update = ProfileUpdateData {
            username: Some("alice_2".to_string()),
            email: Some("alice@example.com".to_string()),
            date_of_birth: Some("1990-06-15".to_string()),
            ..Default::default()
        };
        assert!(profile_field_error(&update).is_none());
    }
}
