use super::*;

// =============================================================
// Contact decoding
// =============================================================

#[test]
fn contact_decodes_backend_payload() {
    let json = serde_json::json!({
        "id": 7,
        "firstName": "Ada",
        "lastName": "Lovelace",
        "title": "Analyst",
        "phoneNumbers": [{ "id": 1, "phone": "555-0100", "label": "work" }],
        "emailAddresses": [{ "id": 2, "email": "ada@example.com", "label": null }],
        "tags": ["math", "friends"],
        "profileImage": null,
        "isFavorite": true
    });
    let contact: Contact = serde_json::from_value(json).unwrap();
    assert_eq!(contact.id, ContactId(7));
    assert_eq!(contact.full_name(), "Ada Lovelace");
    assert_eq!(contact.phone_numbers[0].label.as_deref(), Some("work"));
    assert_eq!(contact.email_addresses[0].email, "ada@example.com");
    assert_eq!(contact.tags, vec!["math", "friends"]);
    assert!(contact.is_favorite);
}

#[test]
fn contact_missing_optional_fields_default() {
    let contact: Contact = serde_json::from_str(r#"{"id": 3, "firstName": "Solo"}"#).unwrap();
    assert!(contact.phone_numbers.is_empty());
    assert!(contact.tags.is_empty());
    assert!(!contact.is_favorite);
    assert_eq!(contact.full_name(), "Solo");
}

#[test]
fn contact_initials_uppercase() {
    let contact: Contact =
        serde_json::from_str(r#"{"id": 1, "firstName": "grace", "lastName": "hopper"}"#).unwrap();
    assert_eq!(contact.initials(), "GH");
}

#[test]
fn contact_data_skips_absent_image() {
    let data = ContactData { first_name: "A".into(), last_name: "B".into(), ..ContactData::default() };
    let json = serde_json::to_value(&data).unwrap();
    assert!(json.get("profileImage").is_none());
    assert_eq!(json["firstName"], "A");
    assert_eq!(json["isFavorite"], false);
}

// =============================================================
// Identity
// =============================================================

#[test]
fn identity_placeholder_carries_only_email() {
    let identity = Identity::placeholder("a@b.com");
    assert_eq!(identity.email.as_deref(), Some("a@b.com"));
    assert!(identity.id.is_none());
    assert!(identity.first_name.is_none());
}

#[test]
fn identity_display_name_prefers_names() {
    let identity = Identity {
        first_name: Some("Ada".into()),
        last_name: Some("Lovelace".into()),
        email: Some("ada@example.com".into()),
        ..Identity::default()
    };
    assert_eq!(identity.display_name(), "Ada Lovelace");
    assert_eq!(Identity::placeholder("x@y.z").display_name(), "x@y.z");
}

#[test]
fn identity_decodes_profile_dto() {
    let identity: Identity = serde_json::from_str(
        r#"{"id": 12, "email": "u@x.io", "phoneNumber": "1", "firstName": "U", "lastName": "X"}"#,
    )
    .unwrap();
    assert_eq!(identity.id, Some(UserId(12)));
    assert_eq!(identity.phone_number.as_deref(), Some("1"));
}

// =============================================================
// Pages and auth payloads
// =============================================================

#[test]
fn page_decodes_spring_shape() {
    let page: Page<Contact> = serde_json::from_str(
        r#"{"content": [{"id": 1, "firstName": "A"}], "totalElements": 41, "totalPages": 5, "number": 0, "size": 10}"#,
    )
    .unwrap();
    assert_eq!(page.content.len(), 1);
    assert_eq!(page.total_elements, 41);
    assert_eq!(page.total_pages, 5);
}

#[test]
fn page_without_content_is_empty() {
    let page: Page<Contact> = serde_json::from_str(r#"{"totalElements": 0}"#).unwrap();
    assert!(page.content.is_empty());
}

#[test]
fn login_response_reads_token_type() {
    let resp: LoginResponse =
        serde_json::from_str(r#"{"token": "abc", "type": "Bearer", "userId": 4, "email": "e@x"}"#).unwrap();
    assert_eq!(resp.token, "abc");
    assert_eq!(resp.token_type.as_deref(), Some("Bearer"));
    assert_eq!(resp.user_id, Some(UserId(4)));
}

#[test]
fn password_change_serializes_camel_case() {
    let body = PasswordChange { current_password: "old".into(), new_password: "newer".into() };
    let json = serde_json::to_value(&body).unwrap();
    assert_eq!(json["currentPassword"], "old");
    assert_eq!(json["newPassword"], "newer");
}

#[test]
fn sort_by_params() {
    assert_eq!(SortBy::default().as_param(), "firstName");
    assert_eq!(SortBy::LastName.as_param(), "lastName");
}
