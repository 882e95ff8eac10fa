use super::*;

fn title() -> LocalizedText {
    LocalizedText::new("Sunny 日系手勾托特包").with(Locale::En, "Sunny Crochet Tote")
}

#[test]
fn resolves_requested_locale_when_present() {
    assert_eq!(title().resolve(Locale::En), "Sunny Crochet Tote");
    assert_eq!(title().resolve(Locale::ZhTw), "Sunny 日系手勾托特包");
}

#[test]
fn falls_back_to_default_locale_when_missing() {
    assert_eq!(title().resolve(Locale::Ja), "Sunny 日系手勾托特包");
    assert_eq!(title().get(Locale::Ja), None);
}

#[test]
fn every_locale_resolves_to_non_empty_text() {
    let field = title();
    for locale in Locale::ALL {
        let text = field.resolve(locale);
        assert!(!text.is_empty());
        match field.get(locale) {
            Some(exact) => assert_eq!(text, exact),
            None => assert_eq!(text, field.resolve(Locale::DEFAULT)),
        }
    }
}

#[test]
fn deserialization_requires_default_locale() {
    let err = serde_json::from_str::<LocalizedText>(r#"{"en":"Coasters","ja":"コースター"}"#)
        .expect_err("default locale missing");
    assert!(err.to_string().contains("default locale"));
}

#[test]
fn deserialization_rejects_blank_text() {
    let err = serde_json::from_str::<LocalizedText>(r#"{"zh-TW":"杯墊","en":"  "}"#)
        .expect_err("blank text");
    assert!(err.to_string().contains("empty text for locale en"));
}

#[test]
fn deserialization_rejects_unknown_locale_codes() {
    serde_json::from_str::<LocalizedText>(r#"{"zh-TW":"杯墊","fr":"Sous-verres"}"#)
        .expect_err("unknown locale");
}

#[test]
fn serializes_back_to_flat_locale_map() {
    let json = serde_json::to_value(title()).expect("json");
    assert_eq!(
        json,
        serde_json::json!({ "zh-TW": "Sunny 日系手勾托特包", "en": "Sunny Crochet Tote" })
    );
}

#[test]
fn parses_locale_codes_case_insensitively() {
    assert_eq!("zh-tw".parse::<Locale>().expect("locale"), Locale::ZhTw);
    assert_eq!(" JA ".parse::<Locale>().expect("locale"), Locale::Ja);
    assert!("de".parse::<Locale>().is_err());
}

#[test]
fn unknown_query_locale_falls_back_to_default() {
    assert_eq!(Locale::parse_or_default(Some("de")), Locale::ZhTw);
    assert_eq!(Locale::parse_or_default(None), Locale::ZhTw);
    assert_eq!(Locale::parse_or_default(Some("en")), Locale::En);
}

#[test]
fn validate_reports_blank_entries_by_locale() {
    assert_eq!(title().validate(), Ok(()));
    assert_eq!(
        LocalizedText::new(" ").validate(),
        Err(LocalizedTextError::Empty(Locale::ZhTw))
    );
    assert_eq!(
        title().with(Locale::Ja, "").validate(),
        Err(LocalizedTextError::Empty(Locale::Ja))
    );
}

#[test]
fn locales_list_default_first() {
    let locales: Vec<Locale> = title().with(Locale::Ja, "トート").locales().collect();
    assert_eq!(locales, vec![Locale::ZhTw, Locale::En, Locale::Ja]);
}
