use super::*;

fn project_json(id: i64, slug: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "slug": slug,
        "title": { "zh-TW": "測試作品", "en": "Test piece" },
        "category": { "zh-TW": "分類" },
        "materials": { "zh-TW": "棉線" },
        "timeSpent": { "zh-TW": "1 小時" },
        "description": { "zh-TW": "說明" },
        "coverImage": format!("/images/{slug}/cover.jpg"),
        "images": [format!("/images/{slug}/cover.jpg")],
        "colorPalette": ["#FFFFFF"]
    })
}

#[test]
fn builtin_catalog_loads_in_authoring_order() {
    let catalog = Catalog::builtin().expect("builtin catalog");
    let slugs: Vec<&str> = catalog.all().iter().map(|p| p.slug.as_str()).collect();
    assert_eq!(
        slugs,
        vec![
            "sunny-tote-bag",
            "pastel-coaster-set",
            "forest-cardigan",
            "mini-bear-keychain"
        ]
    );
}

#[test]
fn builtin_catalog_resolves_every_field_in_every_locale() {
    let catalog = Catalog::builtin().expect("builtin catalog");
    for project in catalog.all() {
        for locale in Locale::ALL {
            let view = project.localized(locale);
            assert!(!view.title.is_empty());
            assert!(!view.category.is_empty());
            assert!(!view.materials.is_empty());
            assert!(!view.time_spent.is_empty());
            assert!(!view.description.is_empty());
        }
    }
}

#[test]
fn looks_up_by_id_and_slug() {
    let catalog = Catalog::builtin().expect("builtin catalog");
    let by_id = catalog.by_id(ProjectId(3)).expect("project 3");
    assert_eq!(by_id.slug, "forest-cardigan");
    let by_slug = catalog.by_slug("pastel-coaster-set").expect("coasters");
    assert_eq!(by_slug.id, ProjectId(2));
    assert!(catalog.by_id(ProjectId(99)).is_none());
    assert!(catalog.by_slug("missing").is_none());
}

#[test]
fn partially_translated_project_falls_back_to_default_text() {
    let catalog = Catalog::builtin().expect("builtin catalog");
    let coasters = catalog.by_id(ProjectId(2)).expect("coasters");
    assert_eq!(coasters.title.resolve(Locale::Ja), "Pastel 漸層杯墊組");
    assert_eq!(coasters.category.resolve(Locale::Ja), "インテリア雑貨");
}

#[test]
fn rejects_project_missing_default_locale_text() {
    let mut record = project_json(1, "no-default");
    record["materials"] = serde_json::json!({ "en": "Cotton" });
    let raw = serde_json::Value::Array(vec![record]).to_string();

    let err = Catalog::from_json_str(&raw).expect_err("missing default");
    match err {
        CatalogError::ContentIntegrity { slug, field, source } => {
            assert_eq!(slug, "no-default");
            assert_eq!(field, "materials");
            assert_eq!(source, LocalizedTextError::MissingDefault);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn rejects_duplicate_ids_and_slugs() {
    let raw = serde_json::json!([project_json(1, "a"), project_json(1, "b")]).to_string();
    assert!(matches!(
        Catalog::from_json_str(&raw),
        Err(CatalogError::DuplicateId(ProjectId(1)))
    ));

    let raw = serde_json::json!([project_json(1, "a"), project_json(2, "a")]).to_string();
    assert!(matches!(
        Catalog::from_json_str(&raw),
        Err(CatalogError::DuplicateSlug(slug)) if slug == "a"
    ));
}

#[test]
fn rejects_slugs_that_are_not_url_safe() {
    let raw = serde_json::json!([project_json(1, "Sunny Tote")]).to_string();
    assert!(matches!(
        Catalog::from_json_str(&raw),
        Err(CatalogError::InvalidSlug(_))
    ));
}

#[test]
fn accepts_project_without_images() {
    let mut record = project_json(7, "bare");
    record["images"] = serde_json::json!([]);
    let raw = serde_json::Value::Array(vec![record]).to_string();
    let catalog = Catalog::from_json_str(&raw).expect("catalog");
    assert_eq!(catalog.by_id(ProjectId(7)).expect("bare").image_count(), 0);
}

#[test]
fn reports_unreadable_catalog_path() {
    let err = Catalog::from_path("/definitely/not/here/projects.json").expect_err("io");
    assert!(matches!(err, CatalogError::Io { .. }));
}

fn built_project(title: LocalizedText) -> Project {
    let text = |value: &str| LocalizedText::new(value);
    Project {
        id: ProjectId(7),
        slug: "hand-built".into(),
        title,
        category: text("分類"),
        materials: text("棉線"),
        time_spent: text("1 小時"),
        description: text("說明"),
        cover_image: "/images/hand-built/cover.jpg".into(),
        images: vec!["/images/hand-built/cover.jpg".into()],
        color_palette: Vec::new(),
    }
}

#[test]
fn programmatic_projects_with_blank_default_text_are_rejected() {
    let err = Catalog::from_projects(vec![built_project(LocalizedText::new(""))])
        .expect_err("blank default title");
    match err {
        CatalogError::ContentIntegrity { slug, field, source } => {
            assert_eq!(slug, "hand-built");
            assert_eq!(field, "title");
            assert_eq!(source, LocalizedTextError::Empty(Locale::ZhTw));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn programmatic_projects_with_blank_translation_are_rejected() {
    let title = LocalizedText::new("杯墊").with(Locale::Ja, "  ");
    let err = Catalog::from_projects(vec![built_project(title)]).expect_err("blank ja title");
    assert!(matches!(
        err,
        CatalogError::ContentIntegrity {
            field: "title",
            source: LocalizedTextError::Empty(Locale::Ja),
            ..
        }
    ));
}

#[test]
fn programmatic_projects_resolve_to_non_empty_text() {
    let title = LocalizedText::new("杯墊").with(Locale::En, "Coasters");
    let catalog = Catalog::from_projects(vec![built_project(title)]).expect("catalog");
    let project = catalog.by_slug("hand-built").expect("project");
    for locale in Locale::ALL {
        assert!(!project.title.resolve(locale).is_empty());
    }
}
