use broadcast_console_core::models::{Template, TemplateCategory, TemplateDraft};
use broadcast_console_core::templates::{
    create_template, delete_template, filter_templates, list_templates, preview_template,
    update_template,
};
use broadcast_console_core::{CoreError, SqliteStore};

fn draft(name: &str, content: &str) -> TemplateDraft {
    TemplateDraft {
        name: name.to_string(),
        description: String::new(),
        content: content.to_string(),
        category: TemplateCategory::General,
    }
}

fn names(templates: Vec<Template>) -> Vec<String> {
    templates.into_iter().map(|template| template.name).collect()
}

#[test]
fn create_trims_name_and_keeps_content() {
    let store = SqliteStore::in_memory().expect("store");
    let template = create_template(&store, &draft("  Hello  ", " Hi {{Name}} ")).expect("create");
    assert_eq!(template.name, "Hello");
    assert_eq!(template.content, " Hi {{Name}} ");
    assert_eq!(list_templates(&store).expect("list"), vec![template]);
}

#[test]
fn blank_name_or_content_is_rejected() {
    let store = SqliteStore::in_memory().expect("store");
    let err = create_template(&store, &draft("   ", "body")).expect_err("name");
    assert!(matches!(err, CoreError::Validation(_)));
    let err = create_template(&store, &draft("name", " \n ")).expect_err("content");
    assert!(matches!(err, CoreError::Validation(_)));
    assert!(list_templates(&store).expect("list").is_empty());
}

#[test]
fn update_keeps_id_and_created_at() {
    let store = SqliteStore::in_memory().expect("store");
    let original = create_template(&store, &draft("One", "first")).expect("create");
    let mut changed = draft("Two", "second");
    changed.category = TemplateCategory::FollowUp;

    let updated = update_template(&store, original.id, &changed).expect("update");
    assert_eq!(updated.id, original.id);
    assert_eq!(updated.created_at, original.created_at);
    assert_eq!(updated.name, "Two");
    assert_eq!(updated.category, TemplateCategory::FollowUp);
}

#[test]
fn update_and_delete_unknown_template() {
    let store = SqliteStore::in_memory().expect("store");
    let err = update_template(&store, 7, &draft("x", "y")).expect_err("missing");
    assert!(err.is_not_found());
    let err = delete_template(&store, 7).expect_err("missing");
    assert!(err.is_not_found());
}

#[test]
fn preview_uses_sample_recipient_and_markup() {
    let store = SqliteStore::in_memory().expect("store");
    let template =
        create_template(&store, &draft("Hi", "Hi {{Name}}, *welcome* ({{Email}})")).expect("create");
    assert_eq!(
        preview_template(&store, template.id).expect("preview"),
        "Hi John Doe, <strong>welcome</strong> (john.doe@example.com)"
    );
}

#[test]
fn filter_matches_name_or_description_and_category() {
    let store = SqliteStore::in_memory().expect("store");
    let mut sale = draft("Spring Sale", "promo body");
    sale.category = TemplateCategory::Marketing;
    create_template(&store, &sale).expect("sale");
    let mut reminder = draft("Reminder", "body");
    reminder.description = "Before the SALE ends".to_string();
    reminder.category = TemplateCategory::Reminder;
    create_template(&store, &reminder).expect("reminder");
    create_template(&store, &draft("Welcome", "hi")).expect("welcome");

    let all = list_templates(&store).expect("list");
    assert_eq!(names(filter_templates(all.clone(), "sale", None)), vec!["Spring Sale", "Reminder"]);
    assert_eq!(
        names(filter_templates(all.clone(), "sale", Some(TemplateCategory::Reminder))),
        vec!["Reminder"]
    );
    assert_eq!(filter_templates(all.clone(), "  ", None).len(), 3);
    assert_eq!(
        names(filter_templates(all.clone(), "", Some(TemplateCategory::General))),
        vec!["Welcome"]
    );
    assert!(filter_templates(all, "nothing", None).is_empty());
}
