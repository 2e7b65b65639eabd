use crate::error::CoreError;
use crate::models::{Template, TemplateCategory, TemplateDraft};
use crate::personalize;
use crate::store::TemplateStore;

fn validate(draft: &TemplateDraft) -> Result<TemplateDraft, CoreError> {
    let name = draft.name.trim();
    if name.is_empty() {
        return Err(CoreError::Validation("template name is required".to_string()));
    }
    if draft.content.trim().is_empty() {
        return Err(CoreError::Validation("template content is required".to_string()));
    }
    Ok(TemplateDraft {
        name: name.to_string(),
        description: draft.description.trim().to_string(),
        content: draft.content.clone(),
        category: draft.category,
    })
}

pub fn list_templates<S: TemplateStore>(store: &S) -> Result<Vec<Template>, CoreError> {
    store.all_templates()
}

/// Narrows `templates` to those whose name or description contains `query`
/// (case-insensitive) and, when given, whose category matches. A blank
/// query matches everything.
pub fn filter_templates(
    templates: Vec<Template>,
    query: &str,
    category: Option<TemplateCategory>,
) -> Vec<Template> {
    let needle = query.to_lowercase();
    templates
        .into_iter()
        .filter(|template| {
            needle.trim().is_empty()
                || template.name.to_lowercase().contains(&needle)
                || template.description.to_lowercase().contains(&needle)
        })
        .filter(|template| category.map_or(true, |category| template.category == category))
        .collect()
}

pub fn create_template<S: TemplateStore>(store: &S, draft: &TemplateDraft) -> Result<Template, CoreError> {
    let draft = validate(draft)?;
    let template = store.insert_template(&draft)?;
    tracing::info!(template_id = template.id, category = %template.category, "created template");
    Ok(template)
}

/// Replaces every editable field; id and `created_at` stay as stored.
pub fn update_template<S: TemplateStore>(
    store: &S,
    id: i64,
    draft: &TemplateDraft,
) -> Result<Template, CoreError> {
    let draft = validate(draft)?;
    store.update_template(id, &draft)
}

pub fn delete_template<S: TemplateStore>(store: &S, id: i64) -> Result<Template, CoreError> {
    store.remove_template(id)
}

/// Template content rendered for the sample recipient.
pub fn preview_template<S: TemplateStore>(store: &S, id: i64) -> Result<String, CoreError> {
    let template = store.template_by_id(id)?;
    Ok(personalize::preview(&template.content))
}
