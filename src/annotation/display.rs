//! Editors for the single-object annotations: display, foreign-key, citation

use serde_json::{Map, Value};

use super::properties::{
    flag, get_choice, get_string_list, set_choice, set_string_list, set_template_engine_text,
    Choice, CommentDisplay, TemplateEngine, Toggle, ToggleField,
};
use super::shapes::Diagnostic;
use super::tags;
use super::visible_sources::defined_source_keys;
use crate::error::WorkbenchError;
use crate::model::{CatalogModel, ObjectRef};
use crate::util::{edit_nested, get_text, set_text};

/// `display` annotation, valid on any object
pub struct DisplayOptions<'a> {
    body: &'a mut Map<String, Value>,
}

/// Flags of `display.name_style`
pub const UNDERLINE_SPACE: ToggleField = flag("underline_space");
pub const TITLE_CASE: ToggleField = flag("title_case");
pub const MARKDOWN: ToggleField = flag("markdown");

impl<'a> DisplayOptions<'a> {
    pub fn new(body: &'a mut Map<String, Value>) -> Self {
        Self { body }
    }

    pub fn name(&self) -> Option<&str> {
        get_text(self.body, "name")
    }

    pub fn set_name(&mut self, name: &str) {
        set_text(self.body, "name", name);
    }

    pub fn markdown_name(&self) -> Option<&str> {
        get_text(self.body, "markdown_name")
    }

    pub fn set_markdown_name(&mut self, name: &str) {
        set_text(self.body, "markdown_name", name);
    }

    /// Plain comment; a per-context comment object reads as `None`
    pub fn comment(&self) -> Option<&str> {
        get_text(self.body, "comment")
    }

    /// Set the plain comment. A per-context comment object is not
    /// overwritten; returns whether the comment was applied.
    pub fn set_comment(&mut self, comment: &str) -> bool {
        if self.body.get("comment").is_some_and(Value::is_object) {
            return false;
        }
        set_text(self.body, "comment", comment);
        true
    }

    pub fn name_style(&self, field: ToggleField) -> bool {
        self.body
            .get("name_style")
            .and_then(Value::as_object)
            .is_some_and(|style| field.is_enabled(style))
    }

    pub fn set_name_style(&mut self, field: ToggleField, enabled: bool) {
        edit_nested(self.body, "name_style", |style| {
            field.set(style, Toggle::from_bool(enabled))
        });
    }
}

/// Which end of a foreign key a property describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Shown on the referencing table
    To,
    /// Shown on the referenced table
    From,
}

impl Direction {
    fn key(self, property: &str) -> String {
        match self {
            Direction::To => format!("to_{}", property),
            Direction::From => format!("from_{}", property),
        }
    }
}

/// `foreign-key` annotation
pub struct ForeignKeyOptions<'a> {
    body: &'a mut Map<String, Value>,
}

impl<'a> ForeignKeyOptions<'a> {
    pub fn new(body: &'a mut Map<String, Value>) -> Self {
        Self { body }
    }

    pub fn name(&self, direction: Direction) -> Option<&str> {
        get_text(self.body, &direction.key("name"))
    }

    pub fn set_name(&mut self, direction: Direction, name: &str) {
        set_text(self.body, &direction.key("name"), name);
    }

    pub fn comment(&self, direction: Direction) -> Option<&str> {
        get_text(self.body, &direction.key("comment"))
    }

    pub fn set_comment(&mut self, direction: Direction, comment: &str) {
        set_text(self.body, &direction.key("comment"), comment);
    }

    pub fn comment_display(&self, direction: Direction) -> Option<CommentDisplay> {
        get_choice(self.body, &direction.key("comment_display"))
    }

    pub fn set_comment_display(&mut self, direction: Direction, mode: Option<CommentDisplay>) {
        set_choice(self.body, &direction.key("comment_display"), mode);
    }

    pub fn domain_filter_pattern(&self) -> Option<&str> {
        get_text(self.body, "domain_filter_pattern")
    }

    pub fn set_domain_filter_pattern(&mut self, pattern: &str) {
        set_text(self.body, "domain_filter_pattern", pattern);
    }
}

/// Pattern properties of the `citation` annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CitationPattern {
    Journal,
    Author,
    Title,
    Year,
    Url,
    Id,
}

impl CitationPattern {
    pub const ALL: &'static [CitationPattern] = &[
        CitationPattern::Journal,
        CitationPattern::Author,
        CitationPattern::Title,
        CitationPattern::Year,
        CitationPattern::Url,
        CitationPattern::Id,
    ];

    pub fn key(self) -> &'static str {
        match self {
            CitationPattern::Journal => "journal_pattern",
            CitationPattern::Author => "author_pattern",
            CitationPattern::Title => "title_pattern",
            CitationPattern::Year => "year_pattern",
            CitationPattern::Url => "url_pattern",
            CitationPattern::Id => "id_pattern",
        }
    }
}

/// `citation` annotation
pub struct CitationOptions<'a> {
    body: &'a mut Map<String, Value>,
}

impl<'a> CitationOptions<'a> {
    pub fn new(body: &'a mut Map<String, Value>) -> Self {
        Self { body }
    }

    pub fn pattern(&self, pattern: CitationPattern) -> Option<&str> {
        get_text(self.body, pattern.key())
    }

    pub fn set_pattern(&mut self, pattern: CitationPattern, text: &str) {
        set_text(self.body, pattern.key(), text);
    }

    pub fn template_engine(&self) -> Option<TemplateEngine> {
        get_choice(self.body, "template_engine")
    }

    pub fn set_template_engine(&mut self, engine: &str) {
        set_template_engine_text(self.body, engine);
    }

    /// Source keys the patterns wait for
    pub fn wait_for(&self) -> Vec<String> {
        get_string_list(self.body, "wait_for")
    }

    pub fn set_wait_for(&mut self, keys: &[String]) {
        set_string_list(self.body, "wait_for", keys);
    }
}

const FOREIGN_KEY_TEXT: &[&str] = &[
    "to_name",
    "to_comment",
    "from_name",
    "from_comment",
    "domain_filter_pattern",
];

/// Check a display, foreign-key or citation body
pub fn validate(
    model: &CatalogModel,
    object: &ObjectRef,
    tag: &str,
    body: &Value,
) -> Vec<Diagnostic> {
    let Some(body) = body.as_object() else {
        return vec![Diagnostic {
            object: object.clone(),
            tag: tag.to_string(),
            location: String::new(),
            message: format!("{} is not an object", body),
        }];
    };
    let mut problems: Vec<(String, String)> = Vec::new();

    let text_keys: Vec<&str> = match tag {
        tags::DISPLAY => vec!["name", "markdown_name"],
        tags::FOREIGN_KEY => FOREIGN_KEY_TEXT.to_vec(),
        tags::CITATION => CitationPattern::ALL.iter().map(|p| p.key()).collect(),
        _ => Vec::new(),
    };
    for key in text_keys {
        if let Some(value) = body.get(key).filter(|v| !v.is_string()) {
            problems.push((key.to_string(), format!("{} is not a string", value)));
        }
    }

    match tag {
        tags::DISPLAY => match body.get("name_style") {
            None => {}
            Some(Value::Object(style)) => {
                for (name, value) in style.iter().filter(|(_, v)| !v.is_boolean()) {
                    problems.push((
                        format!("name_style.{}", name),
                        format!("{} is not a boolean", value),
                    ));
                }
            }
            Some(other) => {
                problems.push(("name_style".to_string(), format!("{} is not an object", other)))
            }
        },
        tags::FOREIGN_KEY => {
            for direction in [Direction::To, Direction::From] {
                let key = direction.key("comment_display");
                if let Some(value) = body.get(&key) {
                    if value.as_str().and_then(CommentDisplay::parse).is_none() {
                        problems.push((key, format!("unsupported comment display {}", value)));
                    }
                }
            }
        }
        tags::CITATION => {
            if let Some(engine) = body.get("template_engine") {
                if engine.as_str().and_then(TemplateEngine::parse).is_none() {
                    problems.push((
                        "template_engine".to_string(),
                        format!("unsupported template engine {}", engine),
                    ));
                }
            }
            match body.get("wait_for") {
                None => {}
                Some(Value::Array(keys)) => {
                    let defined = object
                        .table()
                        .map(|t| defined_source_keys(model, t))
                        .unwrap_or_default();
                    for key in keys {
                        let message = match key.as_str() {
                            Some(k) if defined.iter().any(|d| d == k) => continue,
                            Some(k) => WorkbenchError::UnknownSourceKey { key: k.to_string() }
                                .to_string(),
                            None => format!("{} is not a source key", key),
                        };
                        problems.push(("wait_for".to_string(), message));
                    }
                }
                Some(other) => {
                    problems.push(("wait_for".to_string(), format!("{} is not a list", other)))
                }
            }
        }
        _ => {}
    }

    problems
        .into_iter()
        .map(|(location, message)| Diagnostic {
            object: object.clone(),
            tag: tag.to_string(),
            location,
            message,
        })
        .collect()
}
