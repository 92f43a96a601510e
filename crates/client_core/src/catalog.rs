//! Per-entity field selectors and filter vocabularies for the list pipeline.

use shared::domain::{
    Assessment, Quiz, QuizQuestion, Resource, UserSummary, STATUS_ACTIVE, STATUS_INACTIVE,
};

use crate::listing::ListFields;

pub const STATUS_FILTER: &str = "status";
pub const CATEGORY_FILTER: &str = "category";
pub const TYPE_FILTER: &str = "type";

pub const STATUS_OPTIONS: &[&str] = &[STATUS_ACTIVE, STATUS_INACTIVE];
pub const RESOURCE_CATEGORIES: &[&str] = &["Documents", "Videos", "Guides", "Links"];
pub const ASSESSMENT_TYPES: &[&str] = &[
    "Screening",
    "Assessment",
    "Evaluation",
    "Test",
    "Questionnaire",
];

/// A record type that can be shown on a list screen.
pub trait ListEntity: Clone + Send + Sync + 'static {
    /// Human-readable plural used in headings and empty-state text.
    const PLURAL: &'static str;

    fn list_fields() -> ListFields<Self>;

    /// Allowed values for each filter the screen exposes.
    fn filter_options() -> &'static [(&'static str, &'static [&'static str])] {
        &[]
    }
}

impl ListEntity for UserSummary {
    const PLURAL: &'static str = "users";

    fn list_fields() -> ListFields<Self> {
        ListFields::new(|user: &Self| user.created_at.as_deref())
            .search(|user: &Self| user.name.as_deref())
            .search(|user: &Self| user.email.as_deref())
            .filter(STATUS_FILTER, |user: &Self| user.status.as_deref())
    }

    fn filter_options() -> &'static [(&'static str, &'static [&'static str])] {
        &[(STATUS_FILTER, STATUS_OPTIONS)]
    }
}

impl ListEntity for Quiz {
    const PLURAL: &'static str = "quizzes";

    fn list_fields() -> ListFields<Self> {
        ListFields::new(|quiz: &Self| quiz.date.as_deref())
            .search(|quiz: &Self| quiz.title.as_deref())
            .search(|quiz: &Self| quiz.client.as_deref())
            .search(|quiz: &Self| quiz.talent.as_deref())
            .filter(STATUS_FILTER, |quiz: &Self| quiz.status.as_deref())
    }

    fn filter_options() -> &'static [(&'static str, &'static [&'static str])] {
        &[(STATUS_FILTER, STATUS_OPTIONS)]
    }
}

impl ListEntity for QuizQuestion {
    const PLURAL: &'static str = "questions";

    fn list_fields() -> ListFields<Self> {
        ListFields::new(|question: &Self| question.created_at.as_deref())
            .search(|question: &Self| question.prompt.as_deref())
            .search(|question: &Self| question.question_type.as_deref())
            .filter(TYPE_FILTER, |question: &Self| question.question_type.as_deref())
    }
}

impl ListEntity for Assessment {
    const PLURAL: &'static str = "assessments";

    fn list_fields() -> ListFields<Self> {
        ListFields::new(|assessment: &Self| assessment.last_updated.as_deref())
            .search(|assessment: &Self| assessment.title.as_deref())
            .search(|assessment: &Self| assessment.assessment_type.as_deref())
            .filter(STATUS_FILTER, |assessment: &Self| assessment.status.as_deref())
            .filter(TYPE_FILTER, |assessment: &Self| {
                assessment.assessment_type.as_deref()
            })
    }

    fn filter_options() -> &'static [(&'static str, &'static [&'static str])] {
        &[(STATUS_FILTER, STATUS_OPTIONS), (TYPE_FILTER, ASSESSMENT_TYPES)]
    }
}

impl ListEntity for Resource {
    const PLURAL: &'static str = "resources";

    fn list_fields() -> ListFields<Self> {
        ListFields::new(|resource: &Self| resource.date.as_deref())
            .search(|resource: &Self| resource.title.as_deref())
            .search(|resource: &Self| resource.category.as_deref())
            .search(|resource: &Self| resource.resource_type.as_deref())
            .filter(CATEGORY_FILTER, |resource: &Self| resource.category.as_deref())
            .filter(STATUS_FILTER, |resource: &Self| resource.status.as_deref())
    }

    fn filter_options() -> &'static [(&'static str, &'static [&'static str])] {
        &[
            (CATEGORY_FILTER, RESOURCE_CATEGORIES),
            (STATUS_FILTER, STATUS_OPTIONS),
        ]
    }
}
