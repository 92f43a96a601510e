use std::fmt;

use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Identifiers are opaque strings on the wire, but some backends emit plain
/// integers; both decode into the same newtype.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                Ok(match RawId::deserialize(deserializer)? {
                    RawId::Text(value) => Self(value),
                    RawId::Number(value) => Self(value.to_string()),
                })
            }
        }
    };
}

/// Folds alternate spellings of a key into its canonical name. A non-null
/// canonical value wins; otherwise the first non-null alternate is used.
fn canonicalize(fields: &mut Map<String, Value>, canonical: &str, alternates: &[&str]) {
    let mut present = fields.get(canonical).is_some_and(|value| !value.is_null());
    for alternate in alternates {
        let Some(value) = fields.remove(*alternate) else {
            continue;
        };
        if !present && !value.is_null() {
            fields.insert(canonical.to_string(), value);
            present = true;
        }
    }
}

/// Backends send the same field under several keys (`_id` next to an `id`
/// virtual, `date` next to `createdAt`). Records derive their serde impls with
/// `remote = "Self"` and decode through this wrapper, which keeps one key per
/// field before handing the object to the derived code.
macro_rules! wire_record {
    ($name:ident { $($canonical:literal <- [$($alternate:literal),+]),+ $(,)? }) => {
        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let mut fields = Map::<String, Value>::deserialize(deserializer)?;
                $(canonicalize(&mut fields, $canonical, &[$($alternate),+]);)+
                $name::deserialize(Value::Object(fields)).map_err(D::Error::custom)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                $name::serialize(self, serializer)
            }
        }
    };
}

id_newtype!(UserId);
id_newtype!(QuizId);
id_newtype!(QuestionId);
id_newtype!(AssessmentId);
id_newtype!(ResourceId);

pub const STATUS_ACTIVE: &str = "Active";
pub const STATUS_INACTIVE: &str = "Inactive";

/// Profile returned by the login endpoint and persisted with the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self", rename_all = "camelCase")]
pub struct AuthUser {
    pub id: UserId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

wire_record!(AuthUser { "id" <- ["_id"] });

impl AuthUser {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(self.id.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self", rename_all = "camelCase")]
pub struct UserSummary {
    pub id: UserId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

wire_record!(UserSummary {
    "id" <- ["_id"],
    "createdAt" <- ["date"],
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self", rename_all = "camelCase")]
pub struct UserDetails {
    pub id: UserId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub profile_visibility: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub total_quizzes: Option<u64>,
    #[serde(default)]
    pub total_assessments: Option<u64>,
    #[serde(default)]
    pub completion_rate: Option<String>,
}

wire_record!(UserDetails { "id" <- ["_id"] });

impl UserDetails {
    /// Account status shown on the detail screen; the backend reports it as
    /// profile visibility.
    pub fn status(&self) -> &str {
        self.profile_visibility.as_deref().unwrap_or(STATUS_ACTIVE)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self", rename_all = "camelCase")]
pub struct Quiz {
    pub id: QuizId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub client: Option<String>,
    #[serde(default)]
    pub talent: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

wire_record!(Quiz {
    "id" <- ["_id"],
    "date" <- ["createdAt"],
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self", rename_all = "camelCase")]
pub struct QuizQuestion {
    pub id: QuestionId,
    #[serde(default)]
    pub quiz_id: Option<QuizId>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub question_type: Option<String>,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

wire_record!(QuizQuestion {
    "id" <- ["_id"],
    "prompt" <- ["question", "text"],
    "questionType" <- ["type"],
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self", rename_all = "camelCase")]
pub struct Assessment {
    pub id: AssessmentId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, rename = "type")]
    pub assessment_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub total_submissions: Option<u64>,
    #[serde(default)]
    pub average_score: Option<f64>,
    #[serde(default)]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub created_date: Option<String>,
}

wire_record!(Assessment { "id" <- ["_id"] });

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self", rename_all = "camelCase")]
pub struct Resource {
    pub id: ResourceId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, rename = "type")]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub downloads: Option<u64>,
    #[serde(default)]
    pub views: Option<u64>,
    #[serde(default)]
    pub clicks: Option<u64>,
    #[serde(default)]
    pub status: Option<String>,
}

wire_record!(Resource {
    "id" <- ["_id"],
    "date" <- ["createdAt"],
});

impl Resource {
    /// Engagement figure for the resource table: downloads, then views, then
    /// clicks. Zero counts are treated as absent.
    pub fn metric(&self) -> String {
        match (self.downloads, self.views, self.clicks) {
            (Some(downloads), _, _) if downloads > 0 => format!("{downloads} downloads"),
            (_, Some(views), _) if views > 0 => format!("{views} views"),
            (_, _, Some(clicks)) if clicks > 0 => format!("{clicks} clicks"),
            _ => "-".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    #[serde(default)]
    pub activity: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemAlert {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    #[serde(default)]
    pub total_quizzes: u64,
    #[serde(default)]
    pub total_users: u64,
    #[serde(default)]
    pub total_assessments: u64,
    #[serde(default)]
    pub recent_activity: Vec<ActivityEntry>,
    #[serde(default)]
    pub system_alerts: Vec<SystemAlert>,
}
