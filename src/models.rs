use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A text-ish field as sources send it.
///
/// Adzuna wraps company and location in `{"display_name": ...}`; scraped
/// sources use plain strings. Anything else is kept as its JSON text.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Text {
    Plain(String),
    Named {
        #[serde(default)]
        display_name: Option<String>,
    },
    Other(Value),
}

impl Text {
    pub fn as_string(&self) -> Option<String> {
        match self {
            Text::Plain(s) => Some(s.clone()),
            Text::Named { display_name } => display_name.clone(),
            Text::Other(Value::Null) => None,
            Text::Other(v) => Some(v.to_string()),
        }
    }
}

/// One job posting as received. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RawJob {
    #[serde(default, alias = "Title", alias = "Job Title")]
    pub title: Option<Text>,
    #[serde(default, alias = "Company")]
    pub company: Option<Text>,
    #[serde(default, alias = "Location")]
    pub location: Option<Text>,
    #[serde(default, alias = "Summary", alias = "description", alias = "Description")]
    pub summary: Option<Text>,
    /// Kept as raw JSON so a present non-string value differs from absence.
    #[serde(default, alias = "DatePosted", alias = "Posted Date", alias = "created")]
    pub date_posted: Option<Value>,
    #[serde(default, alias = "redirect_url")]
    pub url: Option<Text>,
}

impl RawJob {
    /// Read one API result object. `None` when it is not a usable record.
    pub fn from_value(value: Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        serde_json::from_value(value).ok()
    }

    pub fn title(&self) -> Option<String> {
        self.title.as_ref().and_then(Text::as_string)
    }

    pub fn company(&self) -> Option<String> {
        self.company.as_ref().and_then(Text::as_string)
    }

    pub fn location(&self) -> Option<String> {
        self.location.as_ref().and_then(Text::as_string)
    }

    pub fn summary(&self) -> Option<String> {
        self.summary.as_ref().and_then(Text::as_string)
    }

    /// Link to the full posting, when the source sent a non-blank one.
    pub fn url(&self) -> Option<String> {
        self.url
            .as_ref()
            .and_then(Text::as_string)
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
    }
}

/// A fully populated posting, ready for a sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanJob {
    pub title: String,
    pub company: String,
    pub location: String,
    pub summary: String,
    /// Always `YYYY-MM-DD`.
    pub date_posted: String,
    /// Apply link for the HTML page. Not stored in the `jobs` table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}
