
use anyhow::bail;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Options controlling list and watch requests
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListOptions {
    pub label_selector: Option<String>,
    pub field_selector: Option<String>,
    pub resource_version: Option<String>,
    pub limit: Option<u32>,
    #[serde(rename = "continue")]
    pub continue_token: Option<String>,
    pub timeout_seconds: Option<u32>,
}

impl ListOptions {
    pub fn with_label_selector(mut self, selector: &str) -> Self {
        self.label_selector = Some(selector.to_string());
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_continue_token(mut self, token: String) -> Self {
        self.continue_token = Some(token);
        self
    }

    /// Parses the label selector, if any
    pub fn parsed_label_selector(&self) -> anyhow::Result<Option<LabelSelector>> {
        self.label_selector.as_deref().map(LabelSelector::parse).transpose()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetOptions {
    pub resource_version: Option<String>,
}

/// Options for exporting an object without its cluster-specific fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportOptions {
    /// Should the export be exact. Exact export maintains cluster-specific fields like the namespace
    pub exact: bool,
    pub export: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOptions {
    pub grace_period_seconds: Option<u32>,
    pub preconditions: Option<Preconditions>,
}

/// Must be fulfilled before an update or a delete is carried out
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preconditions {
    pub uid: Option<String>,
    pub resource_version: Option<String>,
}

const MAX_LABEL_NAME_LENGTH: usize = 63;
const MAX_LABEL_PREFIX_LENGTH: usize = 253;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Requirement {
    Equals(String, String),
    NotEquals(String, String),
    In(String, Vec<String>),
    NotIn(String, Vec<String>),
    Exists(String),
    DoesNotExist(String),
}

/// Label selector in the API server syntax, e.g. `app=web,tier!=cache,env in (dev,qa),!legacy`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LabelSelector {
    requirements: Vec<Requirement>,
}

impl LabelSelector {
    pub fn parse(selector: &str) -> anyhow::Result<Self> {
        let requirements = split_terms(selector)?
            .into_iter()
            .map(|term| {
                let requirement = parse_term(term);
                match &requirement {
                    Some(requirement) if requirement.is_valid() => Ok(requirement.clone()),
                    _ => bail!("Invalid label selector term: {:?}", term),
                }
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(LabelSelector { requirements })
    }

    pub fn matches(&self, labels: Option<&BTreeMap<String, String>>) -> bool {
        self.requirements.iter().all(|requirement| {
            let value_of = |key: &String| labels.and_then(|l| l.get(key));
            match requirement {
                Requirement::Equals(key, value) => value_of(key) == Some(value),
                Requirement::NotEquals(key, value) => value_of(key) != Some(value),
                Requirement::In(key, values) => value_of(key).is_some_and(|v| values.contains(v)),
                Requirement::NotIn(key, values) => value_of(key).is_none_or(|v| !values.contains(v)),
                Requirement::Exists(key) => value_of(key).is_some(),
                Requirement::DoesNotExist(key) => value_of(key).is_none(),
            }
        })
    }
}

impl Requirement {
    fn is_valid(&self) -> bool {
        match self {
            Requirement::Equals(key, value) | Requirement::NotEquals(key, value) => {
                is_label_key(key) && is_label_value(value)
            }
            Requirement::In(key, values) | Requirement::NotIn(key, values) => {
                is_label_key(key) && !values.is_empty() && values.iter().all(|v| is_label_value(v))
            }
            Requirement::Exists(key) | Requirement::DoesNotExist(key) => is_label_key(key),
        }
    }
}

/// Splits on commas outside of parentheses
fn split_terms(selector: &str) -> anyhow::Result<Vec<&str>> {
    let mut terms = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (index, c) in selector.char_indices() {
        match c {
            '(' => depth += 1,
            ')' if depth == 0 => bail!("Unbalanced parentheses in label selector: {:?}", selector),
            ')' => depth -= 1,
            ',' if depth == 0 => {
                terms.push(&selector[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        bail!("Unbalanced parentheses in label selector: {:?}", selector);
    }
    terms.push(&selector[start..]);
    Ok(terms.into_iter().map(str::trim).filter(|t| !t.is_empty()).collect())
}

fn parse_term(term: &str) -> Option<Requirement> {
    if let Some(key) = term.strip_prefix('!') {
        return Some(Requirement::DoesNotExist(key.trim().to_string()));
    }
    if let Some((head, values)) = term.split_once('(') {
        let values = values.strip_suffix(')')?.trim();
        let values: Vec<String> = match values {
            "" => Vec::new(),
            _ => values.split(',').map(|v| v.trim().to_string()).collect(),
        };
        let (key, operator) = head.trim_end().rsplit_once(char::is_whitespace)?;
        let key = key.trim().to_string();
        return match operator {
            "in" => Some(Requirement::In(key, values)),
            "notin" => Some(Requirement::NotIn(key, values)),
            _ => None,
        };
    }
    if let Some((key, value)) = term.split_once("!=") {
        return Some(Requirement::NotEquals(key.trim().to_string(), value.trim().to_string()));
    }
    if let Some((key, value)) = term.split_once("==").or_else(|| term.split_once('=')) {
        return Some(Requirement::Equals(key.trim().to_string(), value.trim().to_string()));
    }
    Some(Requirement::Exists(term.to_string()))
}

/// `[prefix/]name`, where the prefix is a DNS subdomain
fn is_label_key(key: &str) -> bool {
    let (prefix, name) = match key.split_once('/') {
        Some((prefix, name)) => (Some(prefix), name),
        None => (None, key),
    };
    let prefix_valid = prefix.is_none_or(|prefix| {
        !prefix.is_empty()
            && prefix.len() <= MAX_LABEL_PREFIX_LENGTH
            && prefix
                .split('.')
                .all(|part| is_alphanumeric_bounded(part, |c| c == '-'))
    });
    prefix_valid && !name.is_empty() && is_label_value(name)
}

/// Empty, or up to 63 of `[-_.a-zA-Z0-9]` starting and ending alphanumeric
fn is_label_value(value: &str) -> bool {
    value.is_empty()
        || (value.len() <= MAX_LABEL_NAME_LENGTH && is_alphanumeric_bounded(value, |c| matches!(c, '-' | '_' | '.')))
}

fn is_alphanumeric_bounded(part: &str, inner: impl Fn(char) -> bool) -> bool {
    let bounded = part.starts_with(|c: char| c.is_ascii_alphanumeric())
        && part.ends_with(|c: char| c.is_ascii_alphanumeric());
    bounded && part.chars().all(|c| c.is_ascii_alphanumeric() || inner(c))
}
