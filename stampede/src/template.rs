//! Placeholder templates for operation paths and bodies.
//!
//! `{user}` and `{tier}` expand to the virtual user's launch index and its tier size, `{rand}`
//! to a random `u32` and `{uuid}` to a random v4 UUID. Any other `{name}` refers to a value
//! captured from the response of an earlier operation of the same virtual user. `{{` and `}}`
//! produce literal braces.
use crate::workload::UserContext;
use serde_json::Value;
use stampede_core::ConfigError;
use std::collections::HashMap;
use url::form_urlencoded;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Var {
    User,
    Tier,
    Rand,
    Uuid,
    Captured(String),
}

impl Var {
    fn parse(name: &str) -> Self {
        match name {
            "user" => Var::User,
            "tier" => Var::Tier,
            "rand" => Var::Rand,
            "uuid" => Var::Uuid,
            other => Var::Captured(other.to_string()),
        }
    }

    fn is_numeric(&self) -> bool {
        matches!(self, Var::User | Var::Tier | Var::Rand)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Var(Var),
}

/// Per-virtual-user template variables.
#[derive(Debug)]
pub(crate) struct Vars {
    user: UserContext,
    captured: HashMap<String, String>,
}

impl Vars {
    pub fn new(user: UserContext) -> Self {
        Self {
            user,
            captured: HashMap::new(),
        }
    }

    pub fn capture(&mut self, var: &str, value: String) {
        self.captured.insert(var.to_string(), value);
    }

    fn resolve(&self, var: &Var) -> String {
        match var {
            Var::User => self.user.user_index.to_string(),
            Var::Tier => self.user.tier_size.to_string(),
            Var::Rand => rand::random::<u32>().to_string(),
            Var::Uuid => uuid::Uuid::new_v4().to_string(),
            // Unknown names are rejected when the workload is built; a capture missing at
            // runtime means its operation failed, which already ended the sequence.
            Var::Captured(name) => self.captured.get(name).cloned().unwrap_or_default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Template {
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(source: &str) -> Result<Self, ConfigError> {
        let mut segments = vec![];
        let mut literal = String::new();
        let mut chars = source.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(c) => name.push(c),
                            None => {
                                return Err(ConfigError::UnterminatedPlaceholder(
                                    source.to_string(),
                                ))
                            }
                        }
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Var(Var::parse(name.trim())));
                }
                c => literal.push(c),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self { segments })
    }

    /// Names of captured variables this template depends on.
    pub fn captured_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Var(Var::Captured(name)) => Some(name.as_str()),
            _ => None,
        })
    }

    pub fn render(&self, vars: &Vars) -> String {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(s) => s.clone(),
                Segment::Var(var) => vars.resolve(var),
            })
            .collect()
    }

    /// Render as a URL path. Substituted values are percent-encoded so they stay within their
    /// segment; literal text is kept as written.
    pub fn render_path(&self, vars: &Vars) -> String {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(s) => s.clone(),
                Segment::Var(var) => encode_path_value(&vars.resolve(var)),
            })
            .collect()
    }

    /// Render as a JSON value. A template made of a single numeric placeholder yields a number.
    fn render_value(&self, vars: &Vars) -> Value {
        if let [Segment::Var(var)] = self.segments.as_slice() {
            if var.is_numeric() {
                if let Ok(n) = vars.resolve(var).parse::<u64>() {
                    return Value::from(n);
                }
            }
        }
        Value::String(self.render(vars))
    }
}

fn encode_path_value(value: &str) -> String {
    // `byte_serialize` writes spaces as `+`, which a path would take literally. A literal `+`
    // is already escaped as `%2B`, so every remaining `+` stands for a space.
    form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// A JSON body whose string values are templates. Object keys are taken literally.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum BodyTemplate {
    Literal(Value),
    Text(Template),
    Array(Vec<BodyTemplate>),
    Object(Vec<(String, BodyTemplate)>),
}

impl BodyTemplate {
    pub fn parse(value: &Value) -> Result<Self, ConfigError> {
        Ok(match value {
            Value::String(s) => BodyTemplate::Text(Template::parse(s)?),
            Value::Array(items) => BodyTemplate::Array(
                items
                    .iter()
                    .map(BodyTemplate::parse)
                    .collect::<Result<_, _>>()?,
            ),
            Value::Object(map) => BodyTemplate::Object(
                map.iter()
                    .map(|(k, v)| BodyTemplate::parse(v).map(|t| (k.clone(), t)))
                    .collect::<Result<_, _>>()?,
            ),
            other => BodyTemplate::Literal(other.clone()),
        })
    }

    pub fn captured_names(&self) -> Vec<&str> {
        match self {
            BodyTemplate::Literal(_) => vec![],
            BodyTemplate::Text(t) => t.captured_names().collect(),
            BodyTemplate::Array(items) => items.iter().flat_map(|i| i.captured_names()).collect(),
            BodyTemplate::Object(fields) => fields
                .iter()
                .flat_map(|(_, v)| v.captured_names())
                .collect(),
        }
    }

    pub fn render(&self, vars: &Vars) -> Value {
        match self {
            BodyTemplate::Literal(v) => v.clone(),
            BodyTemplate::Text(t) => t.render_value(vars),
            BodyTemplate::Array(items) => Value::Array(items.iter().map(|i| i.render(vars)).collect()),
            BodyTemplate::Object(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.render(vars)))
                    .collect(),
            ),
        }
    }
}
