use serde::Serialize;
use serde_json::Value;

/// Normalized registry push event.
///
/// Absent fields are always the empty string, never an option, so downstream
/// formatting can test `is_empty()` uniformly. `raw_fallback` is only
/// populated when the body was not valid JSON; in that case every structured
/// field is empty.
#[derive(Debug, Clone, Serialize)]
pub struct PushEvent {
    pub repo_full_name: String,
    pub namespace: String,
    pub image_name: String,
    pub tag: String,
    pub digest: String,
    pub region: String,
    pub pushed_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_fallback: Option<String>,
}

impl PushEvent {
    fn fallback(raw_text: String) -> Self {
        Self {
            repo_full_name: String::new(),
            namespace: String::new(),
            image_name: String::new(),
            tag: String::new(),
            digest: String::new(),
            region: String::new(),
            pushed_at: String::new(),
            raw_fallback: Some(raw_text),
        }
    }
}

/// Parse an untrusted webhook body into a `PushEvent`.
///
/// Total function: a non-JSON or empty body yields an event whose
/// `raw_fallback` holds the lossily decoded text. Wrong-typed or missing
/// fields degrade to empty strings, never to an error.
pub fn parse_push_event(raw: &[u8]) -> PushEvent {
    let raw_text = String::from_utf8_lossy(raw);

    let data: Value = match serde_json::from_str(&raw_text) {
        Ok(value) => value,
        Err(_) => return PushEvent::fallback(raw_text.into_owned()),
    };

    let tag = normalize_tag(str_at(&data, "push_data", "tag"));
    let digest = str_at(&data, "push_data", "digest").to_string();
    let pushed_at = str_at(&data, "push_data", "pushed_at").to_string();

    let namespace = str_at(&data, "repository", "namespace").to_string();
    let region = str_at(&data, "repository", "region").to_string();

    let repo_full_name = {
        let explicit = str_at(&data, "repository", "repo_full_name");
        if explicit.is_empty() {
            let name = str_at(&data, "repository", "name");
            format!("{}/{}", namespace, name)
                .trim_matches('/')
                .to_string()
        } else {
            explicit.to_string()
        }
    };

    let image_name = repo_full_name
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string();

    PushEvent {
        repo_full_name,
        namespace,
        image_name,
        tag,
        digest,
        region,
        pushed_at,
        raw_fallback: None,
    }
}

/// Normalize a pushed tag: empty means `latest`, and the registry's common
/// `lastest` misspelling is folded into `latest` case-insensitively. Any
/// other tag keeps its case.
pub fn normalize_tag(tag: &str) -> String {
    if tag.is_empty() || tag.eq_ignore_ascii_case("lastest") {
        "latest".to_string()
    } else {
        tag.to_string()
    }
}

/// Type-tolerant extraction of `value[object][field]` as a string slice.
/// Anything other than a string at that path yields "".
fn str_at<'a>(value: &'a Value, object: &str, field: &str) -> &'a str {
    value
        .get(object)
        .and_then(|v| v.get(field))
        .and_then(Value::as_str)
        .unwrap_or("")
}
