//! Which senders a preview accepts messages from.
//!
//! Origins are compared in their serialized form (`scheme://host[:port]`),
//! so `http://localhost:3000/editor` and `http://localhost:3000` match.

use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginPolicy {
    /// Accept every sender. Opt-in only.
    Any,

    /// Accept only the listed origins
    AllowList(Vec<String>),
}

impl OriginPolicy {
    /// Allow-list from origins or URLs; entries that do not parse are
    /// skipped with a warning
    pub fn allow<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let list = origins
            .into_iter()
            .filter_map(|origin| {
                let origin = origin.as_ref();
                let normalized = normalize(origin);
                if normalized.is_none() {
                    tracing::warn!(origin, "Ignoring unparsable allowed origin");
                }
                normalized
            })
            .collect();
        OriginPolicy::AllowList(list)
    }

    pub fn allows(&self, origin: &str) -> bool {
        match self {
            OriginPolicy::Any => true,
            OriginPolicy::AllowList(list) => match normalize(origin) {
                Some(origin) => list.iter().any(|allowed| *allowed == origin),
                None => false,
            },
        }
    }
}

impl Default for OriginPolicy {
    /// Nothing is accepted until origins are configured
    fn default() -> Self {
        OriginPolicy::AllowList(Vec::new())
    }
}

fn normalize(origin: &str) -> Option<String> {
    let url = Url::parse(origin).ok()?;
    let origin = url.origin();
    origin.is_tuple().then(|| origin.ascii_serialization())
}
