//! Renderer configuration, navigation URL parameters and search requests.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    err::Error,
    filter::{
        codec::{percent_encode, ALL, LIST_SEPARATOR, UNEXPANDED_SEPARATOR},
        lucene::try_url_decode,
        Filter, FilterCodec,
    },
};

lazy_static::lazy_static! {
    static ref GUID_PREFIX: Regex = Regex::new(
        r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}"
    )
    .expect("invalid regex in source code");
}

/// Split a comma-separated sample list, dropping empty entries.
fn split_sample_ids(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Filter-related part of a variant track's renderer configuration.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct RendererConfig {
    /// Info filters, expanded or unexpanded.
    pub info_filters: Vec<String>,
    /// Comma-joined list of sample identifiers.
    pub active_samples: String,
}

impl RendererConfig {
    /// Load from a JSON document.
    pub fn from_json_reader<R: std::io::Read>(reader: R) -> Result<Self, anyhow::Error> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// The active sample identifiers.
    pub fn sample_ids(&self) -> Vec<String> {
        split_sample_ids(&self.active_samples)
    }
}

/// Value of the `infoFilters` and `sampleFilters` URL parameters, `trackId:payload`.
///
/// For `infoFilters` the payload is an encoded filter list, for
/// `sampleFilters` a comma-separated sample list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackFilterParam {
    pub track_id: String,
    pub payload: String,
}

impl TrackFilterParam {
    pub fn new(track_id: &str, payload: &str) -> Self {
        Self {
            track_id: track_id.to_string(),
            payload: payload.to_string(),
        }
    }

    /// Interpret the payload as an encoded filter list.
    pub fn filters(&self, codec: &FilterCodec) -> Vec<Filter> {
        codec.decode_filter_list(&self.payload)
    }

    /// Interpret the payload as a sample list.
    pub fn sample_ids(&self) -> Vec<String> {
        split_sample_ids(&self.payload)
    }

    /// Whether this parameter applies to the track `track_id`.
    pub fn applies_to(&self, track_id: &str) -> bool {
        self.track_id == track_id
            || truncate_to_valid_guid(&self.track_id)
                .eq_ignore_ascii_case(truncate_to_valid_guid(track_id))
    }
}

impl std::str::FromStr for TrackFilterParam {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(UNEXPANDED_SEPARATOR) {
            Some((track_id, payload)) if !track_id.is_empty() => {
                Ok(TrackFilterParam::new(track_id, payload))
            }
            _ => Err(Error::invalid_filter_string(s, "expected trackId:payload")),
        }
    }
}

impl std::fmt::Display for TrackFilterParam {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", &self.track_id, UNEXPANDED_SEPARATOR, &self.payload)
    }
}

/// Cut `track_id` down to its leading GUID, if it starts with one.
pub fn truncate_to_valid_guid(track_id: &str) -> &str {
    GUID_PREFIX
        .find(track_id)
        .map(|m| m.as_str())
        .unwrap_or(track_id)
}

/// Split an incoming search string into its Lucene clauses.
///
/// The string is URL-decoded leniently first; `all` yields no clauses.
pub fn split_search_string(search_string: &str) -> Vec<String> {
    let decoded = try_url_decode(search_string);
    if decoded == ALL {
        return Vec::new();
    }
    decoded
        .split(LIST_SEPARATOR)
        .map(str::trim)
        .filter(|clause| !clause.is_empty())
        .map(String::from)
        .collect()
}

/// Request to the remote Lucene search endpoint.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub search_string: String,
    pub session_id: String,
    pub track_id: String,
    pub offset: usize,
    pub page_size: usize,
    pub sort_field: String,
    pub sort_reverse: bool,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            search_string: ALL.to_string(),
            session_id: String::new(),
            track_id: String::new(),
            offset: 0,
            page_size: 50,
            sort_field: "genomicPosition".to_string(),
            sort_reverse: false,
        }
    }
}

impl SearchRequest {
    /// Request for the given session and track with default paging.
    pub fn new(session_id: &str, track_id: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            track_id: truncate_to_valid_guid(track_id).to_string(),
            ..Default::default()
        }
    }

    /// Set the search string to the encoded Lucene clauses of `filters`.
    pub fn with_filters(mut self, codec: &FilterCodec, filters: &[Filter]) -> Result<Self, Error> {
        self.search_string = codec.encode_filter_list(filters, true)?;
        Ok(self)
    }

    /// The request parameters as (name, value) pairs.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("searchString", self.search_string.clone()),
            ("sessionId", self.session_id.clone()),
            ("trackId", self.track_id.clone()),
            ("offset", self.offset.to_string()),
            ("pageSize", self.page_size.to_string()),
            ("sortField", self.sort_field.clone()),
            ("sortReverse", self.sort_reverse.to_string()),
        ]
    }

    /// The request parameters as a URL query string.
    pub fn to_query_string(&self) -> String {
        self.to_query_pairs()
            .into_iter()
            .map(|(key, value)| format!("{}={}", key, percent_encode(&value)))
            .collect::<Vec<_>>()
            .join("&")
    }
}
