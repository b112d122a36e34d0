use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A point in degrees. Ranges are not validated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub lat: f64,
    #[serde(default)]
    pub lon: f64,
}

/// A location-tagged post as submitted by a client and stored in the index.
///
/// Omitted fields decode to their zero value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Post {
    pub user: String,
    pub message: String,
    pub location: Location,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub face: f32,
}

/// Raw query string of `GET /search`.
///
/// Everything is kept as text so that parsing policy lives in the handler.
#[derive(Debug, Default, PartialEq)]
pub struct SearchParams {
    pub lat: Option<String>,
    pub lon: Option<String>,
    pub range: Option<String>,
}

impl SearchParams {
    /// Read the parameters from a raw query string. A repeated key keeps its
    /// first value and unknown keys are ignored.
    pub fn from_query(query: &str) -> Self {
        let mut params = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let slot = match &*key {
                "lat" => &mut params.lat,
                "lon" => &mut params.lon,
                "range" => &mut params.range,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        params
    }
}

/// Posts decoded from a set of search hits.
#[derive(Debug, Default)]
pub struct DecodedPosts {
    pub posts: Vec<Post>,
    pub dropped: usize,
}

/// Decode each hit source into a [`Post`], dropping the ones that do not fit.
pub fn decode_hits(hits: Vec<Value>) -> DecodedPosts {
    let mut decoded = DecodedPosts::default();
    for hit in hits {
        match serde_json::from_value::<Post>(hit) {
            Ok(post) => decoded.posts.push(post),
            Err(_) => decoded.dropped += 1,
        }
    }
    decoded
}
