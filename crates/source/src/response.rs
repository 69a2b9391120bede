//! Typed view of the job-search response and conversion into [`Listing`].
//!
//! Every level is optional: the endpoint answers schema drift and soft
//! failures with partially filled payloads, so missing layers must map to a
//! descriptive error instead of a panic.

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use tracing::warn;

use gigwatch_core::{Listing, Pricing, Skill};

use crate::error::SourceError;

#[derive(Debug, Deserialize)]
pub(crate) struct GraphqlResponse {
    pub data: Option<SearchData>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchData {
    pub search: Option<SearchRoot>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SearchRoot {
    pub universal_search_nuxt: Option<UniversalSearchNuxt>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UniversalSearchNuxt {
    pub visitor_job_search_v1: Option<SearchPage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchPage {
    pub results: Option<Vec<RawListing>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawListing {
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub ontology_skills: Vec<RawSkill>,
    pub job_tile: Option<RawJobTile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawSkill {
    pub pretty_name: Option<String>,
    pub pref_label: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawJobTile {
    pub job: Option<RawJob>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawJob {
    pub ciphertext: Option<String>,
    pub publish_time: Option<String>,
    pub create_time: Option<String>,
    pub hourly_budget_min: Option<f64>,
    pub hourly_budget_max: Option<f64>,
}

/// Walk the response down to the result records and convert them.
///
/// Records without an id cannot be deduplicated and are skipped with a
/// warning; they do not fail the page.
pub(crate) fn extract_results(envelope: GraphqlResponse) -> Result<Vec<Listing>, SourceError> {
    let search = envelope
        .data
        .and_then(|d| d.search)
        .ok_or_else(|| missing("data.search"))?;
    let nuxt = search
        .universal_search_nuxt
        .ok_or_else(|| missing("data.search.universalSearchNuxt"))?;
    let page = nuxt
        .visitor_job_search_v1
        .ok_or_else(|| missing("data.search.universalSearchNuxt.visitorJobSearchV1"))?;
    let results = page
        .results
        .ok_or_else(|| missing("data.search.universalSearchNuxt.visitorJobSearchV1.results"))?;

    let mut listings = Vec::with_capacity(results.len());
    for raw in results {
        match raw.into_listing() {
            Some(listing) => listings.push(listing),
            None => warn!("listing record has no id, skipped"),
        }
    }
    Ok(listings)
}

fn missing(path: &str) -> SourceError {
    SourceError::MalformedResponse(format!("missing {path} in response"))
}

impl RawListing {
    fn into_listing(self) -> Option<Listing> {
        let id = self.id.filter(|id| !id.is_empty())?;

        let job = self.job_tile.and_then(|tile| tile.job);
        let (listing_ref, pricing, published_at) = match job {
            Some(job) => {
                let pricing = match job.hourly_budget_min {
                    Some(min) => Pricing::Hourly { min, max: job.hourly_budget_max },
                    None => Pricing::Fixed,
                };
                let published_at = job
                    .publish_time
                    .as_deref()
                    .and_then(parse_timestamp)
                    .or_else(|| job.create_time.as_deref().and_then(parse_timestamp));
                (job.ciphertext.unwrap_or_default(), pricing, published_at)
            }
            None => (String::new(), Pricing::Fixed, None),
        };

        let skills = self
            .ontology_skills
            .into_iter()
            .filter_map(|skill| {
                let label = skill.pretty_name.or(skill.pref_label)?;
                let label = label.trim().to_string();
                if label.is_empty() { None } else { Some(Skill { label }) }
            })
            .collect();

        Some(Listing {
            id,
            title: self.title.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            skills,
            pricing,
            listing_ref,
            published_at,
        })
    }
}

/// Timestamps arrive either as RFC 3339 strings or as epoch milliseconds
/// wrapped in a string.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    raw.parse::<i64>()
        .ok()
        .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
}
