//! GraphQL request construction for the visitor job search.

use serde_json::{json, Value};

/// Search query document. Field aliases follow the public endpoint's schema
/// (`cipherText` is exposed aliased to `ciphertext`).
pub(crate) const VISITOR_JOB_SEARCH_QUERY: &str = r#"
query VisitorJobSearch($requestVariables: VisitorJobSearchV1Request!) {
  search {
    universalSearchNuxt {
      visitorJobSearchV1(request: $requestVariables) {
        paging {
          total
          offset
          count
        }
        results {
          id
          title
          description
          ontologySkills {
            prefLabel
            prettyName: prefLabel
          }
          jobTile {
            job {
              ciphertext: cipherText
              publishTime
              createTime
              hourlyBudgetMin
              hourlyBudgetMax
            }
          }
        }
      }
    }
  }
}
"#;

/// Build the POST body for one page of results.
pub(crate) fn request_body(offset: u32, count: u32, search_term: &str, skill_uid: &str) -> Value {
    json!({
        "query": VISITOR_JOB_SEARCH_QUERY,
        "variables": {
            "requestVariables": {
                "ontologySkillUid": [skill_uid],
                "userQuery": search_term,
                "sort": "recency",
                "highlight": true,
                "paging": {
                    "offset": offset,
                    "count": count,
                },
            }
        }
    })
}
