use chrono::Datelike;
use futures_util::future::join_all;
use tracing::{debug, warn};

use crate::capability::{SearchProvider, SearchQuery, SearchResult};
use crate::config::{ResearchConfig, SiteConfig};
use crate::pipeline::state::{PostState, ResearchDelta};

/// Expands the query templates for `topic`, keeping at most `max_queries`.
pub fn build_queries(topic: &str, research: &ResearchConfig, year: i32) -> Vec<String> {
    research
        .query_templates
        .iter()
        .take(research.max_queries)
        .map(|template| {
            template
                .replace("{topic}", topic)
                .replace("{year}", &year.to_string())
        })
        .collect()
}

/// Substring match of the lowercased URL against the marker list.
pub fn is_academic(url: &str, markers: &[String]) -> bool {
    let url = url.to_lowercase();
    markers.iter().any(|m| url.contains(m.as_str()))
}

pub fn format_snippet(result: &SearchResult) -> String {
    let title = if result.title.is_empty() {
        "Unknown"
    } else {
        result.title.as_str()
    };
    format!(
        "Source: {}\nURL: {}\nContent: {}\n",
        title, result.url, result.content
    )
}

/// Runs every query and never fails: a failed query leaves an inline error
/// snippet in its slot. Results keep query order.
pub async fn run(
    state: &PostState,
    site: &SiteConfig,
    search: &dyn SearchProvider,
) -> ResearchDelta {
    let year = chrono::Local::now().year();
    let queries = build_queries(&state.request.topic, &site.research, year);

    let outcomes = join_all(queries.iter().map(|query| {
        let request = SearchQuery {
            query: query.clone(),
            max_results: site.research.max_results,
            include_domains: site.research.include_domains.clone(),
        };
        async move { search.search(&request).await }
    }))
    .await;

    let mut research = Vec::new();
    let mut academic_sources = Vec::new();

    for (query, outcome) in queries.iter().zip(outcomes) {
        match outcome {
            Ok(results) => {
                debug!(query = %query, results = results.len(), "Search finished");
                for result in &results {
                    research.push(format_snippet(result));
                    if is_academic(&result.url, &site.research.academic_markers) {
                        academic_sources.push(format!("{} - {}", result.title, result.url));
                    }
                }
            }
            Err(e) => {
                warn!(query = %query, error = %e, "Search failed, continuing");
                research.push(format!("Search error for '{}': {}", query, e));
            }
        }
    }

    ResearchDelta {
        research,
        academic_sources,
    }
}
