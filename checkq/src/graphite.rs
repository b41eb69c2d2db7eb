//! Graphite render API helpers: URLs for fetching a check's data and the
//! JSON series it returns.

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::format::dedent;
use crate::query::{encode_component, Query};
use crate::Result;

/// Minutes of history shown in chart links.
pub const CHART_MINUTES: u32 = 30;

/// One `[value, timestamp]` pair. Either side may be null.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Datapoint(pub Option<f64>, pub Option<f64>);

/// A single target from a `format=json` render response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub target: String,
    pub datapoints: Vec<Datapoint>,
}

impl Series {
    /// Non-null values in order.
    pub fn values(&self) -> Vec<f64> {
        self.datapoints.iter().filter_map(|p| p.0).collect()
    }
}

/// Decode a render response body.
pub fn parse_response(body: &str) -> Result<Vec<Series>> {
    Ok(serde_json::from_str(body)?)
}

/// URL that fetches the data a check evaluates.
pub fn render_url(config: &Config, q: &Query) -> String {
    format!(
        "{}/render?target={}&format=json&from=-{}s&until=-{}s",
        config.graphite_addr,
        encode_component(&dedent(&q.metric)),
        q.from.as_secs(),
        q.until.as_secs(),
    )
}

/// URL of a PNG chart of the metric's recent history.
pub fn chart_url(config: &Config, q: &Query) -> String {
    let metric = dedent(&q.metric);
    let title = format!("Last {} minutes of data for {}", CHART_MINUTES, metric);
    format!(
        "{}/render?target={}&from=-{}mins&width=800&height=600&yMin=0&title={}",
        config.graphite_addr,
        encode_component(&metric),
        CHART_MINUTES,
        encode_component(&title),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Aggregate, CompareOp, Comparison};

    fn query() -> Query {
        Query::new(
            "sumSeries(web.*.rate)",
            "1h30m".parse().unwrap(),
            "5m".parse().unwrap(),
            vec![Comparison::new(Aggregate::Avg, CompareOp::Lt, 10.0)],
        )
    }

    #[test]
    fn test_render_url() {
        let config = Config::default();
        assert_eq!(
            render_url(&config, &query()),
            "http://localhost:8080/render?target=sumSeries(web.*.rate)&format=json&from=-5400s&until=-300s"
        );
    }

    #[test]
    fn test_chart_url() {
        let url = chart_url(&Config::default(), &query());
        assert!(url.starts_with("http://localhost:8080/render?target=sumSeries(web.*.rate)&from=-30mins"));
        assert!(url.ends_with("&title=Last%2030%20minutes%20of%20data%20for%20sumSeries(web.*.rate)"));
    }

    #[test]
    fn test_parse_response() {
        let body = r#"[
            {"target": "web.a.rate", "datapoints": [[1.5, 1700000000], [null, 1700000060], [3, 1700000120]]},
            {"target": "web.b.rate", "datapoints": []}
        ]"#;
        let series = parse_response(body).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].target, "web.a.rate");
        assert_eq!(series[0].values(), vec![1.5, 3.0]);
        assert!(series[1].values().is_empty());
    }

    #[test]
    fn test_parse_response_rejects_garbage() {
        assert!(parse_response("<html>oops</html>").is_err());
    }
}
