use lazy_static::lazy_static;
use prometheus::{register_counter_vec, register_histogram_vec, CounterVec, HistogramVec};

lazy_static! {
    pub static ref REQUESTS_COUNTER: CounterVec = register_counter_vec!(
        "family_api_requests_total",
        "Family endpoint requests by endpoint and outcome",
        &["endpoint", "outcome"]
    ).unwrap();

    pub static ref QUERY_DURATION: HistogramVec = register_histogram_vec!(
        "family_api_query_duration_seconds",
        "Time spent waiting on the family store, per endpoint",
        &["endpoint"]
    ).unwrap();
}

pub fn record_outcome(endpoint: &str, outcome: &str) {
    REQUESTS_COUNTER.with_label_values(&[endpoint, outcome]).inc();
}

pub fn observe_query(endpoint: &str, seconds: f64) {
    QUERY_DURATION.with_label_values(&[endpoint]).observe(seconds);
}
