use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("aictl.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("aictl.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("aictl.client.request_duration_seconds");

pub(crate) static STREAM_CHUNKS: Counter = Counter::new("aictl.stream.chunks");
pub(crate) static STREAM_ERRORS: Counter = Counter::new("aictl.stream.errors");
pub(crate) static STREAM_BYTES: Counter = Counter::new("aictl.stream.bytes");
pub(crate) static STREAM_TTFB: Moments = Moments::new("aictl.stream.ttfb_seconds");
pub(crate) static STREAM_DURATION: Moments = Moments::new("aictl.stream.duration_seconds");

pub(crate) static CONTENT_FILE_READS: Counter = Counter::new("aictl.content.file_reads");
pub(crate) static CONTENT_FILE_ERRORS: Counter = Counter::new("aictl.content.file_errors");
pub(crate) static CONTENT_URL_FETCHES: Counter = Counter::new("aictl.content.url_fetches");
pub(crate) static CONTENT_URL_ERRORS: Counter = Counter::new("aictl.content.url_errors");

pub(crate) static CHAT_TURNS: Counter = Counter::new("aictl.chat.turns");
pub(crate) static CHAT_TURN_ERRORS: Counter = Counter::new("aictl.chat.turn_errors");
pub(crate) static CHAT_INGESTED: Counter = Counter::new("aictl.chat.ingested");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&STREAM_CHUNKS);
    collector.register_counter(&STREAM_ERRORS);
    collector.register_counter(&STREAM_BYTES);
    collector.register_moments(&STREAM_TTFB);
    collector.register_moments(&STREAM_DURATION);

    collector.register_counter(&CONTENT_FILE_READS);
    collector.register_counter(&CONTENT_FILE_ERRORS);
    collector.register_counter(&CONTENT_URL_FETCHES);
    collector.register_counter(&CONTENT_URL_ERRORS);

    collector.register_counter(&CHAT_TURNS);
    collector.register_counter(&CHAT_TURN_ERRORS);
    collector.register_counter(&CHAT_INGESTED);
}
