use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("ragline.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("ragline.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("ragline.client.request_duration_seconds");

pub(crate) static AUTH_LOGINS: Counter = Counter::new("ragline.auth.logins");
pub(crate) static AUTH_FAILURES: Counter = Counter::new("ragline.auth.failures");
pub(crate) static AUTH_FORCED_LOGOUTS: Counter = Counter::new("ragline.auth.forced_logouts");

pub(crate) static STREAM_FRAMES: Counter = Counter::new("ragline.stream.frames");
pub(crate) static STREAM_ERRORS: Counter = Counter::new("ragline.stream.errors");
pub(crate) static STREAM_BYTES: Counter = Counter::new("ragline.stream.bytes");

pub(crate) static CHAT_SENDS: Counter = Counter::new("ragline.chat.sends");
pub(crate) static CHAT_SEND_REJECTED: Counter = Counter::new("ragline.chat.send_rejected");
pub(crate) static CHAT_SEND_ERRORS: Counter = Counter::new("ragline.chat.send_errors");
pub(crate) static CHAT_SEND_CANCELLED: Counter = Counter::new("ragline.chat.send_cancelled");
pub(crate) static CHAT_HYDRATION_FAILURES: Counter =
    Counter::new("ragline.chat.hydration_failures");
pub(crate) static CHAT_SEND_DURATION: Moments =
    Moments::new("ragline.chat.send_duration_seconds");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&AUTH_LOGINS);
    collector.register_counter(&AUTH_FAILURES);
    collector.register_counter(&AUTH_FORCED_LOGOUTS);

    collector.register_counter(&STREAM_FRAMES);
    collector.register_counter(&STREAM_ERRORS);
    collector.register_counter(&STREAM_BYTES);

    collector.register_counter(&CHAT_SENDS);
    collector.register_counter(&CHAT_SEND_REJECTED);
    collector.register_counter(&CHAT_SEND_ERRORS);
    collector.register_counter(&CHAT_SEND_CANCELLED);
    collector.register_counter(&CHAT_HYDRATION_FAILURES);
    collector.register_moments(&CHAT_SEND_DURATION);
}
