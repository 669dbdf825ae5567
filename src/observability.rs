use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("bestbro.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("bestbro.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("bestbro.client.request_duration_seconds");

pub(crate) static SESSION_SENDS: Counter = Counter::new("bestbro.session.sends");
pub(crate) static SESSION_SENDS_DROPPED: Counter = Counter::new("bestbro.session.sends_dropped");
pub(crate) static SESSION_CONFIGURATION_ERRORS: Counter =
    Counter::new("bestbro.session.configuration_errors");
pub(crate) static SESSION_REPLIES: Counter = Counter::new("bestbro.session.replies");
pub(crate) static SESSION_EMPTY_REPLIES: Counter = Counter::new("bestbro.session.empty_replies");
pub(crate) static SESSION_FAILURES: Counter = Counter::new("bestbro.session.failures");

pub(crate) static CREDENTIAL_WRITES: Counter = Counter::new("bestbro.credentials.writes");
pub(crate) static CREDENTIAL_REMOVALS: Counter = Counter::new("bestbro.credentials.removals");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&SESSION_SENDS);
    collector.register_counter(&SESSION_SENDS_DROPPED);
    collector.register_counter(&SESSION_CONFIGURATION_ERRORS);
    collector.register_counter(&SESSION_REPLIES);
    collector.register_counter(&SESSION_EMPTY_REPLIES);
    collector.register_counter(&SESSION_FAILURES);

    collector.register_counter(&CREDENTIAL_WRITES);
    collector.register_counter(&CREDENTIAL_REMOVALS);
}
