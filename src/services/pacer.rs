use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use crate::configuration::TrackerSettings;

/// Clock seam for the pacer. Production uses [`TokioSleeper`]; tests inject
/// a recorder instead of waiting out real delays.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[async_trait]
impl<S: Sleeper> Sleeper for std::sync::Arc<S> {
    async fn sleep(&self, duration: Duration) {
        self.as_ref().sleep(duration).await;
    }
}

/// Paces SERP requests: a base delay plus random jitter after every keyword
/// and a larger one between batches. Keeping requests slow and irregular is
/// the whole point; the tracker never bypasses this component.
pub struct RequestPacer<S: Sleeper> {
    sleeper: S,
    keyword_delay: Duration,
    keyword_jitter: (f64, f64),
    batch_delay: Duration,
    batch_jitter: (f64, f64),
}

impl<S: Sleeper> RequestPacer<S> {
    pub fn new(settings: &TrackerSettings, sleeper: S) -> Self {
        RequestPacer {
            sleeper,
            keyword_delay: Duration::from_secs(settings.keyword_delay_secs),
            keyword_jitter: (
                settings.keyword_jitter_min_secs,
                settings.keyword_jitter_max_secs,
            ),
            batch_delay: Duration::from_secs(settings.batch_delay_secs),
            batch_jitter: (
                settings.batch_jitter_min_secs,
                settings.batch_jitter_max_secs,
            ),
        }
    }

    pub async fn wait_after_keyword(&self) {
        let delay = jittered(self.keyword_delay, self.keyword_jitter);
        log::debug!("Pausing {:.1}s before next keyword", delay.as_secs_f64());
        self.sleeper.sleep(delay).await;
    }

    pub async fn wait_between_batches(&self) {
        let delay = jittered(self.batch_delay, self.batch_jitter);
        log::info!("Pausing {:.1}s before next batch", delay.as_secs_f64());
        self.sleeper.sleep(delay).await;
    }
}

fn jittered(base: Duration, (min, max): (f64, f64)) -> Duration {
    let jitter = match max > min {
        true => rand::thread_rng().gen_range(min..max),
        false => min,
    };
    base + Duration::from_secs_f64(jitter)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::Sleeper;

    /// Records every requested delay instead of sleeping.
    #[derive(Default)]
    pub struct RecordingSleeper {
        pub waits: Mutex<Vec<Duration>>,
    }

    impl RecordingSleeper {
        pub fn shared() -> Arc<Self> {
            Arc::new(RecordingSleeper::default())
        }

        pub fn recorded(&self) -> Vec<Duration> {
            self.waits.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.waits.lock().unwrap().push(duration);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::test_support::RecordingSleeper;
    use super::RequestPacer;
    use crate::configuration::TrackerSettings;

    fn settings() -> TrackerSettings {
        TrackerSettings {
            batch_size: 5,
            keyword_delay_secs: 10,
            keyword_jitter_min_secs: 2.0,
            keyword_jitter_max_secs: 8.0,
            batch_delay_secs: 15,
            batch_jitter_min_secs: 5.0,
            batch_jitter_max_secs: 15.0,
            captcha_retries: 10,
        }
    }

    #[tokio::test]
    async fn keyword_waits_stay_within_jitter_bounds() {
        let sleeper = RecordingSleeper::shared();
        let pacer = RequestPacer::new(&settings(), sleeper.clone());

        for _ in 0..20 {
            pacer.wait_after_keyword().await;
        }

        for wait in sleeper.recorded() {
            assert!(wait >= Duration::from_secs(12), "wait too short: {:?}", wait);
            assert!(wait < Duration::from_secs(18), "wait too long: {:?}", wait);
        }
    }

    #[tokio::test]
    async fn batch_waits_use_the_larger_delay() {
        let sleeper = RecordingSleeper::shared();
        let pacer = RequestPacer::new(&settings(), sleeper.clone());

        pacer.wait_between_batches().await;

        let recorded = sleeper.recorded();
        assert_eq!(recorded.len(), 1);
        assert!(recorded[0] >= Duration::from_secs(20));
        assert!(recorded[0] < Duration::from_secs(30));
    }
}
