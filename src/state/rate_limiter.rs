use crate::config::CrawlerConfig;
use crate::url::domain_key;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Soft upper bound on the number of domains tracked at once
pub const DEFAULT_MAX_DOMAINS: usize = 1024;

type Slot = Arc<tokio::sync::Mutex<Option<Instant>>>;

#[derive(Debug, Default)]
struct Slots {
    by_domain: HashMap<String, Slot>,
    /// Longest delay any caller has asked for; entries younger than this
    /// still carry pacing information and must not be evicted
    longest_delay: Duration,
}

/// Enforces a minimum delay between requests to the same domain
///
/// Each domain gets its own async lock guarding the time of its last request.
/// A caller holds that lock while it reads the last time, sleeps, and records
/// the new time, so two workers on one domain cannot both observe a stale
/// timestamp. Workers on different domains never share a lock beyond the
/// short map lookup.
///
/// The map is bounded: once it holds `max_domains` entries, idle entries whose
/// last request is older than every delay in use are evicted before a new
/// domain is added.
#[derive(Debug)]
pub struct DomainRateLimiter {
    delay: Duration,
    max_domains: usize,
    slots: Mutex<Slots>,
}

impl DomainRateLimiter {
    /// Creates a limiter enforcing `delay` between same-domain requests
    pub fn new(delay: Duration) -> Self {
        Self::with_capacity(delay, DEFAULT_MAX_DOMAINS)
    }

    /// Creates a limiter with an explicit bound on tracked domains
    pub fn with_capacity(delay: Duration, max_domains: usize) -> Self {
        Self {
            delay,
            max_domains: max_domains.max(1),
            slots: Mutex::new(Slots {
                by_domain: HashMap::new(),
                longest_delay: delay,
            }),
        }
    }

    /// Creates a limiter from the crawler's `request-delay` setting
    pub fn from_config(config: &CrawlerConfig) -> Self {
        let delay = Duration::try_from_secs_f64(config.request_delay).unwrap_or(Duration::ZERO);
        Self::new(delay)
    }

    /// The configured minimum delay
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Waits until the configured delay has passed since the last request to
    /// `url`'s domain, then records the current time for that domain
    pub async fn wait(&self, url: &str) {
        self.wait_with_delay(url, self.delay).await;
    }

    /// Like [`wait`](Self::wait), with a caller-supplied delay
    ///
    /// Used when a domain asks for a longer spacing than the configured one,
    /// such as a robots.txt `Crawl-delay`.
    pub async fn wait_with_delay(&self, url: &str, delay: Duration) {
        let domain = domain_key(url);
        let slot = self.slot(&domain, delay);

        let mut last = slot.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < delay {
                let remaining = delay - elapsed;
                tracing::trace!("Rate limiting {} for {:?}", domain, remaining);
                tokio::time::sleep(remaining).await;
            }
        }
        *last = Some(Instant::now());
    }

    /// Number of domains currently tracked
    pub fn tracked_domains(&self) -> usize {
        self.lock_slots().by_domain.len()
    }

    fn lock_slots(&self) -> MutexGuard<'_, Slots> {
        // The map holds no invariants a panicking holder could break
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn slot(&self, domain: &str, delay: Duration) -> Slot {
        let mut slots = self.lock_slots();
        if delay > slots.longest_delay {
            slots.longest_delay = delay;
        }

        if let Some(slot) = slots.by_domain.get(domain) {
            return Arc::clone(slot);
        }

        if slots.by_domain.len() >= self.max_domains {
            evict_idle(&mut slots);
        }

        let slot: Slot = Arc::new(tokio::sync::Mutex::new(None));
        slots.by_domain.insert(domain.to_string(), Arc::clone(&slot));
        slot
    }
}

fn evict_idle(slots: &mut Slots) {
    let retention = slots.longest_delay;
    let before = slots.by_domain.len();

    slots.by_domain.retain(|_, slot| {
        // Someone is waiting on or holding this domain
        if Arc::strong_count(slot) > 1 {
            return true;
        }
        match slot.try_lock() {
            Ok(last) => matches!(*last, Some(t) if t.elapsed() < retention),
            Err(_) => true,
        }
    });

    let evicted = before - slots.by_domain.len();
    if evicted == 0 {
        tracing::debug!(
            "Rate limiter over capacity with no idle domains ({} tracked)",
            before
        );
    } else {
        tracing::trace!("Evicted {} idle domains from rate limiter", evicted);
    }
}
