use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// 间隔生成器，供生产者调度和Worker模拟处理时长使用
///
/// 实现需要支持并发调用，内部状态使用原子量维护。
pub trait BackoffStrategy: Send + Sync {
    fn next_interval(&self) -> Duration;
}

/// 在基础间隔上叠加 `[-jitter, +jitter]` 比例的随机抖动，结果不小于零
fn apply_jitter(interval: Duration, jitter: f64) -> Duration {
    if jitter <= 0.0 || interval.is_zero() {
        return interval;
    }
    let base = interval.as_secs_f64();
    let offset = base * jitter * (rand::random::<f64>() - 0.5) * 2.0;
    Duration::from_secs_f64((base + offset).max(0.0))
}

/// 固定间隔
#[derive(Debug, Clone)]
pub struct LinearBackoff {
    interval: Duration,
    jitter: f64,
}

impl LinearBackoff {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            jitter: 0.0,
        }
    }

    /// 设置随机抖动比例（0.0-1.0）
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.clamp(0.0, 1.0);
        self
    }
}

impl BackoffStrategy for LinearBackoff {
    fn next_interval(&self) -> Duration {
        apply_jitter(self.interval, self.jitter)
    }
}

/// 指数退避：第n次调用返回 `start * 2^n`，不超过 `max`
#[derive(Debug)]
pub struct ExponentialBackoff {
    start: Duration,
    max: Duration,
    jitter: f64,
    attempt: AtomicU32,
}

impl ExponentialBackoff {
    pub fn new(start: Duration, max: Duration) -> Self {
        Self {
            start,
            max: max.max(start),
            jitter: 0.0,
            attempt: AtomicU32::new(0),
        }
    }

    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.clamp(0.0, 1.0);
        self
    }

    pub fn reset(&self) {
        self.attempt.store(0, Ordering::Relaxed);
    }
}

impl BackoffStrategy for ExponentialBackoff {
    fn next_interval(&self) -> Duration {
        let attempt = self.attempt.fetch_add(1, Ordering::Relaxed);
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        let interval = self
            .start
            .checked_mul(factor)
            .map_or(self.max, |d| d.min(self.max));
        apply_jitter(interval, self.jitter).min(self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_backoff_is_constant() {
        let backoff = LinearBackoff::new(Duration::from_millis(250));
        for _ in 0..5 {
            assert_eq!(backoff.next_interval(), Duration::from_millis(250));
        }
    }

    #[test]
    fn test_linear_backoff_jitter_bounds() {
        let backoff = LinearBackoff::new(Duration::from_millis(1000)).with_jitter(0.1);
        for _ in 0..100 {
            let interval = backoff.next_interval();
            assert!(interval >= Duration::from_millis(900));
            assert!(interval <= Duration::from_millis(1100));
        }
    }

    #[test]
    fn test_exponential_backoff_doubles_until_cap() {
        let backoff =
            ExponentialBackoff::new(Duration::from_millis(100), Duration::from_millis(1000));

        let intervals: Vec<u128> = (0..6).map(|_| backoff.next_interval().as_millis()).collect();
        assert_eq!(intervals, vec![100, 200, 400, 800, 1000, 1000]);

        backoff.reset();
        assert_eq!(backoff.next_interval(), Duration::from_millis(100));
    }

    #[test]
    fn test_exponential_backoff_survives_overflow() {
        let backoff = ExponentialBackoff::new(Duration::from_secs(1), Duration::from_secs(60));
        for _ in 0..100 {
            assert!(backoff.next_interval() <= Duration::from_secs(60));
        }
    }

    #[test]
    fn test_exponential_max_below_start_is_raised() {
        let backoff = ExponentialBackoff::new(Duration::from_secs(5), Duration::from_secs(1));
        assert_eq!(backoff.next_interval(), Duration::from_secs(5));
        assert_eq!(backoff.next_interval(), Duration::from_secs(5));
    }
}
