//! 令牌桶限流器
//!
//! 整个服务共享一个令牌桶，保护上游的 IP 级配额。令牌按经过的时间惰性补充，
//! 数量始终位于 `[0, capacity]` 区间内。

use std::sync::Mutex;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

/// 浮点补充误差容忍度
const TOKEN_EPSILON: f64 = 1e-9;

/// 限流器统计信息
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LimiterStats {
    pub capacity: f64,
    pub tokens: f64,
    pub refill_rate: f64,
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// 令牌桶
#[derive(Debug)]
pub struct TokenBucket {
    capacity: f64,
    refill_rate: f64,
    state: Mutex<BucketState>,
}

impl BucketState {
    fn refill(&mut self, now: Instant, capacity: f64, refill_rate: f64) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * refill_rate).min(capacity);
        self.last_refill = now;
    }
}

impl TokenBucket {
    /// 创建满桶
    pub fn new(capacity: f64, refill_rate: f64) -> Self {
        tracing::info!(
            "限流器初始化: capacity={}, refill_rate={}/s",
            capacity,
            refill_rate
        );

        Self {
            capacity,
            refill_rate,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    /// 按每分钟请求数创建
    pub fn per_minute(requests_per_minute: u32) -> Self {
        let capacity = requests_per_minute as f64;
        Self::new(capacity, capacity / 60.0)
    }

    /// 立即尝试获取 `n` 个令牌，不等待
    pub fn try_acquire(&self, n: f64) -> bool {
        if n > self.capacity {
            tracing::warn!("请求令牌数 {} 超过桶容量 {}，永远无法满足", n, self.capacity);
            return false;
        }

        match self.take(n) {
            Some(Ok(remaining)) => {
                tracing::debug!("限流检查通过: remaining={:.2}", remaining);
                true
            }
            Some(Err(_)) => {
                tracing::warn!("限流触发: 令牌不足");
                false
            }
            None => false,
        }
    }

    /// 获取 `n` 个令牌
    ///
    /// `wait` 为 false 时与 [`try_acquire`](Self::try_acquire) 相同。否则挂起到
    /// 预计令牌足够或 `timeout` 到期（取较早者），然后再检查一次。等待者之间不保证公平。
    pub async fn acquire(&self, n: f64, wait: bool, timeout: Option<Duration>) -> bool {
        if n > self.capacity {
            tracing::warn!("请求令牌数 {} 超过桶容量 {}，永远无法满足", n, self.capacity);
            return false;
        }

        let deficit = match self.take(n) {
            Some(Ok(_)) => return true,
            Some(Err(deficit)) => deficit,
            None => return false,
        };

        if !wait {
            tracing::warn!("限流触发: 令牌不足，缺少 {:.2}", deficit);
            return false;
        }

        let mut delay = Duration::try_from_secs_f64(deficit / self.refill_rate)
            .unwrap_or(Duration::MAX);
        if let Some(timeout) = timeout {
            delay = delay.min(timeout);
        }

        tracing::debug!("等待令牌补充: {:?}", delay);
        tokio::time::sleep(delay).await;

        match self.take(n) {
            Some(Ok(_)) => true,
            _ => {
                tracing::warn!("等待后仍无可用令牌，拒绝请求");
                false
            }
        }
    }

    /// 当前可用令牌数（会先补充）
    pub fn remaining(&self) -> f64 {
        self.with_state(|state| {
            state.refill(Instant::now(), self.capacity, self.refill_rate);
            state.tokens
        })
        .unwrap_or(0.0)
    }

    /// 重置为满桶
    pub fn reset(&self) {
        self.with_state(|state| {
            state.tokens = self.capacity;
            state.last_refill = Instant::now();
        });
        tracing::info!("重置限流器");
    }

    pub fn stats(&self) -> LimiterStats {
        LimiterStats {
            capacity: self.capacity,
            tokens: self.remaining(),
            refill_rate: self.refill_rate,
        }
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn refill_rate(&self) -> f64 {
        self.refill_rate
    }

    /// 补充后扣减；成功返回剩余令牌，失败返回缺口
    fn take(&self, n: f64) -> Option<Result<f64, f64>> {
        self.with_state(|state| {
            state.refill(Instant::now(), self.capacity, self.refill_rate);
            if state.tokens + TOKEN_EPSILON >= n {
                state.tokens = (state.tokens - n).max(0.0);
                Ok(state.tokens)
            } else {
                Err(n - state.tokens)
            }
        })
    }

    /// 锁中毒时返回 None，调用方按拒绝处理
    fn with_state<R>(&self, f: impl FnOnce(&mut BucketState) -> R) -> Option<R> {
        match self.state.lock() {
            Ok(mut state) => Some(f(&mut state)),
            Err(_) => {
                tracing::warn!("限流器锁中毒，本次请求按拒绝处理");
                self.state.clear_poison();
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_exactly_capacity_grants_then_denial() {
        for capacity in [1u32, 3, 10] {
            let bucket = TokenBucket::new(capacity as f64, 0.001);
            for _ in 0..capacity {
                assert!(bucket.try_acquire(1.0));
            }
            assert!(!bucket.try_acquire(1.0));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_refill_is_capped_at_capacity() {
        let bucket = TokenBucket::new(5.0, 10.0);
        assert!(bucket.try_acquire(5.0));

        tokio::time::advance(Duration::from_secs(100)).await;
        assert_eq!(bucket.remaining(), 5.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_larger_than_capacity_is_denied_immediately() {
        let bucket = TokenBucket::new(2.0, 1.0);
        let start = Instant::now();

        assert!(!bucket.acquire(3.0, true, None).await);
        assert_eq!(Instant::now(), start);
        assert_eq!(bucket.remaining(), 2.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_sleeps_for_deficit() {
        let bucket = TokenBucket::new(1.0, 2.0);
        assert!(bucket.try_acquire(1.0));

        let start = Instant::now();
        assert!(bucket.acquire(1.0, true, Some(Duration::from_secs(5))).await);
        let waited = Instant::now() - start;
        assert!(waited >= Duration::from_millis(500) && waited < Duration::from_millis(510));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_bounded_by_timeout() {
        let bucket = TokenBucket::new(1.0, 1.0 / 60.0);
        assert!(bucket.try_acquire(1.0));

        let start = Instant::now();
        assert!(!bucket.acquire(1.0, true, Some(Duration::from_secs(1))).await);
        let waited = Instant::now() - start;
        assert!(waited >= Duration::from_secs(1) && waited < Duration::from_millis(1010));
    }

    #[tokio::test(start_paused = true)]
    async fn test_per_minute_and_reset() {
        let bucket = TokenBucket::per_minute(60);
        assert_eq!(bucket.capacity(), 60.0);
        assert_eq!(bucket.refill_rate(), 1.0);

        assert!(bucket.try_acquire(60.0));
        assert!(!bucket.try_acquire(1.0));

        bucket.reset();
        let stats = bucket.stats();
        assert_eq!(stats.tokens, 60.0);
        assert_eq!(stats.capacity, 60.0);
    }
}
