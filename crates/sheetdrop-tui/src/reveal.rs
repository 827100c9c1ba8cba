//! Staged reveal of statistic cards.
//!
//! Card `i` appears `i × stagger` after the reveal starts, waits `count_delay`,
//! then counts from 0 to its target over `count_duration` on an ease-out cubic
//! curve.  Every frame is computed from the time elapsed since the start on a
//! monotonic clock, so a stalled or suspended terminal picks up exactly where
//! the clock says it should be.

use std::time::{Duration, Instant};

use sheetdrop_proto::config::AnimationConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealTiming {
    pub stagger: Duration,
    pub count_delay: Duration,
    pub count_duration: Duration,
}

impl Default for RevealTiming {
    fn default() -> Self {
        Self::from(&AnimationConfig::default())
    }
}

impl From<&AnimationConfig> for RevealTiming {
    fn from(cfg: &AnimationConfig) -> Self {
        Self {
            stagger: Duration::from_millis(cfg.stagger_ms),
            count_delay: Duration::from_millis(cfg.count_delay_ms),
            count_duration: Duration::from_millis(cfg.count_duration_ms),
        }
    }
}

/// What one card shows at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardFrame {
    pub visible: bool,
    pub value: u64,
    /// The card has reached its final value and needs no further frames.
    pub settled: bool,
}

/// `1 - (1 - p)^3`, with `p` clamped to `[0, 1]`.
pub fn ease_out_cubic(p: f64) -> f64 {
    let p = p.clamp(0.0, 1.0);
    1.0 - (1.0 - p).powi(3)
}

impl RevealTiming {
    pub fn entrance_delay(&self, index: usize) -> Duration {
        self.stagger * index as u32
    }

    pub fn count_start(&self, index: usize) -> Duration {
        self.entrance_delay(index) + self.count_delay
    }

    /// Frame of card `index` counting to `target`, `elapsed` after the start.
    pub fn frame(&self, index: usize, target: u64, elapsed: Duration) -> CardFrame {
        if elapsed < self.entrance_delay(index) {
            return CardFrame {
                visible: false,
                value: 0,
                settled: false,
            };
        }
        if target == 0 {
            return CardFrame {
                visible: true,
                value: 0,
                settled: true,
            };
        }

        let start = self.count_start(index);
        let progress = if elapsed <= start {
            0.0
        } else if self.count_duration.is_zero() {
            1.0
        } else {
            (elapsed - start).as_secs_f64() / self.count_duration.as_secs_f64()
        };
        let eased = ease_out_cubic(progress);
        let value = ((target as f64) * eased).round().min(target as f64) as u64;
        CardFrame {
            visible: true,
            value,
            settled: progress >= 1.0,
        }
    }

    /// Time after which every card of a reveal with `count` cards has settled.
    pub fn total_duration(&self, count: usize) -> Duration {
        match count {
            0 => Duration::ZERO,
            n => self.count_start(n - 1) + self.count_duration,
        }
    }
}

/// A running reveal over an ordered list of targets.
#[derive(Debug, Clone)]
pub struct Reveal {
    timing: RevealTiming,
    targets: Vec<u64>,
    started: Instant,
}

impl Reveal {
    pub fn start(timing: RevealTiming, targets: Vec<u64>, now: Instant) -> Self {
        Self {
            timing,
            targets,
            started: now,
        }
    }

    /// Play the whole reveal again from the first card.
    pub fn restart(&mut self, now: Instant) {
        self.started = now;
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started)
    }

    pub fn frames(&self, now: Instant) -> Vec<CardFrame> {
        let elapsed = self.elapsed(now);
        self.targets
            .iter()
            .enumerate()
            .map(|(i, &target)| self.timing.frame(i, target, elapsed))
            .collect()
    }

    /// True once no card needs another frame.
    pub fn is_finished(&self, now: Instant) -> bool {
        self.elapsed(now) >= self.timing.total_duration(self.targets.len())
    }
}

/// Group digits in threes with commas: `1500` → `1,500`.
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_ease_out_cubic_endpoints_and_shape() {
        assert_eq!(ease_out_cubic(0.0), 0.0);
        assert_eq!(ease_out_cubic(1.0), 1.0);
        assert!((ease_out_cubic(0.5) - 0.875).abs() < 1e-12);
        assert_eq!(ease_out_cubic(-3.0), 0.0);
        assert_eq!(ease_out_cubic(7.0), 1.0);
    }

    #[test]
    fn test_entrance_is_linear_stagger() {
        let t = RevealTiming::default();
        for i in 0..10 {
            assert_eq!(t.entrance_delay(i), ms(80 * i as u64));
        }
        assert!(!t.frame(3, 10, ms(239)).visible);
        assert!(t.frame(3, 10, ms(240)).visible);
    }

    #[test]
    fn test_zero_target_never_animates() {
        let t = RevealTiming::default();
        let f = t.frame(0, 0, Duration::ZERO);
        assert_eq!(
            f,
            CardFrame {
                visible: true,
                value: 0,
                settled: true
            }
        );
        assert_eq!(t.frame(0, 0, ms(600)).value, 0);
    }

    #[test]
    fn test_count_up_waits_then_reaches_target() {
        let t = RevealTiming::default();
        // Visible but still waiting for the count delay.
        assert_eq!(t.frame(1, 1500, ms(80)).value, 0);
        assert_eq!(t.frame(1, 1500, ms(280)).value, 0);
        // Halfway through the count: 1500 * 0.875.
        assert_eq!(t.frame(1, 1500, ms(280 + 450)).value, 1313);
        let done = t.frame(1, 1500, ms(280 + 900));
        assert_eq!(done.value, 1500);
        assert!(done.settled);
        assert_eq!(t.frame(1, 1500, ms(60_000)).value, 1500);
    }

    #[test]
    fn test_count_up_is_monotonic_and_bounded() {
        let t = RevealTiming::default();
        for target in [1u64, 7, 999, 1500, 123_456_789] {
            let mut last = 0;
            for step in 0..=1500 {
                let v = t.frame(0, target, ms(step)).value;
                assert!(v >= last, "regressed at {}ms for {}", step, target);
                assert!(v <= target, "overshot at {}ms for {}", step, target);
                last = v;
            }
            assert_eq!(last, target);
        }
    }

    #[test]
    fn test_reveal_finishes_after_last_card() {
        let t = RevealTiming::default();
        let now = Instant::now();
        let reveal = Reveal::start(t, vec![0, 1500, 42], now);
        assert_eq!(t.total_duration(3), ms(160 + 200 + 900));
        assert!(!reveal.is_finished(now));
        assert!(!reveal.is_finished(now + ms(1259)));
        assert!(reveal.is_finished(now + ms(1260)));

        let frames = reveal.frames(now);
        assert_eq!(frames.len(), 3);
        assert!(frames[0].visible && frames[0].settled);
        assert!(!frames[1].visible && !frames[2].visible);
    }

    #[test]
    fn test_restart_replays_from_hidden() {
        let now = Instant::now();
        let mut reveal = Reveal::start(RevealTiming::default(), vec![5, 5], now);
        let later = now + ms(5_000);
        assert!(reveal.is_finished(later));
        reveal.restart(later);
        assert!(!reveal.frames(later)[1].visible);
        assert!(!reveal.is_finished(later));
    }

    #[test]
    fn test_empty_reveal_is_finished() {
        let now = Instant::now();
        let reveal = Reveal::start(RevealTiming::default(), Vec::new(), now);
        assert!(reveal.frames(now).is_empty());
        assert!(reveal.is_finished(now));
    }

    #[test]
    fn test_format_count_groups_thousands() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1500), "1,500");
        assert_eq!(format_count(1_234_567), "1,234,567");
        assert_eq!(format_count(100_000), "100,000");
    }
}
