use mmc_sim::{DelaySampler, Time};
use std::collections::VecDeque;

/// Check whether two floats have a relative difference of at most 5e-5 times the smaller value.
#[macro_export]
macro_rules! assert_floats_near_equal {
    ($val1:expr, $val2:expr, $msg:expr) => {{
        let a: f64 = $val1;
        let b: f64 = $val2;
        let diff = (a - b).abs();
        let relative_diff = if a.abs() < b.abs() { diff / a.abs() } else { diff / b.abs() };
        assert!(relative_diff < 0.00005, "{}: {} vs {}", $msg, a, b);
    }};
}

/// Replays a fixed list of delays, then repeats the last one forever.
#[allow(dead_code)]
pub struct Script {
    delays: VecDeque<Time>,
    last: Time,
}

#[allow(dead_code)]
impl Script {
    pub fn boxed(delays: &[Time]) -> Box<dyn DelaySampler> {
        Box::new(Self {
            delays: delays.iter().copied().collect(),
            last: *delays.last().expect("script needs at least one delay"),
        })
    }
}

impl DelaySampler for Script {
    fn sample(&mut self) -> mmc_sim::Result<Time> {
        Ok(self.delays.pop_front().unwrap_or(self.last))
    }
}
