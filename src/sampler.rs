use std::pin::Pin;
use std::task::{Context, Poll};

use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::Stream;

// ─── Configuration ───────────────────────────────────────────────

/// How many generated values may wait for the worker before the
/// producer blocks.
const BUFFER_SIZE: usize = 1_000;

/// Fixed shape of the metric distribution.
const SKEW: f64 = 5.0;
const OFFSET: f64 = 20.0;
const MAX_VALUE: u64 = 100;

// ─── Zipf distribution ───────────────────────────────────────────

#[derive(Debug, Error, PartialEq)]
#[error("invalid zipf parameters: s = {s} (must be > 1), v = {v} (must be >= 1)")]
pub struct ZipfError {
    pub s: f64,
    pub v: f64,
}

/// Heavy-tailed distribution over `0..=imax` with `P(k) ∝ (v + k)^(-s)`.
///
/// Sampling uses rejection-inversion (Hörmann & Derflinger), so each draw
/// costs a handful of floating point ops regardless of `imax`.
#[derive(Debug, Clone, Copy)]
pub struct Zipf {
    imax: f64,
    v: f64,
    q: f64,
    s: f64,
    one_minus_q: f64,
    one_minus_q_inv: f64,
    hxm: f64,
    hx0_minus_hxm: f64,
}

impl Zipf {
    pub fn new(s: f64, v: f64, imax: u64) -> Result<Self, ZipfError> {
        if !(s > 1.0) || !(v >= 1.0) {
            return Err(ZipfError { s, v });
        }

        let mut z = Self {
            imax: imax as f64,
            v,
            q: s,
            s: 0.0,
            one_minus_q: 1.0 - s,
            one_minus_q_inv: 1.0 / (1.0 - s),
            hxm: 0.0,
            hx0_minus_hxm: 0.0,
        };
        z.hxm = z.h(z.imax + 0.5);
        z.hx0_minus_hxm = z.h(0.5) - (z.v.ln() * -z.q).exp() - z.hxm;
        z.s = 1.0 - z.hinv(z.h(1.5) - (-z.q * (z.v + 1.0).ln()).exp());
        Ok(z)
    }

    fn h(&self, x: f64) -> f64 {
        (self.one_minus_q * (self.v + x).ln()).exp() * self.one_minus_q_inv
    }

    fn hinv(&self, x: f64) -> f64 {
        (self.one_minus_q_inv * (self.one_minus_q * x).ln()).exp() - self.v
    }
}

impl Distribution<u64> for Zipf {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u64 {
        loop {
            let r: f64 = rng.gen();
            let ur = self.hxm + r * self.hx0_minus_hxm;
            let x = self.hinv(ur);
            let k = (x + 0.5).floor();

            if k - x <= self.s {
                return k as u64;
            }
            if ur >= self.h(k + 0.5) - (-(k + self.v).ln() * self.q).exp() {
                return k as u64;
            }
        }
    }
}

// ─── Sampler ─────────────────────────────────────────────────────

/// A finite stream of metric values produced by a background task.
///
/// Values arrive in generation order. Dropping the stream early makes the
/// producer's next send fail, which ends the task.
pub struct Sampler {
    values: ReceiverStream<u64>,
}

impl Sampler {
    /// Spawns the producer on the current Tokio runtime and returns
    /// immediately. `count = 0` yields a stream that ends right away.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn spawn(count: u64, seed: u64) -> Self {
        let (tx, rx) = mpsc::channel(BUFFER_SIZE);

        tokio::spawn(async move {
            let mut rng = StdRng::seed_from_u64(seed);
            let zipf = metric_distribution();

            for _ in 0..count {
                if tx.send(zipf.sample(&mut rng)).await.is_err() {
                    break;
                }
            }
        });

        Self {
            values: ReceiverStream::new(rx),
        }
    }
}

impl Stream for Sampler {
    type Item = u64;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<u64>> {
        Pin::new(&mut self.values).poll_next(cx)
    }
}

fn metric_distribution() -> Zipf {
    match Zipf::new(SKEW, OFFSET, MAX_VALUE) {
        Ok(z) => z,
        Err(e) => unreachable!("constant distribution parameters are valid: {e}"),
    }
}
