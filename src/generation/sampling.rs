use crate::config::SamplingConfig;
use candle_transformers::generation::Sampling;

/// Maps the configured knobs onto the sampler. Temperature at or below
/// zero degenerates to greedy decoding.
pub fn sampling(config: &SamplingConfig) -> Sampling {
    if config.temperature <= 0.0 {
        return Sampling::ArgMax;
    }
    let temperature = config.temperature;
    match (config.top_k, config.top_p) {
        (Some(k), Some(p)) => Sampling::TopKThenTopP { k, p, temperature },
        (Some(k), None) => Sampling::TopK { k, temperature },
        (None, Some(p)) => Sampling::TopP { p, temperature },
        (None, None) => Sampling::All { temperature },
    }
}

pub fn seed(config: &SamplingConfig) -> u64 {
    config.seed.unwrap_or_else(|| {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    })
}

/// Masks every token that would complete an n-gram already present in
/// `tokens`, so no n-gram is ever produced twice.
pub fn ban_repeated_ngrams(logits: &mut [f32], tokens: &[u32], n: usize) {
    if n == 0 || tokens.len() < n {
        return;
    }
    let tail = &tokens[tokens.len() - (n - 1)..];
    for window in tokens.windows(n) {
        let (prefix, next) = window.split_at(n - 1);
        if prefix == tail {
            if let Some(score) = logits.get_mut(next[0] as usize) {
                *score = f32::NEG_INFINITY;
            }
        }
    }
}
