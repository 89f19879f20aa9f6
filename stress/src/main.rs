use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

use clap::{Parser, ValueEnum};
use hdrhistogram::Histogram;
use tracing_subscriber::EnvFilter;

use sms_guard::{
    AccountId, AccountSeed, AdmissionDecision, CooldownMs, DenialReason, PhoneNumber,
    RetentionMs, SmsGuard, SmsGuardOptions, SweepIntervalMs, WindowSizeMs,
};

#[derive(Clone, Copy, Debug, PartialEq, ValueEnum)]
enum KeyDist {
    /// Every request names the same number of the same account.
    Hot,
    /// Uniform over every (account, number) pair.
    Uniform,
    /// `--hot-fraction` of requests go to the first pair, the rest uniform.
    Skewed,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "sms-guard-stress",
    about = "Load test / benchmark harness for sms-guard"
)]
struct Args {
    #[arg(long, value_enum, default_value_t = KeyDist::Uniform)]
    key_dist: KeyDist,

    #[arg(long, default_value_t = 8)]
    threads: usize,

    #[arg(long, default_value_t = 10)]
    duration_s: u64,

    #[arg(long, default_value_t = 1_000)]
    accounts: usize,

    #[arg(long, default_value_t = 20)]
    numbers_per_account: usize,

    #[arg(long, default_value_t = 0.8)]
    hot_fraction: f64,

    #[arg(long, default_value = "1000", value_parser = parse_ms::<WindowSizeMs>)]
    window_ms: WindowSizeMs,

    #[arg(long, default_value_t = 1_000)]
    cooldown_ms: u64,

    #[arg(long, default_value_t = 1_000_000)]
    personal_limit: u64,

    /// Account limit installed for every seeded account.
    #[arg(long, default_value_t = 50)]
    account_limit: u64,

    /// Run the reclamation loop with this interval during the test.
    #[arg(long, value_parser = parse_ms::<SweepIntervalMs>)]
    sweep_interval_ms: Option<SweepIntervalMs>,

    #[arg(long, default_value = "5000", value_parser = parse_ms::<RetentionMs>)]
    retention_ms: RetentionMs,

    #[arg(long, default_value_t = 100)]
    sample_every: u64,
}

#[derive(Default)]
struct Counts {
    granted: AtomicU64,
    personal_limit: AtomicU64,
    account_limit: AtomicU64,
    cooldown: AtomicU64,
    inactive: AtomicU64,
}

impl Counts {
    fn add(&self, decision: AdmissionDecision) {
        let counter = match decision {
            AdmissionDecision::Granted => &self.granted,
            AdmissionDecision::Denied(DenialReason::PersonalLimitExceeded) => &self.personal_limit,
            AdmissionDecision::Denied(DenialReason::AccountLimitExceeded) => &self.account_limit,
            AdmissionDecision::Denied(DenialReason::CooldownNotElapsed) => &self.cooldown,
            AdmissionDecision::Denied(DenialReason::NumberInactive) => &self.inactive,
        };

        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Parse a millisecond option into one of the validated newtypes.
fn parse_ms<T>(raw: &str) -> Result<T, String>
where
    T: TryFrom<u64, Error = &'static str>,
{
    let ms: u64 = raw.parse().map_err(|e| format!("{e}"))?;
    T::try_from(ms).map_err(str::to_string)
}

fn build_options(args: &Args) -> SmsGuardOptions {
    SmsGuardOptions {
        window_size_ms: args.window_ms,
        cooldown_ms: CooldownMs::from(args.cooldown_ms),
        sweep_interval_ms: args.sweep_interval_ms.unwrap_or_default(),
        retention_ms: args.retention_ms,
    }
}

fn build_keys(args: &Args) -> Vec<(AccountId, PhoneNumber)> {
    let (accounts, numbers) = match args.key_dist {
        KeyDist::Hot => (1, 1),
        _ => (args.accounts.max(1), args.numbers_per_account.max(1)),
    };

    let mut keys = Vec::with_capacity(accounts * numbers);
    for _ in 0..accounts {
        let account_id = AccountId::new_v4();
        for _ in 0..numbers {
            let phone = PhoneNumber::try_from(format!("+1555{:07}", keys.len())).unwrap();
            keys.push((account_id, phone));
        }
    }
    keys
}

fn seeds(args: &Args, keys: &[(AccountId, PhoneNumber)]) -> Vec<AccountSeed> {
    let mut seeds: Vec<AccountSeed> = Vec::new();
    for (account_id, _) in keys {
        if seeds.last().is_none_or(|s| s.account_id != *account_id) {
            seeds.push(AccountSeed::new(*account_id, args.account_limit));
        }
    }
    seeds
}

fn should_sample(iter: u64, sample_every: u64) -> bool {
    if sample_every <= 1 {
        return true;
    }

    iter.is_multiple_of(sample_every)
}

fn pick_key<'a>(
    args: &Args,
    keys: &'a [(AccountId, PhoneNumber)],
    thread_rng: &mut impl FnMut() -> u64,
) -> &'a (AccountId, PhoneNumber) {
    match args.key_dist {
        KeyDist::Hot => &keys[0],
        KeyDist::Uniform => {
            let idx = (thread_rng() as usize) % keys.len();
            &keys[idx]
        }
        KeyDist::Skewed => {
            let r = (thread_rng() % 10_000) as f64 / 10_000.0;
            if r < args.hot_fraction {
                &keys[0]
            } else {
                let idx = 1 + ((thread_rng() as usize) % (keys.len().saturating_sub(1).max(1)));
                &keys[idx % keys.len()]
            }
        }
    }
}

fn print_results(
    args: &Args,
    elapsed: Duration,
    ops: u64,
    hist: &Histogram<u64>,
    counts: &Counts,
    guard: &SmsGuard,
) {
    println!(
        "threads={} duration_s={} key_dist={:?} accounts={} numbers_per_account={}",
        args.threads, args.duration_s, args.key_dist, args.accounts, args.numbers_per_account
    );
    println!(
        "elapsed_s={:.3} ops={} ops_per_s={:.0}",
        elapsed.as_secs_f64(),
        ops,
        ops as f64 / elapsed.as_secs_f64()
    );
    println!(
        "granted={} personal_limit={} account_limit={} cooldown={} inactive={}",
        counts.granted.load(Ordering::Relaxed),
        counts.personal_limit.load(Ordering::Relaxed),
        counts.account_limit.load(Ordering::Relaxed),
        counts.cooldown.load(Ordering::Relaxed),
        counts.inactive.load(Ordering::Relaxed),
    );

    let (number_counters, account_counters) = guard.store().tracked_counters();
    println!("number_counters={number_counters} account_counters={account_counters}");

    if !hist.is_empty() {
        println!(
            "lat_us p50={} p95={} p99={} p999={} max={}",
            hist.value_at_quantile(0.50),
            hist.value_at_quantile(0.95),
            hist.value_at_quantile(0.99),
            hist.value_at_quantile(0.999),
            hist.max()
        );
        println!("sample_every={} samples={}", args.sample_every, hist.len());
    } else {
        println!("no latency samples collected");
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let keys = Arc::new(build_keys(&args));

    let guard = Arc::new(SmsGuard::new(build_options(&args)));
    guard.replace_all(seeds(&args, &keys)).unwrap();

    if args.sweep_interval_ms.is_some() {
        guard.run_cleanup_loop();
    }

    let stop = Arc::new(AtomicBool::new(false));
    let counts = Arc::new(Counts::default());
    let total_ops = Arc::new(AtomicU64::new(0));
    let started = Instant::now();

    let mut handles = Vec::with_capacity(args.threads);
    for t in 0..args.threads {
        let guard = Arc::clone(&guard);
        let keys = Arc::clone(&keys);
        let stop = Arc::clone(&stop);
        let counts = Arc::clone(&counts);
        let total_ops = Arc::clone(&total_ops);
        let args = args.clone();

        handles.push(std::thread::spawn(move || {
            let mut hist = Histogram::<u64>::new_with_bounds(1, 60_000_000, 3).unwrap();
            let mut i = 0_u64;
            let mut seed = (t as u64 + 1) * 0x9E37_79B9_7F4A_7C15;

            let mut rng_u64 = || {
                // xorshift64*
                seed ^= seed >> 12;
                seed ^= seed << 25;
                seed ^= seed >> 27;
                seed = seed.wrapping_mul(0x2545_F491_4F6C_DD1D);
                seed
            };

            while !stop.load(Ordering::Relaxed) {
                i = i.wrapping_add(1);
                let (account_id, phone) = pick_key(&args, &keys, &mut rng_u64);
                let sample = should_sample(i, args.sample_every);
                let t0 = if sample { Some(Instant::now()) } else { None };

                let decision = guard.check_admission(*account_id, phone, args.personal_limit);

                if let Some(t0) = t0 {
                    let us = t0.elapsed().as_micros() as u64;
                    let _ = hist.record(us.max(1));
                }

                total_ops.fetch_add(1, Ordering::Relaxed);
                counts.add(decision);
            }

            hist
        }));
    }

    std::thread::sleep(Duration::from_secs(args.duration_s));
    stop.store(true, Ordering::Relaxed);

    let mut merged = Histogram::<u64>::new_with_bounds(1, 60_000_000, 3).unwrap();
    for h in handles {
        let hist = h.join().unwrap();
        merged.add(&hist).unwrap();
    }

    guard.stop_cleanup_loop();

    let elapsed = started.elapsed();
    let ops = total_ops.load(Ordering::Relaxed);
    print_results(&args, elapsed, ops, &merged, &counts, &guard);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_millisecond_options_are_usage_errors() {
        assert_eq!(
            parse_ms::<SweepIntervalMs>("0").unwrap_err(),
            "Sweep interval must be greater than 0"
        );
        assert!(parse_ms::<RetentionMs>("soon").is_err());

        for flag in ["--window-ms", "--sweep-interval-ms", "--retention-ms"] {
            assert!(Args::try_parse_from(["sms-guard-stress", flag, "0"]).is_err());
        }

        let args = Args::try_parse_from(["sms-guard-stress"]).unwrap();
        assert_eq!(*args.window_ms, 1_000);
        assert_eq!(*args.retention_ms, 5_000);
        assert!(args.sweep_interval_ms.is_none());
    }
}
