#![no_main]

use f0_estimator::coin::{BitAndCoin, UniformRangeCoin};
use f0_estimator::{CardinalityEstimator, Coin, Config};
use libfuzzer_sys::fuzz_target;
use rand::rngs::StdRng;
use rand::SeedableRng;
use wyhash::wyhash;

fuzz_target!(|data: &[u8]| {
    let [max_items, top_k, flags, rest @ ..] = data else {
        return;
    };

    let coin = if flags & 2 == 0 {
        Coin::BitAnd(BitAndCoin)
    } else {
        Coin::UniformRange(UniformRangeCoin)
    };
    let k = usize::from(*top_k % 8);
    let config = Config::default()
        .with_max_items(u64::from(*max_items).max(1))
        .with_epsilon(0.5)
        .with_delta(0.5)
        .with_top_k(k)
        .with_cheat(flags & 1 == 1)
        .with_coin(coin);
    let rng = StdRng::seed_from_u64(wyhash(data, 0));
    let mut estimator = CardinalityEstimator::<&[u8]>::with_rng(config, rng).unwrap();

    for chunk in rest.chunks(2) {
        estimator.observe(chunk);
        assert!(estimator.sample_len() <= estimator.capacity());
        assert!(estimator.size_of() > 0);
        if config.cheat {
            assert!(estimator.estimate() as u64 <= estimator.total_seen());
        }
        assert!(estimator.top_k().len() <= k);
    }
    assert_eq!(estimator.is_exact(), estimator.round() == 0);
});
