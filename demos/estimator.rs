use f0_estimator::{CardinalityEstimator, Config};

fn main() {
    let config = Config::default().with_max_items(1_000).with_top_k(3);
    let mut estimator = CardinalityEstimator::<u64>::new(config).unwrap();
    for i in 0..10 {
        estimator.observe(i);
    }
    println!("estimate = {} exact = {}", estimator.estimate(), estimator.is_exact());

    for i in 0..100_000u64 {
        estimator.observe(i % 5_000);
        estimator.observe(i % 7);
    }
    println!("estimate = {} exact = {}", estimator.estimate(), estimator.is_exact());
    println!("{estimator:?}");

    for (item, weight) in estimator.top_k() {
        println!("{item}: ~{weight}");
    }
}
