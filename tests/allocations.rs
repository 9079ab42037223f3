#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use f0_estimator::{CardinalityEstimator, Config};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tabled::{
    settings::{Settings, Style},
    Table, Tabled,
};

/// Capacity used for every estimator in this test
const CAPACITY: u64 = 1024;

#[derive(Tabled)]
struct Record {
    cardinality: usize,
    max_bytes: usize,
    total_blocks: u64,
    estimate: usize,
}

fn measure_memory_usage(cardinality: usize, top_k: usize) -> Record {
    let config = Config::default().with_max_items(CAPACITY).with_top_k(top_k);
    let mut estimator = CardinalityEstimator::with_rng(config, StdRng::seed_from_u64(12345))
        .expect("valid config");

    let _profiler = dhat::Profiler::builder().testing().build();
    for i in 0..cardinality as u64 {
        estimator.observe(i);
    }
    let stats = dhat::HeapStats::get();

    Record {
        cardinality,
        max_bytes: stats.max_bytes,
        total_blocks: stats.total_blocks,
        estimate: estimator.estimate(),
    }
}

#[test]
fn test_allocations() {
    let cardinalities: Vec<usize> = std::iter::once(0)
        .chain((0..).map(|c| 1 << c))
        .take_while(|&c| c <= 1 << 20)
        .collect();

    for top_k in [0, 16] {
        let results: Vec<Record> = cardinalities
            .iter()
            .map(|&cardinality| measure_memory_usage(cardinality, top_k))
            .collect();

        // hash tables hold at most 2 * CAPACITY entries and may grow twice past that,
        // so peak heap stays within a small multiple of CAPACITY whatever the cardinality
        let entry_size = std::mem::size_of::<u64>() * 4;
        let bound = 16 * CAPACITY as usize * entry_size;
        for record in &results {
            assert!(
                record.max_bytes <= bound,
                "cardinality {} used {} bytes, bound is {}",
                record.cardinality,
                record.max_bytes,
                bound
            );
        }

        let table_config = Settings::default().with(Style::markdown());
        let markdown = Table::new(results).with(table_config).to_string();
        println!("top_k = {top_k}\n{markdown}");
    }
}
