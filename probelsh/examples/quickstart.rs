//! Quick start example for probelsh.
//!
//! Builds an index over clustered random vectors, calibrates it against an
//! exact scan and compares the two.

use probelsh::prelude::*;
use probelsh::evaluate_nearest;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn main() -> Result<()> {
    println!("🌟 probelsh Quick Start Example\n");

    let dimension = 32;
    let mut rng = StdRng::seed_from_u64(2024);

    // 20 clusters of 250 points each
    let centers: Vec<Vec<f32>> = (0..20)
        .map(|_| (0..dimension).map(|_| rng.gen_range(-20.0..20.0)).collect())
        .collect();
    let keys: Vec<Vec<f32>> = (0..5000)
        .map(|i| {
            centers[i % centers.len()]
                .iter()
                .map(|&c| c + rng.gen_range(-1.0..1.0))
                .collect()
        })
        .collect();

    let config = LshConfig::new(dimension, 10, 8, 4.0).with_seed(7);
    let mut index = MultiProbeLsh::new(config, DistanceMetric::Euclidean)?;
    let oracle = LinearSearch::of(keys.clone(), DistanceMetric::Euclidean)?;

    println!("📥 Inserting {} vectors...", keys.len());
    for (i, key) in keys.iter().enumerate() {
        index.insert(key.clone(), i)?;
    }

    // Calibrate on the first 500 keys
    let fit = FitConfig::new(3.0).with_target_recall(0.95);
    let calibration = index.fit(&oracle, &keys[..500], &fit)?;
    println!(
        "🎯 Calibrated: {} probes/table, {} max candidates, recall {:.3}\n",
        calibration.probes(),
        calibration.max_candidates(),
        calibration.recall()
    );

    // Perturbed queries so the answer isn't the query itself
    let queries: Vec<Vec<f32>> = keys
        .iter()
        .step_by(50)
        .map(|k| k.iter().map(|&x| x + rng.gen_range(-0.3..0.3)).collect())
        .collect();

    let report = evaluate_nearest(&index, &oracle, &queries)?;
    println!("📊 Nearest neighbor over {} queries:", report.queries);
    println!("{:-<60}", "");
    println!("  recall:     {:.3}", report.recall());
    println!("  null rate:  {:.3}", report.null_rate());
    println!("  miss error: {:.4}", report.miss_error);
    println!("{:-<60}\n", "");

    let results = index.knn(&queries[0], 5, 0.95, 200)?;
    println!("🔍 Top 5 for the first query:");
    for (rank, neighbor) in results.iter().enumerate() {
        println!(
            "  {}. [#{}] distance {:.4}",
            rank + 1,
            neighbor.index,
            neighbor.distance
        );
    }

    println!("\n✨ Done!");
    Ok(())
}
