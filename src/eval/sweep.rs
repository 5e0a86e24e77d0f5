use std::error::Error;

use sim_lib::config::SimConfig;
use sim_lib::memory::stats::AccessStats;
use sim_lib::memory::LEVEL_COUNT;
use sim_lib::run_wrapper::{fetch_addresses, make_rng, sweep_l1, RandomAddresses};

const SEED: u64 = 0x5eed;
const OUTPUT_CSV: &str = "eval/sweep_eval.csv";
const OUTPUT_SVG: &str = "eval/sweep_eval.svg";

fn main() -> Result<(), Box<dyn Error>> {
    let param_tokens: Vec<String> = std::env::args().collect();
    let trace_path = param_tokens.get(1);

    // For fixed L2/L3 sizes, vary the L1 size
    // Performance metric: hit rate of each level
    let l1_capacities: Vec<usize> = vec![1, 2, 4, 8, 16, 32];
    let base = SimConfig {
        num_accesses: 10_000,
        seed: Some(SEED),
        ..Default::default()
    };

    // The same address stream goes through every configuration
    let addresses: Vec<usize> = match trace_path {
        Some(trace_path) => fetch_addresses(std::path::Path::new(trace_path))?,
        None => RandomAddresses::new(make_rng(base.seed), base.max_address())
            .take(base.num_accesses)
            .collect(),
    };
    let trace_base_name = match trace_path {
        Some(trace_path) => {
            String::from(trace_path.split('/').last().unwrap_or("trace"))
        }
        None => String::from("random"),
    };

    let results = sweep_l1(&base, &addresses, &l1_capacities)?;

    std::fs::create_dir_all("eval")?;
    let mut writer = csv::Writer::from_path(OUTPUT_CSV)?;
    writer.write_record(["L1 lines", "L1 hit rate", "L2 hit rate", "L3 hit rate"])?;
    for (l1_capacity, stats) in l1_capacities.iter().zip(results.iter()) {
        let mut record = vec![l1_capacity.to_string()];
        for history in stats.levels.iter() {
            record.push(format!("{:.3}", history.get_hit_rate()));
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;

    plot(&trace_base_name, &l1_capacities, &results)
}

/// Plot one hit-rate line per cache level against the L1 size
fn plot(
    trace_base_name: &str,
    l1_capacities: &[usize],
    results: &[AccessStats],
) -> Result<(), Box<dyn Error>> {
    use plotters::prelude::*;

    let mut data: Vec<Vec<(i32, f64)>> = vec![vec![]; LEVEL_COUNT];
    for (l1_capacity, stats) in l1_capacities.iter().zip(results.iter()) {
        for (k, history) in stats.levels.iter().enumerate() {
            data[k].push((*l1_capacity as i32, history.get_hit_rate()));
        }
    }

    let plot_title = format!("L1 size sweep (hit rate): {}", trace_base_name);
    let root = SVGBackend::new(OUTPUT_SVG, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut ctx = ChartBuilder::on(&root)
        .caption(plot_title.as_str(), ("sans-serif", 40).into_font())
        .margin(5)
        .x_label_area_size(40)
        .y_label_area_size(40)
        .build_cartesian_2d(0..33, 0.0..1.0)?;
    ctx.configure_mesh().x_desc("L1 lines").y_desc("Hit rate").draw()?;

    for (k, series) in data.iter().enumerate() {
        let label = format!("L{}", k + 1);
        let color = Palette99::pick(k).to_rgba();
        ctx.draw_series(LineSeries::new(series.iter().copied(), color))?
            .label(label)
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color)
            });
    }

    ctx.configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    root.present()?;

    Ok(())
}
