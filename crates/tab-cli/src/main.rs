use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use tab_conv::reference::{compare, compare_interior, direct_conv2d, pad};
use tab_conv::{convolve, ConvParams, FilterBank};
use tab_core::{ConvType, Encoding, FloatTensor, PackedTensor, Padding, TensorShape, WORD_BITS};
use tab_kernels::CpuFeatures;
use tab_pack::masks::tail_mask;

mod cases;

use cases::{LayerCase, BENCH_CASES, VERIFY_CASES};

/// Quantization threshold for activations and ternary filters.
const THRESHOLD: f32 = 0.5;

#[derive(Parser)]
#[command(
    name = "tab",
    about = "Ternary and binary convolution: verification and benchmarks",
    version
)]
struct Cli {
    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Show word width and popcount capabilities
    Info,
    /// Check every conv type against a direct convolution
    Verify {
        /// Samples per batch
        #[arg(long, default_value = "2")]
        batch: usize,
        /// Seed for the random symbol tensors
        #[arg(long, default_value = "42")]
        seed: u64,
        /// JSON file of layer cases (defaults to the built-in table)
        #[arg(long)]
        cases: Option<PathBuf>,
        /// Conv types to run (comma-separated)
        #[arg(long, value_delimiter = ',', default_value = "tnn,tbn,btn,bnn")]
        types: Vec<ConvType>,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Time convolve per layer and conv type
    Bench {
        /// Samples per batch
        #[arg(long, default_value = "1")]
        batch: usize,
        /// Timed runs per layer and conv type
        #[arg(long, default_value = "10")]
        runs: usize,
        /// PReLU slope
        #[arg(long, default_value = "0.1")]
        alpha: f32,
        /// Seed for the random inputs and filters
        #[arg(long, default_value = "42")]
        seed: u64,
        /// JSON file of layer cases (defaults to the built-in table)
        #[arg(long)]
        cases: Option<PathBuf>,
        /// Conv types to run (comma-separated)
        #[arg(long, value_delimiter = ',', default_value = "tnn,tbn,btn,bnn")]
        types: Vec<ConvType>,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Info => {
            cmd_info();
            Ok(())
        }
        Commands::Verify { batch, seed, cases, types, json } => {
            let cases = cases::select(cases.as_deref(), &VERIFY_CASES)?;
            cmd_verify(&cases, batch, seed, &types, json)
        }
        Commands::Bench { batch, runs, alpha, seed, cases, types, json } => {
            let cases = cases::select(cases.as_deref(), &BENCH_CASES)?;
            cmd_bench(&cases, batch, runs.max(1), alpha, seed, &types, json)
        }
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_info() {
    println!("tab v{}", env!("CARGO_PKG_VERSION"));

    println!("\nPlatform");
    println!("  OS:   {}", std::env::consts::OS);
    println!("  Arch: {}", std::env::consts::ARCH);

    let cpu = CpuFeatures::detect();
    println!("\nPopcount (tier: {})", cpu.popcount_tier());
    println!("  POPCNT:    {}", if cpu.popcnt { "[x]" } else { "[ ]" });
    println!("  VPOPCNTDQ: {}", if cpu.avx512_vpopcntdq { "[x]" } else { "[ ]" });
    println!("  NEON:      {}", if cpu.neon { "[x]" } else { "[ ]" });

    println!("\nPacking");
    println!("  word width: {WORD_BITS} channels");
    println!("  ternary:    2 planes (sign, nonzero)");
    println!("  binary:     1 plane  (set = -1)");

    println!("\nConv types");
    for t in ConvType::ALL {
        println!(
            "  {t}  activations {:<8} weights {:<8}{}",
            t.activation_encoding().to_string(),
            t.weight_encoding().to_string(),
            if t.pads_with_ones() { " (padding reads as +1)" } else { "" }
        );
    }
}

/// Values drawn from {-1, 0, +1} or {-1, +1}.
fn symbols(rng: &mut StdRng, shape: TensorShape, encoding: Encoding) -> Result<FloatTensor> {
    let data = (0..shape.numel())
        .map(|_| match encoding {
            Encoding::Ternary => rng.gen_range(-1i32..=1) as f32,
            Encoding::Binary => {
                if rng.gen_bool(0.5) {
                    1.0
                } else {
                    -1.0
                }
            }
        })
        .collect();
    Ok(FloatTensor::from_vec(data, shape)?)
}

#[derive(Serialize)]
struct VerifyReport {
    case: usize,
    layer: LayerCase,
    conv_type: ConvType,
    batch: usize,
    output: [usize; 4],
    interior_only: bool,
    passed: bool,
}

fn cmd_verify(
    cases: &[LayerCase],
    batch: usize,
    seed: u64,
    types: &[ConvType],
    json: bool,
) -> Result<()> {
    tracing::info!(cases = cases.len(), batch, seed, "verifying");
    let mut reports = Vec::new();

    for (i, layer) in cases.iter().enumerate() {
        let mut rng = StdRng::seed_from_u64(seed.wrapping_add(i as u64));
        let tx = symbols(&mut rng, layer.input_shape(batch), Encoding::Ternary)?;
        let bx = symbols(&mut rng, layer.input_shape(batch), Encoding::Binary)?;
        let tw = symbols(&mut rng, layer.weight_shape(), Encoding::Ternary)?;
        let bw = symbols(&mut rng, layer.weight_shape(), Encoding::Binary)?;

        let ternary = FilterBank::ternary(&tw, &vec![THRESHOLD; layer.filters])?;
        let binary = FilterBank::binary(&bw, None)?;
        let params = layer.params();
        let thresholds = vec![THRESHOLD; batch];

        for &conv_type in types {
            let encodings = (conv_type.activation_encoding(), conv_type.weight_encoding());
            let (x, w, bank) = match encodings {
                (Encoding::Ternary, Encoding::Ternary) => (&tx, &tw, &ternary),
                (Encoding::Ternary, Encoding::Binary) => (&tx, &bw, &binary),
                (Encoding::Binary, Encoding::Ternary) => (&bx, &tw, &ternary),
                (Encoding::Binary, Encoding::Binary) => (&bx, &bw, &binary),
            };

            let y = convolve(x, &thresholds, bank.weights(conv_type)?, &params)
                .with_context(|| format!("case {i} ({layer}) {conv_type}"))?;
            let expected = direct_conv2d(&pad(x, params.padding), w, params.stride)?;

            let interior_only = conv_type.pads_with_ones() && !params.padding.is_none();
            let passed = if interior_only {
                compare_interior(&y, &expected, params.padding)
            } else {
                compare(&y, &expected)
            };

            if !json {
                println!(
                    "case {i} kernel {}x{} {conv_type}: {}",
                    layer.kernel_h,
                    layer.kernel_w,
                    if passed { "passed" } else { "FAILED" }
                );
            }
            reports.push(VerifyReport {
                case: i,
                layer: *layer,
                conv_type,
                batch,
                output: y.shape().dims(),
                interior_only,
                passed,
            });
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }

    let failed = reports.iter().filter(|r| !r.passed).count();
    if failed > 0 {
        anyhow::bail!("{failed} of {} checks failed", reports.len());
    }
    tracing::info!(checks = reports.len(), "all checks passed");
    Ok(())
}

/// Filters packed straight from random words, skipping float weights that
/// would not fit in memory for the fully connected layers.
fn random_bank(rng: &mut StdRng, layer: &LayerCase, encoding: Encoding) -> Result<FilterBank> {
    let mut packed = PackedTensor::zeros(layer.weight_shape(), Padding::NONE, encoding);
    let c_packed = packed.shape().c;
    let rem = layer.channels % WORD_BITS;
    let last = if rem == 0 { u64::MAX } else { tail_mask(rem) };

    for (i, group) in packed.words_mut().chunks_exact_mut(encoding.planes()).enumerate() {
        let mask = if i % c_packed == c_packed - 1 { last } else { u64::MAX };
        match encoding {
            Encoding::Binary => group[0] = rng.gen::<u64>() & mask,
            Encoding::Ternary => {
                let nonzero = rng.gen::<u64>() & mask;
                group[0] = rng.gen::<u64>() & nonzero;
                group[1] = nonzero;
            }
        }
    }
    Ok(FilterBank::from_packed(packed)?)
}

fn uniform(rng: &mut StdRng, shape: TensorShape) -> Result<FloatTensor> {
    let data = (0..shape.numel()).map(|_| rng.gen_range(-1.0f32..1.0)).collect();
    Ok(FloatTensor::from_vec(data, shape)?)
}

fn time_it(iters: usize, mut f: impl FnMut()) -> f64 {
    let start = Instant::now();
    for _ in 0..iters {
        f();
    }
    start.elapsed().as_secs_f64() / iters as f64
}

#[derive(Serialize)]
struct BenchReport {
    case: usize,
    layer: LayerCase,
    conv_type: ConvType,
    batch: usize,
    runs: usize,
    y_size: usize,
    avg_ns: u64,
}

fn cmd_bench(
    cases: &[LayerCase],
    batch: usize,
    runs: usize,
    alpha: f32,
    seed: u64,
    types: &[ConvType],
    json: bool,
) -> Result<()> {
    let cpu = CpuFeatures::detect();
    tracing::info!(
        cases = cases.len(),
        batch,
        runs,
        alpha,
        popcount = cpu.popcount_tier(),
        "benchmarking"
    );
    let mut reports = Vec::new();

    for (i, layer) in cases.iter().enumerate() {
        let mut rng = StdRng::seed_from_u64(seed.wrapping_add(i as u64));
        let x = uniform(&mut rng, layer.input_shape(batch))?;
        let ternary = random_bank(&mut rng, layer, Encoding::Ternary)?;
        let binary = random_bank(&mut rng, layer, Encoding::Binary)?;
        let params: ConvParams = layer.params().with_alpha(alpha);
        let thresholds = vec![THRESHOLD; batch];

        for &conv_type in types {
            let bank = match conv_type.weight_encoding() {
                Encoding::Ternary => &ternary,
                Encoding::Binary => &binary,
            };
            let weights = bank.weights(conv_type)?;

            // Warmup, and surfaces geometry errors before timing
            let y_size = convolve(&x, &thresholds, weights, &params)
                .with_context(|| format!("case {i} ({layer}) {conv_type}"))?
                .shape()
                .numel();
            let secs = time_it(runs, || {
                std::hint::black_box(convolve(&x, &thresholds, weights, &params).ok());
            });
            let avg_ns = (secs * 1e9) as u64;

            if !json {
                println!("case {i} {conv_type} {layer} y_size={y_size} avg {avg_ns} ns");
            }
            reports.push(BenchReport {
                case: i,
                layer: *layer,
                conv_type,
                batch,
                runs,
                y_size,
                avg_ns,
            });
        }
        if !json {
            println!();
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }
    Ok(())
}
