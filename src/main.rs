// src/main.rs
//
// CLI harness for the dialog simulator and the apprenticeship-learning
// pipeline.
//
// - Deterministic runs via --seed (single ChaCha8 stream per run).
// - `session` rolls out the handcrafted expert and prints action statistics.
// - `learn` runs projection IRL and checkpoints candidates to JSON.
// - `best` / `mixed` evaluate stored candidates against the expert.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use dialogsim::irl::{
    best_candidate, feature_expectation, ApprenticeshipLearner, CandidateStore, FeatureMap,
    MixtureBuilder, TdAlgorithm,
};
use dialogsim::logging::{FileSink, NoopSink, TrainingSink};
use dialogsim::stats::ActionStatistics;
use dialogsim::{Agent, Config, User};

#[derive(Copy, Clone, Debug, ValueEnum)]
enum AlgorithmArg {
    QLearning,
    Sarsa,
}

impl From<AlgorithmArg> for TdAlgorithm {
    fn from(arg: AlgorithmArg) -> Self {
        match arg {
            AlgorithmArg::QLearning => TdAlgorithm::QLearning,
            AlgorithmArg::Sarsa => TdAlgorithm::Sarsa,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum StrategyArg {
    Qp,
    Gibbs,
}

#[derive(Debug, Parser)]
#[command(
    name = "dialogsim",
    about = "Slot-filling dialog simulator with apprenticeship-learned user simulations",
    version
)]
struct Args {
    /// Deterministic seed for all randomness in the run.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Low-iteration preset (quick runs and smoke tests).
    #[arg(long)]
    fast: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Roll out the handcrafted expert and print action statistics.
    Session {
        /// Number of dialog sessions to roll out.
        #[arg(long, default_value_t = 1_000)]
        sessions: usize,

        /// Print every dialog trace.
        #[arg(long)]
        verbose: bool,
    },

    /// Run apprenticeship learning and persist the candidate simulations.
    Learn {
        /// TD update rule for the MDP solves.
        #[arg(long, value_enum, default_value = "q-learning")]
        algorithm: AlgorithmArg,

        /// Candidate checkpoint file.
        #[arg(long, default_value = "candidates.json")]
        out: PathBuf,

        /// Optional JSONL training progress log.
        #[arg(long)]
        log: Option<PathBuf>,
    },

    /// Evaluate the stored candidate closest to the expert.
    Best {
        /// Candidate checkpoint file written by `learn`.
        #[arg(long, default_value = "candidates.json")]
        candidates: PathBuf,

        /// Number of evaluation sessions.
        #[arg(long, default_value_t = 1_000)]
        sessions: usize,
    },

    /// Evaluate a weighted mixture of the stored candidates.
    Mixed {
        /// Candidate checkpoint file written by `learn`.
        #[arg(long, default_value = "candidates.json")]
        candidates: PathBuf,

        /// Mixture weighting strategy.
        #[arg(long, value_enum, default_value = "qp")]
        strategy: StrategyArg,

        /// Number of evaluation sessions.
        #[arg(long, default_value_t = 1_000)]
        sessions: usize,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let cfg = if args.fast {
        Config::fast()
    } else {
        Config::default()
    };
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);

    println!(
        "dialogsim | slots={} | seed={} | preset={}",
        cfg.dialog.num_slots,
        args.seed,
        if args.fast { "fast" } else { "default" }
    );

    match args.command {
        Command::Session { sessions, verbose } => {
            let mut user = User::handcrafted(&cfg.dialog, &cfg.policy);
            let mut agent = Agent::new(&cfg.dialog);

            if verbose {
                for _ in 0..sessions {
                    let trace = dialogsim::run_session(&mut user, &mut agent, &mut rng)?;
                    let turns: Vec<String> = trace
                        .iter()
                        .map(|(s, a)| format!("{}/{}", s.as_str(), a.as_str()))
                        .collect();
                    println!("{}", turns.join(" "));
                }
            } else {
                let stats =
                    ActionStatistics::collect_user(&mut user, &mut agent, sessions, &mut rng)?;
                print!("{}", stats);
            }
        }

        Command::Learn {
            algorithm,
            out,
            log,
        } => {
            let features = FeatureMap::new();
            let mut expert = User::handcrafted(&cfg.dialog, &cfg.policy);
            let mut agent = Agent::new(&cfg.dialog);
            let store = CandidateStore::new(&out);

            let mut sink: Box<dyn TrainingSink> = match &log {
                Some(path) => Box::new(
                    FileSink::create(path)
                        .with_context(|| format!("opening training log {}", path.display()))?,
                ),
                None => Box::new(NoopSink),
            };

            let learner = ApprenticeshipLearner::new(&cfg, &features, algorithm.into());
            let outcome = learner.run(
                &mut expert,
                &mut agent,
                Some(&store),
                sink.as_mut(),
                &mut rng,
            )?;

            println!(
                "learned {} candidates -> {}",
                outcome.candidates.len(),
                out.display()
            );
            for (ix, margin) in outcome.margins.iter().enumerate() {
                println!("iteration {:>3}: margin {:.6}", ix + 1, margin);
            }
        }

        Command::Best {
            candidates,
            sessions,
        } => {
            let store = CandidateStore::new(&candidates);
            let list = store
                .load()
                .with_context(|| format!("loading candidates from {}", candidates.display()))?;
            let best = best_candidate(&list)?;

            let mut agent = Agent::new(&cfg.dialog);
            let mut expert = User::handcrafted(&cfg.dialog, &cfg.policy);
            let expert_stats =
                ActionStatistics::collect_user(&mut expert, &mut agent, sessions, &mut rng)?;

            let mut user = User::with_policy(best.policy.clone(), &cfg.dialog);
            let stats = ActionStatistics::collect_user(&mut user, &mut agent, sessions, &mut rng)?;

            println!(
                "best of {} candidates | distance {:.6}",
                list.len(),
                best.distance_to_expert
            );
            println!("--- expert ---");
            print!("{}", expert_stats);
            println!("--- best candidate ---");
            print!("{}", stats);
        }

        Command::Mixed {
            candidates,
            strategy,
            sessions,
        } => {
            let store = CandidateStore::new(&candidates);
            let list = store
                .load()
                .with_context(|| format!("loading candidates from {}", candidates.display()))?;

            let features = FeatureMap::new();
            let mut agent = Agent::new(&cfg.dialog);
            let builder = MixtureBuilder::new(&cfg, &features);

            let mut mixture = match strategy {
                StrategyArg::Gibbs => builder.gibbs(&list)?,
                StrategyArg::Qp => {
                    let mut expert = User::handcrafted(&cfg.dialog, &cfg.policy);
                    let mu_expert = feature_expectation(
                        &mut expert,
                        &mut agent,
                        &features,
                        cfg.solver.gamma,
                        cfg.irl.num_sessions,
                        &mut rng,
                    )?;
                    builder.qp(&list, &mu_expert, &mut agent, &mut rng)?
                }
            };

            let weights: Vec<String> =
                mixture.weights().iter().map(|w| format!("{:.4}", w)).collect();
            println!(
                "{:?} mixture over {} candidates | weights [{}]",
                strategy,
                mixture.len(),
                weights.join(", ")
            );

            let stats =
                ActionStatistics::collect_mixture(&mut mixture, &mut agent, sessions, &mut rng)?;
            print!("{}", stats);
        }
    }

    Ok(())
}
