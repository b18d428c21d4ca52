//! Command line entry point for the STRIKE stroke risk calculator
//!
//! Usage:
//!   strike_risk serve --model strike_model.json
//!   strike_risk predict --age 60 --sex Male --sbp 120 --dbp 80
//!   strike_risk inspect

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use strike_risk::{
    data::{FormInputs, AGE, DBP, SBP},
    encode,
    models::{predict, Booster, ModelStore, EXTRAPOLATION_NOTE},
    web::{app, AppState},
    AppConfig,
};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "strike_risk")]
#[command(author, version, about = "STRIKE stroke risk calculator", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Trained model artifact (XGBoost JSON)
    #[arg(short, long, global = true)]
    model: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the risk form over HTTP
    Serve {
        /// Address to listen on
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Predict risk for one patient profile
    Predict {
        /// Age in years
        #[arg(long, default_value_t = AGE.default)]
        age: i32,

        /// Sex (Female, Male)
        #[arg(long, default_value = "Female")]
        sex: String,

        /// Systolic blood pressure (mmHg)
        #[arg(long, default_value_t = SBP.default)]
        sbp: i32,

        /// Diastolic blood pressure (mmHg)
        #[arg(long, default_value_t = DBP.default)]
        dbp: i32,

        /// Diabetes (No, Yes)
        #[arg(long, default_value = "No")]
        diabetes: String,

        /// Smoking status (Never, Former, Current)
        #[arg(long, default_value = "Never")]
        smoking: String,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Describe the loaded model
    Inspect,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let bind = match &cli.command {
        Commands::Serve { bind } => bind.clone(),
        _ => None,
    };
    let config = AppConfig::load(cli.config.as_deref(), cli.model, bind)?;

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            EnvFilter::from_default_env()
                .add_directive(format!("strike_risk={}", config.log_level).parse()?),
        )
        .init();

    match cli.command {
        Commands::Serve { .. } => serve(&config).await,
        Commands::Predict {
            age,
            sex,
            sbp,
            dbp,
            diabetes,
            smoking,
            json,
        } => {
            let inputs = FormInputs {
                age,
                sex,
                sbp,
                dbp,
                diabetes,
                smoking,
            };
            predict_once(&config, &inputs, json)
        }
        Commands::Inspect => inspect(&config),
    }
}

fn load_model(config: &AppConfig) -> Result<Arc<Booster>> {
    let store = ModelStore::new(&config.model_path);
    store
        .get()
        .with_context(|| format!("cannot start without the model at {}", store.path().display()))
}

async fn serve(config: &AppConfig) -> Result<()> {
    let addr: SocketAddr = config
        .bind_addr
        .parse()
        .with_context(|| format!("invalid bind address {:?}", config.bind_addr))?;

    let model = load_model(config)?;
    let summary = model.summary();
    let state = AppState::new(model)?.with_summary(summary);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!("Serving STRIKE risk form on http://{}", addr);
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

fn predict_once(config: &AppConfig, inputs: &FormInputs, json: bool) -> Result<()> {
    let features = encode(inputs)?;
    let model = load_model(config)?;
    let result = predict(model.as_ref(), &features)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("{}", "=== STRIKE Stroke Risk ===".bold());
    println!(
        "Age {} | {} | SBP {} | DBP {} | Diabetes {} | Smoking {}",
        inputs.age, inputs.sex, inputs.sbp, inputs.dbp, inputs.diabetes, inputs.smoking
    );
    println!();
    println!("Predicted 1-year stroke risk:  {}", result.one_year_display().green().bold());
    println!("Estimated 10-year stroke risk: {}", result.ten_year_display().yellow().bold());
    println!();
    println!("{}", EXTRAPOLATION_NOTE.dimmed());

    Ok(())
}

fn inspect(config: &AppConfig) -> Result<()> {
    let model = load_model(config)?;
    let summary = model.summary();

    println!("{}", "=== Model Summary ===".bold());
    println!("Path:       {}", config.model_path.display().to_string().cyan());
    println!("Objective:  {}", summary.objective);
    println!("Trees:      {}", summary.num_trees);
    println!("Base score: {}", summary.base_score);
    if let Some(version) = &summary.version {
        println!("Written by: XGBoost {}", version);
    }
    if summary.feature_names.is_empty() {
        println!("Features:   {} (unnamed)", summary.num_feature);
    } else {
        println!("Features:   {}", summary.feature_names.join(", "));
    }

    Ok(())
}

/// Handle graceful shutdown signals
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
