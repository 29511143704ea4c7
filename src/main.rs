//! Glycoscreen: Diabetes risk screening pipeline.
//!
//! Main entry point for the assessment CLI.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use glycoscreen::adapters::artifact::load_artifact;
use glycoscreen::adapters::gemini::GeminiClient;
use glycoscreen::adapters::report::TextReportRenderer;
use glycoscreen::adapters::sanitize::SanitizingMakeWriter;
use glycoscreen::adapters::sqlite::SqliteRecordStore;
use glycoscreen::application::{
    render_report, Assessment, AssessmentService, Audience, RiskScorer,
};
use glycoscreen::config::Config;
use glycoscreen::domain::{PatientIdentity, PatientRecord};
use glycoscreen::ports::{DisabledGenerator, RecordPage, ReportRenderer, TextGenerator};
use glycoscreen::PatientAttributes;

/// Number of model weights shown to clinicians.
const TOP_FACTORS: usize = 5;

#[derive(Parser, Debug)]
#[command(
    name = "glycoscreen",
    about = "Score diabetes risk from clinical attributes and explain the result",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Assess one patient from a JSON attribute file
    Assess(AssessArgs),
    /// Show all assessments of a patient, oldest first
    History {
        /// Patient id (PID-YYYYMMDD-NNNN)
        patient_id: String,
    },
    /// List patient ids in order of first assessment
    Patients,
    /// Show the most recent assessments across all patients
    Recent {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Page through every stored assessment, newest first
    List {
        #[arg(long, default_value_t = 0)]
        offset: usize,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

#[derive(Args, Debug)]
struct AssessArgs {
    /// Patient attributes as JSON (training-set field names)
    #[arg(long)]
    input: PathBuf,
    /// `clinician` or `patient`; anything else reads as patient
    #[arg(long, default_value = "patient")]
    audience: String,
    /// Existing patient id; a new one is issued when omitted
    #[arg(long)]
    patient_id: Option<String>,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    mobile: Option<String>,
    /// Write a text report to this path (a directory gets `<patient-id>_report.txt`)
    #[arg(long)]
    report: Option<PathBuf>,
    /// Print the full assessment as JSON instead of the summary
    #[arg(long)]
    json: bool,
}

/// Install the tracing subscriber. Logs go to stderr unless a file is requested,
/// keeping stdout for command output.
fn init_logging() -> Result<WorkerGuard> {
    let log_mode = std::env::var("GLYCOSCREEN_LOG_MODE").unwrap_or_else(|_| "auto".to_string());

    let (writer, guard) = match log_mode.as_str() {
        "file" => {
            let log_file = std::env::var("GLYCOSCREEN_LOG_FILE")
                .unwrap_or_else(|_| "data/glycoscreen.log".to_string());

            if let Some(parent) = Path::new(&log_file).parent() {
                // Best-effort: a missing directory surfaces as the open error below.
                let _ = std::fs::create_dir_all(parent);
            }

            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_file)
                .with_context(|| format!("Cannot open log file {log_file}"))?;
            tracing_appender::non_blocking(file)
        }
        "stdout" => tracing_appender::non_blocking(std::io::stdout()),
        // auto / stderr
        _ => tracing_appender::non_blocking(std::io::stderr()),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(std::io::stderr().is_terminal() && log_mode != "file")
                .with_writer(SanitizingMakeWriter::new(writer)),
        )
        .init();

    Ok(guard)
}

fn build_generator(config: &Config) -> Box<dyn TextGenerator> {
    match &config.gemini {
        Some(settings) => match GeminiClient::new(settings) {
            Ok(client) => {
                tracing::info!(
                    "Remote explanations enabled (model={}, timeout={}s)",
                    settings.model,
                    settings.timeout_secs
                );
                Box::new(client)
            }
            Err(e) => {
                tracing::warn!("Gemini client unavailable, using fallback explanations: {e}");
                Box::new(DisabledGenerator)
            }
        },
        None => {
            tracing::info!("GEMINI_API_KEY not set; explanations use the rule-based fallback");
            Box::new(DisabledGenerator)
        }
    }
}

fn build_service(
    config: &Config,
) -> Result<AssessmentService<Box<dyn TextGenerator>, SqliteRecordStore>> {
    let artifact = load_artifact(&config.model_dir, config.require_manifest)
        .with_context(|| format!("Cannot load model from {:?}", config.model_dir))?;
    let store = SqliteRecordStore::new(&config.db_path)
        .with_context(|| format!("Cannot open record store {:?}", config.db_path))?;

    Ok(AssessmentService::new(
        RiskScorer::new(Arc::new(artifact)),
        build_generator(config),
        Arc::new(store),
    ))
}

fn read_attributes(path: &Path) -> Result<PatientAttributes> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Cannot read {path:?}"))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid patient JSON in {path:?}"))
}

fn print_summary(
    service: &AssessmentService<Box<dyn TextGenerator>, SqliteRecordStore>,
    assessment: &Assessment,
) {
    let record = &assessment.record;
    let risk = &assessment.risk;

    println!("Patient ID: {}", record.identity.patient_id);
    println!(
        "Risk: {} ({:.2}%) - {}",
        risk.category.label(),
        risk.percent(),
        risk.category.message()
    );
    println!(
        "Severity: {} (level {}, urgency {}) - {}",
        assessment.severity.label,
        assessment.severity.level,
        assessment.severity.urgency,
        assessment.severity.recommended_action
    );

    println!("\nRisk contributions:");
    for (factor, weight) in assessment.contributions.ranked() {
        println!("  {:<14} {weight:>3}", factor.name());
    }

    println!("\nWhat can help:");
    for tip in &assessment.counterfactuals {
        println!("  - {tip}");
    }

    println!(
        "\nExplanation ({}, {:?}):",
        assessment.explanation.audience, assessment.explanation.source
    );
    println!("{}", assessment.explanation.text);

    if assessment.explanation.audience == Audience::Clinician {
        println!("\nNext steps:");
        for step in assessment.next_steps {
            println!("  - {step}");
        }

        let factors = service.scorer().artifact().top_factors(TOP_FACTORS);
        if !factors.is_empty() {
            println!("\nTop model weights:");
            for (name, weight) in factors {
                println!("  {name:<32} {weight:+.3}");
            }
        }
    }

    if !assessment.persisted {
        println!("\nWarning: this assessment could not be saved to the record store.");
    }
}

fn print_records(records: &[PatientRecord]) {
    for record in records {
        println!(
            "{}  {}  {:<8} {:>6.1}%  HbA1c {:>4}  glucose {:>5}  BMI {:>5}",
            record.created_at.format("%d-%m-%Y %H:%M"),
            record.identity.patient_id,
            record.risk.category.as_str(),
            record.risk.percent(),
            record.attributes.hba1c_level,
            record.attributes.blood_glucose_level,
            record.attributes.bmi
        );
    }
}

fn print_page(page: &RecordPage) {
    let Some((first, last)) = page.span() else {
        println!("No assessments at offset {} ({} stored)", page.offset, page.total);
        return;
    };
    print_records(&page.records);
    println!("\nShowing {first}-{last} of {}", page.total);
    if let Some(prev) = page.prev_offset() {
        println!("  previous: --offset {prev}");
    }
    if let Some(next) = page.next_offset() {
        println!("  next:     --offset {next}");
    }
}

fn write_report(path: &Path, assessment: &Assessment) -> Result<PathBuf> {
    let renderer = TextReportRenderer::new();
    let target = if path.is_dir() {
        path.join(renderer.file_name(&assessment.record.identity.patient_id))
    } else {
        path.to_path_buf()
    };
    let bytes = render_report(&renderer, assessment)?;
    std::fs::write(&target, bytes).with_context(|| format!("Cannot write report {target:?}"))?;
    Ok(target)
}

fn run_assess(
    service: &AssessmentService<Box<dyn TextGenerator>, SqliteRecordStore>,
    args: AssessArgs,
) -> Result<()> {
    let attrs = read_attributes(&args.input)?;
    let identity = PatientIdentity {
        patient_id: match args.patient_id {
            Some(id) => id,
            None => PatientIdentity::new_patient().patient_id,
        },
        name: args.name,
        mobile: args.mobile,
    };

    let assessment = service.assess(identity, attrs, Audience::parse(&args.audience))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&assessment)?);
    } else {
        print_summary(service, &assessment);
    }

    if let Some(path) = args.report.as_deref() {
        let written = write_report(path, &assessment)?;
        println!("\nReport written to {}", written.display());
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    // Sole `.env` load; it must precede logging so `GLYCOSCREEN_LOG_MODE` can come from it.
    dotenvy::dotenv().ok();
    let _guard = init_logging()?;
    let config = Config::from_env()?;
    tracing::debug!("Configuration: {config:?}");

    let service = build_service(&config)?;

    match cli.command {
        Command::Assess(args) => run_assess(&service, args)?,
        Command::History { patient_id } => {
            let records = service.history(&patient_id)?;
            if records.is_empty() {
                println!("No assessments recorded for {patient_id}");
            }
            print_records(&records);
        }
        Command::Patients => {
            for id in service.patient_ids()? {
                println!("{id}");
            }
        }
        Command::Recent { limit } => print_records(&service.recent(limit)?),
        Command::List { offset, limit } => print_page(&service.page(offset, limit.max(1))?),
    }

    Ok(())
}
