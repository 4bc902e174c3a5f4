//! CLI binary for exercising the RFx AI provider gateway.

use anyhow::Context;
use clap::{Parser, Subcommand};
use rfx_ai::{
    build_registry, AiGateway, AnalyzeProcurementRequest, CallOptions, ChatRequest,
    EvaluateBidRequest, GatewayConfig, GatewaySettings, GenerateContentRequest,
    GenerateTemplateRequest, ImproveContentRequest, ProviderType, RfxType, SuggestFieldsRequest,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rfx", version, about = "AI content generation for RFx documents")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Pin every call to one provider (disables fallback)
    #[arg(short, long, global = true)]
    provider: Option<ProviderType>,
}

#[derive(Subcommand)]
enum Commands {
    /// Report live availability of the default provider
    Health,

    /// List registered providers
    Providers,

    /// Generate content for a template field
    GenerateContent {
        #[arg(long)]
        field_label: String,

        #[arg(long)]
        rfx_type: RfxType,

        #[arg(long)]
        category: String,

        /// Field description
        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        company_context: Option<String>,

        #[arg(long)]
        procurement_context: Option<String>,
    },

    /// Suggest new fields for a template section
    SuggestFields {
        #[arg(long)]
        section_title: String,

        /// Existing field label (repeatable)
        #[arg(long = "existing")]
        existing: Vec<String>,

        #[arg(long)]
        rfx_type: RfxType,

        #[arg(long)]
        category: String,

        #[arg(long)]
        industry: Option<String>,
    },

    /// Improve existing field content
    ImproveContent {
        #[arg(long)]
        content: String,

        #[arg(long)]
        field_label: String,

        #[arg(long)]
        rfx_type: RfxType,

        /// Improvement focus (repeatable)
        #[arg(long = "improvement")]
        improvements: Vec<String>,
    },

    /// Generate a complete RFx template
    GenerateTemplate {
        #[arg(long)]
        rfx_type: RfxType,

        #[arg(long)]
        category: String,

        #[arg(long)]
        description: String,

        /// Specific requirement (repeatable)
        #[arg(long = "requirement")]
        requirements: Vec<String>,
    },

    /// Assess a purchase request for risk, sourcing, budget and timeline
    AnalyzeRequest {
        #[arg(long)]
        item_title: String,

        #[arg(long)]
        quantity: f64,

        /// Unit of measure
        #[arg(long)]
        uom: String,

        #[arg(long)]
        definition: String,

        #[arg(long)]
        justification: Option<String>,

        /// Technical specifications as JSON
        #[arg(long)]
        specs: Option<String>,
    },

    /// Score a supplier bid against evaluation criteria
    EvaluateBid {
        /// Bid details as JSON
        #[arg(long)]
        bid: String,

        /// Evaluation criteria as JSON
        #[arg(long)]
        criteria: String,
    },

    /// Send one structured chatbot message
    Chat {
        /// System prompt
        #[arg(long)]
        system: String,

        #[arg(long)]
        message: String,

        /// Ground the answer with web search
        #[arg(long)]
        web_search: bool,

        /// Accept replies without a MODE field
        #[arg(long)]
        no_mode: bool,
    },
}

impl Commands {
    /// Whether the command calls the default provider and so needs its credentials.
    fn needs_default_provider(&self) -> bool {
        !matches!(self, Commands::Health | Commands::Providers)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup tracing; stdout is reserved for JSON output
    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = GatewayConfig::from_env()?;
    let gateway = if cli.command.needs_default_provider() && cli.provider.is_none() {
        AiGateway::from_config(&config)?
    } else {
        AiGateway::new(build_registry(&config), GatewaySettings::from(&config))
    };

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling in-flight call");
            on_interrupt.cancel();
        }
    });

    let opts = CallOptions {
        provider: cli.provider,
        cancel,
    };

    match cli.command {
        Commands::Health => print_json(&gateway.check_availability().await)?,
        Commands::Providers => cmd_providers(&gateway)?,
        Commands::GenerateContent {
            field_label,
            rfx_type,
            category,
            description,
            company_context,
            procurement_context,
        } => {
            let req = GenerateContentRequest {
                field_label,
                field_description: description,
                rfx_type,
                category,
                company_context,
                procurement_context,
            };
            print_json(&gateway.generate_field_content_with(&req, &opts).await?)?;
        }
        Commands::SuggestFields {
            section_title,
            existing,
            rfx_type,
            category,
            industry,
        } => {
            let req = SuggestFieldsRequest {
                section_title,
                existing_fields: existing,
                rfx_type,
                category,
                industry,
            };
            print_json(&gateway.suggest_fields_with(&req, &opts).await?)?;
        }
        Commands::ImproveContent {
            content,
            field_label,
            rfx_type,
            improvements,
        } => {
            let req = ImproveContentRequest {
                current_content: content,
                field_label,
                rfx_type,
                improvements,
            };
            print_json(&gateway.improve_content_with(&req, &opts).await?)?;
        }
        Commands::GenerateTemplate {
            rfx_type,
            category,
            description,
            requirements,
        } => {
            let req = GenerateTemplateRequest {
                rfx_type,
                category,
                description,
                specific_requirements: requirements,
            };
            print_json(&gateway.generate_template_with(&req, &opts).await?)?;
        }
        Commands::AnalyzeRequest {
            item_title,
            quantity,
            uom,
            definition,
            justification,
            specs,
        } => {
            let technical_specs = match specs {
                Some(raw) => parse_json_arg("--specs", &raw)?,
                None => serde_json::Value::Null,
            };
            let req = AnalyzeProcurementRequest {
                item_title,
                quantity,
                uom,
                simple_definition: definition,
                justification,
                technical_specs,
            };
            print_json(&gateway.analyze_procurement_request(&req, &opts).await?)?;
        }
        Commands::EvaluateBid { bid, criteria } => {
            let req = EvaluateBidRequest {
                bid: parse_json_arg("--bid", &bid)?,
                criteria: parse_json_arg("--criteria", &criteria)?,
            };
            print_json(&gateway.evaluate_bid(&req, &opts).await?)?;
        }
        Commands::Chat {
            system,
            message,
            web_search,
            no_mode,
        } => {
            let mut req = ChatRequest::new(system, message);
            req.web_search = web_search;
            req.require_mode = !no_mode;
            let resp = gateway.chat(&req, &opts).await?;
            print_json(&resp.body)?;
        }
    }

    Ok(())
}

fn cmd_providers(gateway: &AiGateway) -> anyhow::Result<()> {
    let default = gateway.registry().default_type();
    let rows: Vec<serde_json::Value> = gateway
        .registry()
        .providers()
        .map(|p| {
            serde_json::json!({
                "provider": p.name(),
                "model": p.default_model(),
                "configured": p.is_available(),
                "default": p.provider_type() == default,
            })
        })
        .collect();
    print_json(&rows)
}

fn parse_json_arg(flag: &str, raw: &str) -> anyhow::Result<serde_json::Value> {
    serde_json::from_str(raw).with_context(|| format!("{flag} must be valid JSON"))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
