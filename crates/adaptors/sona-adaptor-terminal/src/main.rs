//! Sona terminal chat binary: config → provider → persona → loop

use clap::Parser;
use sona_adaptor_terminal::TerminalAdaptor;
use sona_core::{
    initialize_profile, load_env, ConversationSession, GenerateParams, Persona, SonaConfig,
    TextGenerator,
};
use sona_provider_gemini::GeminiGenerator;
use sona_provider_openai::OpenAiGenerator;
use std::sync::Arc;

/// Chat with a persona-driven agent
#[derive(Debug, Parser)]
#[command(name = "sona", version, about)]
struct Args {
    /// Path to the YAML configuration file
    #[arg(long, default_value = "config.yaml")]
    config: String,

    /// Persona display name
    #[arg(long, default_value = "Ava")]
    name: String,

    /// Persona gender tag
    #[arg(long, default_value = "female")]
    gender: String,

    /// Treat the persona as an original character (profiled purely from the
    /// description, without world knowledge)
    #[arg(long)]
    original: bool,

    /// Free-text character description; runs trait-profile initialization
    /// before the first turn
    #[arg(long)]
    description: Option<String>,

    /// Style examples anchoring the persona's tone
    #[arg(long)]
    style: Option<String>,
}

/// Backend selection is a configuration-time decision, made once here and
/// injected into the session.
fn build_generator(config: &SonaConfig) -> anyhow::Result<Arc<dyn TextGenerator>> {
    match config.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAiGenerator::new(config))),
        "gemini" => Ok(Arc::new(GeminiGenerator::new(config))),
        other => anyhow::bail!("unsupported provider '{other}' (expected 'openai' or 'gemini')"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    load_env()?;
    let config = SonaConfig::from_file(&args.config)?;
    let generator = build_generator(&config)?;

    let mut persona = Persona::new(args.name, args.gender, args.original);
    if let Some(style) = args.style {
        persona = persona.with_style_examples(style);
    }

    if let Some(description) = &args.description {
        if initialize_profile(&mut persona, generator.as_ref(), description).await {
            println!("{} profiled: {}", persona.name, persona.profile.describe());
        } else {
            println!("Profile initialization failed; keeping neutral defaults.");
        }
    }

    let mut session = ConversationSession::new(persona, generator);
    if let Some(temperature) = config.temperature {
        session = session.with_params(GenerateParams {
            temperature: Some(temperature),
            ..Default::default()
        });
    }

    TerminalAdaptor::new(session).run().await?;
    Ok(())
}
