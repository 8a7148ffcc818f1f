//! BOIN Assistant command-line entry point.

use secrecy::ExposeSecret;
use std::sync::Arc;
use tokio::io::BufReader;

use boin_assistant::adapters::ai::{
    AnthropicConfig, AnthropicProvider, GeminiConfig, GeminiProvider, MockAIProvider,
};
use boin_assistant::adapters::cli::Repl;
use boin_assistant::adapters::documents::FileReferenceLibrary;
use boin_assistant::adapters::statistics::RscriptEngine;
use boin_assistant::application::{
    GatewayConfig, SendTurnHandler, StatisticsGateway, TurnSettings,
};
use boin_assistant::config::{AiConfig, AiProvider, AppConfig, EngineConfig};
use boin_assistant::domain::conversation::instruction_for_profile;
use boin_assistant::ports::{AIError, AIProvider, ReferenceLibrary, StatisticsEngine};
use boin_assistant::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_telemetry(&config.session.log_level);
    config.validate()?;

    let provider = build_provider(&config.ai)?;
    let info = provider.provider_info();
    tracing::info!(provider = %info.name, model = %info.model, "Conversational service ready");

    let engine = build_engine(&config.engine).await;
    let gateway = StatisticsGateway::new(
        engine,
        GatewayConfig::default()
            .with_timeout(config.engine.timeout())
            .with_max_retries(config.engine.max_retries),
    );

    let library = FileReferenceLibrary::new(config.session.reference_paths());
    let loaded = library.load_all().await;
    let notices = loaded
        .failures
        .iter()
        .map(|err| format!("Reference document unavailable: {}", err))
        .collect();

    let settings = TurnSettings::new(instruction_for_profile(config.session.instruction_profile))
        .with_transcript_scope(config.session.transcript_scope)
        .with_gating_policy(config.session.gating_policy)
        .with_engine_errors(config.session.engine_errors)
        .with_max_tokens(config.ai.max_tokens);

    let handler = SendTurnHandler::new(provider, gateway, loaded.documents, settings);
    let mut repl = Repl::new(handler).with_startup_notices(notices);

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    repl.run(stdin, &mut stdout).await?;

    Ok(())
}

fn build_provider(config: &AiConfig) -> Result<Arc<dyn AIProvider>, AIError> {
    let provider: Arc<dyn AIProvider> = match config.provider {
        AiProvider::Gemini => {
            let key = config
                .gemini_api_key
                .as_ref()
                .map(|k| k.expose_secret().clone())
                .unwrap_or_default();
            let mut gemini = GeminiConfig::new(key)
                .with_timeout(config.timeout())
                .with_max_retries(config.max_retries);
            if let Some(model) = &config.model {
                gemini = gemini.with_model(model);
            }
            Arc::new(GeminiProvider::new(gemini)?)
        }
        AiProvider::Anthropic => {
            let key = config
                .anthropic_api_key
                .as_ref()
                .map(|k| k.expose_secret().clone())
                .unwrap_or_default();
            let mut anthropic = AnthropicConfig::new(key)
                .with_timeout(config.timeout())
                .with_max_retries(config.max_retries)
                .with_max_tokens(config.max_tokens);
            if let Some(model) = &config.model {
                anthropic = anthropic.with_model(model);
            }
            Arc::new(AnthropicProvider::new(anthropic)?)
        }
        AiProvider::Mock => Arc::new(MockAIProvider::new()),
    };
    Ok(provider)
}

async fn build_engine(config: &EngineConfig) -> Arc<dyn StatisticsEngine> {
    let engine = RscriptEngine::new().with_rscript_path(&config.rscript_path);
    if !engine.is_available().await {
        tracing::warn!(
            rscript_path = %config.rscript_path,
            "Rscript not found; statistics calls will fail until it is installed"
        );
    }
    Arc::new(engine)
}
