//! SendTurn command handler.
//!
//! Drives one user turn: gate observation, instruction assembly, the call to
//! the conversational service, transcript update, and the extractor and
//! gateway pass over the reply.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::application::{GatewayError, StatisticsGateway};
use crate::domain::conversation::{
    CallShape, Conversation, ExtractedCall, InstructionConfig, ParameterExtractor, TranscriptScope,
};
use crate::ports::{AIError, AIProvider, ReferenceDocument, RequestMetadata, StopReason, TurnRequest};

/// Whether the confirmation gate can hold back engine calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatingPolicy {
    /// The gate only adds the confirmation clause to the instruction.
    #[default]
    Advisory,
    /// Operating characteristics and MTD selection wait for confirmation.
    Enforced,
}

impl GatingPolicy {
    /// True when a call of this shape may run in the current gate state.
    pub fn permits(&self, shape: CallShape, boundaries_confirmed: bool) -> bool {
        match self {
            GatingPolicy::Advisory => true,
            GatingPolicy::Enforced => shape == CallShape::Boundary || boundaries_confirmed,
        }
    }
}

/// Whether engine failures are shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineErrorDisplay {
    /// Logged only.
    Hidden,
    /// Logged and reported as a notice.
    #[default]
    Visible,
}

/// Per-session settings for turn handling.
#[derive(Debug, Clone)]
pub struct TurnSettings {
    pub instruction: InstructionConfig,
    pub transcript_scope: TranscriptScope,
    pub gating_policy: GatingPolicy,
    pub engine_errors: EngineErrorDisplay,
    pub max_tokens: Option<u32>,
}

impl TurnSettings {
    pub fn new(instruction: InstructionConfig) -> Self {
        Self {
            instruction,
            transcript_scope: TranscriptScope::default(),
            gating_policy: GatingPolicy::default(),
            engine_errors: EngineErrorDisplay::default(),
            max_tokens: None,
        }
    }

    pub fn with_transcript_scope(mut self, scope: TranscriptScope) -> Self {
        self.transcript_scope = scope;
        self
    }

    pub fn with_gating_policy(mut self, policy: GatingPolicy) -> Self {
        self.gating_policy = policy;
        self
    }

    pub fn with_engine_errors(mut self, display: EngineErrorDisplay) -> Self {
        self.engine_errors = display;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Errors that end a turn without a reply.
#[derive(Debug, Error)]
pub enum SendTurnError {
    /// Input is empty or whitespace only.
    #[error("message content cannot be empty")]
    EmptyInput,

    /// The conversational service failed.
    #[error("conversational service error: {0}")]
    Provider(#[from] AIError),
}

/// What the user sees after a turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    /// The assistant's reply, trimmed.
    pub reply: String,
    /// The call recognised in the reply, if any.
    pub call: Option<CallShape>,
    /// Rendered engine output.
    pub computed: Option<String>,
    /// Non-fatal messages (withheld calls, visible engine errors).
    pub notices: Vec<String>,
    /// True when this turn's message confirmed the boundaries.
    pub confirmed_this_turn: bool,
}

/// Handler for one conversational turn.
pub struct SendTurnHandler {
    provider: Arc<dyn AIProvider>,
    gateway: StatisticsGateway,
    extractor: ParameterExtractor,
    documents: Vec<ReferenceDocument>,
    settings: TurnSettings,
}

impl SendTurnHandler {
    pub fn new(
        provider: Arc<dyn AIProvider>,
        gateway: StatisticsGateway,
        documents: Vec<ReferenceDocument>,
        settings: TurnSettings,
    ) -> Self {
        Self {
            provider,
            gateway,
            extractor: ParameterExtractor::new(),
            documents,
            settings,
        }
    }

    pub fn settings(&self) -> &TurnSettings {
        &self.settings
    }

    /// Handles one user input against a conversation.
    ///
    /// On a provider failure the transcript is left as it was so the user
    /// can retry the same message.
    pub async fn handle(
        &self,
        conversation: &mut Conversation,
        input: &str,
    ) -> Result<TurnOutcome, SendTurnError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(SendTurnError::EmptyInput);
        }

        let confirmed_this_turn = conversation.observe_user_message(input);
        if confirmed_this_turn {
            tracing::info!(chat = conversation.name(), "Decision boundaries confirmed");
        }

        let instruction = self
            .settings
            .instruction
            .render(&conversation.instruction_context());
        let contents = conversation.outbound_contents(self.settings.transcript_scope, input);
        let trace_id = Uuid::new_v4().to_string();

        let mut request =
            TurnRequest::new(RequestMetadata::new(conversation.id(), &trace_id), contents)
                .with_system_instruction(instruction)
                .with_documents(self.documents.clone());
        if let Some(max) = self.settings.max_tokens {
            request = request.with_max_tokens(max);
        }

        tracing::info!(
            chat = conversation.name(),
            conversation_id = %conversation.id(),
            trace_id = %trace_id,
            turns = conversation.turns().len(),
            boundaries_confirmed = conversation.boundaries_confirmed(),
            "Sending turn"
        );

        let response = match self.provider.complete(request).await {
            Ok(response) => response,
            Err(err) => {
                tracing::error!(trace_id = %trace_id, error = %err, "Conversational service failed");
                return Err(err.into());
            }
        };

        if response.stop_reason == StopReason::Truncated {
            tracing::warn!(
                trace_id = %trace_id,
                output_tokens = response.usage.output_tokens,
                "Reply cut off at the token cap"
            );
        }

        let reply = response.content.trim().to_string();
        conversation.record_exchange(input, reply.clone());

        let mut outcome = TurnOutcome {
            reply,
            call: None,
            computed: None,
            notices: Vec::new(),
            confirmed_this_turn,
        };

        if let Some(call) = self.extractor.extract(&outcome.reply) {
            outcome.call = Some(call.shape());
            self.run_call(conversation, &call, &mut outcome).await;
        }

        Ok(outcome)
    }

    async fn run_call(
        &self,
        conversation: &Conversation,
        call: &ExtractedCall,
        outcome: &mut TurnOutcome,
    ) {
        let shape = call.shape();

        if !self
            .settings
            .gating_policy
            .permits(shape, conversation.boundaries_confirmed())
        {
            tracing::info!(
                chat = conversation.name(),
                function = shape.function_name(),
                "Withholding call until boundaries are confirmed"
            );
            outcome.notices.push(format!(
                "{} was not run: confirm the decision boundaries first.",
                shape.function_name()
            ));
            return;
        }

        match self.gateway.run(call).await {
            Ok(text) => outcome.computed = Some(text),
            Err(err) => {
                tracing::warn!(
                    chat = conversation.name(),
                    function = shape.function_name(),
                    error = %err,
                    "Statistics call failed"
                );
                if self.settings.engine_errors == EngineErrorDisplay::Visible {
                    outcome.notices.push(engine_notice(&err));
                }
            }
        }
    }
}

fn engine_notice(err: &GatewayError) -> String {
    format!("Error running {}: {}", err.shape().function_name(), err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{MockAIProvider, MockError};
    use crate::adapters::statistics::MockStatisticsEngine;
    use crate::application::GatewayConfig;
    use crate::domain::conversation::{instruction_for_profile, InstructionProfile, CONFIRMATION_CLAUSE};
    use crate::ports::EngineError;
    use std::time::Duration;

    fn handler(
        provider: MockAIProvider,
        engine: MockStatisticsEngine,
        settings: TurnSettings,
    ) -> SendTurnHandler {
        let gateway = StatisticsGateway::new(
            Arc::new(engine),
            GatewayConfig::default().with_retry_delay(Duration::ZERO),
        );
        SendTurnHandler::new(Arc::new(provider), gateway, Vec::new(), settings)
    }

    fn settings() -> TurnSettings {
        TurnSettings::new(instruction_for_profile(InstructionProfile::Concise))
    }

    mod request_assembly {
        use super::*;

        #[tokio::test]
        async fn unconfirmed_turn_carries_confirmation_clause() {
            let provider = MockAIProvider::new().with_response("Hello");
            let h = handler(provider.clone(), MockStatisticsEngine::new(), settings());
            let mut conv = Conversation::new("Chat 1");

            h.handle(&mut conv, "design a trial").await.unwrap();

            let call = provider.last_call().unwrap();
            assert!(call.system_instruction.ends_with(CONFIRMATION_CLAUSE));
            assert_eq!(
                call.contents,
                "[chat history start]: [chat history end]\nUser: design a trial"
            );
        }

        #[tokio::test]
        async fn gate_is_observed_before_instruction_is_built() {
            let provider = MockAIProvider::new().with_response("Great");
            let h = handler(provider.clone(), MockStatisticsEngine::new(), settings());
            let mut conv = Conversation::new("Chat 1");

            let outcome = h.handle(&mut conv, "Yes!").await.unwrap();

            assert!(outcome.confirmed_this_turn);
            assert!(!provider
                .last_call()
                .unwrap()
                .system_instruction
                .contains(CONFIRMATION_CLAUSE));
        }

        #[tokio::test]
        async fn documents_are_attached() {
            let provider = MockAIProvider::new();
            let gateway = StatisticsGateway::new(
                Arc::new(MockStatisticsEngine::new()),
                GatewayConfig::default(),
            );
            let doc = ReferenceDocument::new("guide.pdf", "application/pdf", vec![1]);
            let h = SendTurnHandler::new(
                Arc::new(provider.clone()),
                gateway,
                vec![doc.clone()],
                settings().with_max_tokens(512),
            );
            let mut conv = Conversation::new("Chat 1");

            h.handle(&mut conv, "hi").await.unwrap();
            h.handle(&mut conv, "again").await.unwrap();

            let calls = provider.get_calls();
            assert_eq!(calls[0].documents.len(), 1);
            assert_eq!(calls[0].max_tokens, Some(512));
            for call in &calls {
                assert!(Arc::ptr_eq(&call.documents[0].bytes, &doc.bytes));
            }
        }

        #[tokio::test]
        async fn empty_input_is_rejected_without_a_call() {
            let provider = MockAIProvider::new();
            let h = handler(provider.clone(), MockStatisticsEngine::new(), settings());
            let err = h.handle(&mut Conversation::new("Chat 1"), "   ").await.unwrap_err();
            assert!(matches!(err, SendTurnError::EmptyInput));
            assert_eq!(provider.call_count(), 0);
        }
    }

    mod transcript {
        use super::*;

        #[tokio::test]
        async fn exchange_is_recorded_with_trimmed_reply() {
            let provider = MockAIProvider::new().with_response("  Sure thing.\n");
            let h = handler(provider, MockStatisticsEngine::new(), settings());
            let mut conv = Conversation::new("Chat 1");

            let outcome = h.handle(&mut conv, " hello ").await.unwrap();

            assert_eq!(outcome.reply, "Sure thing.");
            assert_eq!(conv.turns().len(), 2);
            assert_eq!(conv.turns()[0].content, "hello");
            assert_eq!(conv.turns()[1].content, "Sure thing.");
        }

        #[tokio::test]
        async fn provider_failure_leaves_transcript_untouched() {
            let provider = MockAIProvider::new().with_error(MockError::AuthenticationFailed);
            let h = handler(provider, MockStatisticsEngine::new(), settings());
            let mut conv = Conversation::new("Chat 1");

            let err = h.handle(&mut conv, "hello").await.unwrap_err();

            assert!(matches!(err, SendTurnError::Provider(AIError::AuthenticationFailed)));
            assert!(conv.turns().is_empty());
        }
    }

    mod statistics {
        use super::*;

        #[tokio::test]
        async fn boundary_reply_is_computed() {
            let provider =
                MockAIProvider::new().with_response("target = 0.3, ncohort = 10, cohortsize = 3");
            let engine = MockStatisticsEngine::new();
            let h = handler(provider, engine.clone(), settings());

            let outcome = h.handle(&mut Conversation::new("Chat 1"), "go").await.unwrap();

            assert_eq!(outcome.call, Some(CallShape::Boundary));
            assert!(outcome.computed.unwrap().starts_with("Patients Treated"));
            assert_eq!(engine.call_count(), 1);
        }

        #[tokio::test]
        async fn plain_reply_runs_nothing() {
            let engine = MockStatisticsEngine::new();
            let h = handler(
                MockAIProvider::new().with_response("What target rate?"),
                engine.clone(),
                settings(),
            );
            let outcome = h.handle(&mut Conversation::new("Chat 1"), "hi").await.unwrap();
            assert!(outcome.call.is_none());
            assert!(outcome.computed.is_none());
            assert_eq!(engine.call_count(), 0);
        }

        #[tokio::test]
        async fn visible_engine_error_becomes_notice() {
            let provider = MockAIProvider::new().with_response("ntox = [1], npts = [3]");
            let engine = MockStatisticsEngine::new().with_error(EngineError::failed("boom"));
            let h = handler(provider, engine, settings());

            let outcome = h.handle(&mut Conversation::new("Chat 1"), "run").await.unwrap();

            assert!(outcome.computed.is_none());
            assert_eq!(outcome.notices.len(), 1);
            assert!(outcome.notices[0].starts_with("Error running select.mtd"));
        }

        #[tokio::test]
        async fn hidden_engine_error_is_suppressed() {
            let provider = MockAIProvider::new().with_response("ntox = [1], npts = [3]");
            let engine = MockStatisticsEngine::new().with_error(EngineError::failed("boom"));
            let h = handler(
                provider,
                engine,
                settings().with_engine_errors(EngineErrorDisplay::Hidden),
            );

            let outcome = h.handle(&mut Conversation::new("Chat 1"), "run").await.unwrap();

            assert!(outcome.computed.is_none());
            assert!(outcome.notices.is_empty());
        }
    }

    mod gating {
        use super::*;

        #[test]
        fn advisory_permits_everything() {
            for shape in [
                CallShape::Boundary,
                CallShape::OperatingCharacteristics,
                CallShape::MtdSelection,
            ] {
                assert!(GatingPolicy::Advisory.permits(shape, false));
            }
        }

        #[test]
        fn enforced_always_permits_boundaries() {
            assert!(GatingPolicy::Enforced.permits(CallShape::Boundary, false));
            assert!(!GatingPolicy::Enforced.permits(CallShape::MtdSelection, false));
            assert!(GatingPolicy::Enforced.permits(CallShape::MtdSelection, true));
        }

        #[tokio::test]
        async fn enforced_policy_withholds_oc_until_confirmed() {
            let provider = MockAIProvider::new()
                .with_response("ptrue = 0.05, 0.1, 0.3")
                .with_response("ptrue = 0.05, 0.1, 0.3");
            let engine = MockStatisticsEngine::new();
            let h = handler(
                provider,
                engine.clone(),
                settings().with_gating_policy(GatingPolicy::Enforced),
            );
            let mut conv = Conversation::new("Chat 1");

            let first = h.handle(&mut conv, "simulate please").await.unwrap();
            assert!(first.computed.is_none());
            assert_eq!(first.notices.len(), 1);
            assert_eq!(engine.call_count(), 0);

            let second = h.handle(&mut conv, "yes, proceed").await.unwrap();
            assert!(second.computed.is_some());
            assert_eq!(engine.call_count(), 1);
        }

        #[tokio::test]
        async fn advisory_policy_runs_oc_unconfirmed() {
            let provider = MockAIProvider::new().with_response("ptrue = 0.05, 0.1, 0.3");
            let engine = MockStatisticsEngine::new();
            let h = handler(provider, engine.clone(), settings());

            let outcome = h.handle(&mut Conversation::new("Chat 1"), "simulate").await.unwrap();

            assert!(outcome.computed.is_some());
            assert_eq!(engine.call_count(), 1);
        }
    }

    #[test]
    fn policies_deserialize_snake_case() {
        let policy: GatingPolicy = serde_json::from_str("\"enforced\"").unwrap();
        assert_eq!(policy, GatingPolicy::Enforced);
        let display: EngineErrorDisplay = serde_json::from_str("\"hidden\"").unwrap();
        assert_eq!(display, EngineErrorDisplay::Hidden);
    }
}
