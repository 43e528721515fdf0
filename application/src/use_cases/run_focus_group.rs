//! Focus-group conversation engine.
//!
//! Drives a moderator-led, turn-ordered discussion between the panel's
//! readers: an opening, one discussion round per question (responses, then
//! bounded reaction sub-rounds, then a moderator synthesis), and a closing.
//! Statements stream token-by-token through the event relay with a pacing
//! delay between turns.
//!
//! A reader whose turn fails is skipped for that turn; only moderator
//! failure or cancellation ends the session early, and either leaves the
//! session `Aborted` with every produced turn intact.

use crate::ports::event_relay::{EventRelay, PanelEvent};
use crate::ports::gateway::{ChatMessage, GatewayError, InferenceGateway};
use crate::ports::memory_store::MemoryStore;
use crate::ports::progress::{NoProgress, ProgressNotifier};
use crate::use_cases::memorize::MemorizeUseCase;
use crate::use_cases::recall::RecallUseCase;
use panel_domain::{
    AnalysisResult, Divergence, FocusGroupSession, MemoryEvent, MemoryKey, Phase, PromptTemplate,
    Reaction, ReaderId, ReaderPersona, SessionState, Speaker, StreamEvent, parse_reaction,
    render_memory_context, speaking_order,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Messages of prompt context carried into each turn.
const TRANSCRIPT_WINDOW: usize = 6;

/// Errors that can occur when starting a focus group
#[derive(thiserror::Error, Debug)]
pub enum FocusGroupError {
    #[error("No readers configured")]
    EmptyPanel,
}

/// Why a turn (and possibly the session) ended early.
enum Interrupt {
    Cancelled,
    Gateway(GatewayError),
}

/// Input for a focus-group session
#[derive(Debug, Clone)]
pub struct FocusGroupInput {
    pub project: String,
    pub draft: u32,
    pub title: String,
    pub questions: Vec<String>,
    /// The panel's coverage analyses, giving each reader its own judgment
    /// as conversation context
    pub analyses: Vec<AnalysisResult>,
    /// Divergences from harmonization, driving the speaking order
    pub divergences: Vec<Divergence>,
    /// Delay between turns, for a readable live transcript
    pub pacing: Duration,
    /// Reaction sub-rounds per question round
    pub max_reaction_rounds: usize,
}

impl FocusGroupInput {
    pub fn new(
        project: impl Into<String>,
        draft: u32,
        title: impl Into<String>,
        questions: Vec<String>,
    ) -> Self {
        Self {
            project: project.into(),
            draft,
            title: title.into(),
            questions,
            analyses: Vec::new(),
            divergences: Vec::new(),
            pacing: Duration::from_millis(400),
            max_reaction_rounds: 2,
        }
    }

    pub fn with_context(mut self, analyses: Vec<AnalysisResult>, divergences: Vec<Divergence>) -> Self {
        self.analyses = analyses;
        self.divergences = divergences;
        self
    }

    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }
}

/// Use case for running a moderated focus-group discussion
pub struct RunFocusGroupUseCase<G: InferenceGateway + 'static> {
    gateway: Arc<G>,
    panel: Vec<ReaderPersona>,
    store: Option<Arc<dyn MemoryStore>>,
    memorizer: Option<Arc<MemorizeUseCase<G>>>,
}

impl<G: InferenceGateway + 'static> RunFocusGroupUseCase<G> {
    pub fn new(gateway: Arc<G>, panel: Vec<ReaderPersona>) -> Self {
        Self {
            gateway,
            panel,
            store: None,
            memorizer: None,
        }
    }

    /// Attach memory: recalled context is injected into each reader's
    /// response turns, and each reader's statements are memorized as one
    /// focus-group event after the session ends.
    pub fn with_memory(
        mut self,
        store: Arc<dyn MemoryStore>,
        memorizer: Arc<MemorizeUseCase<G>>,
    ) -> Self {
        self.store = Some(store);
        self.memorizer = Some(memorizer);
        self
    }

    /// Run the session without progress reporting or an event stream.
    pub async fn execute(
        &self,
        input: FocusGroupInput,
    ) -> Result<FocusGroupSession, FocusGroupError> {
        self.execute_with_progress(
            input,
            &NoProgress,
            &EventRelay::null(),
            &CancellationToken::new(),
        )
        .await
    }

    /// Run the session, streaming turns through the relay.
    ///
    /// Cancellation and moderator failure end the session early with state
    /// `Aborted`; the returned session keeps every turn produced so far.
    pub async fn execute_with_progress(
        &self,
        input: FocusGroupInput,
        progress: &dyn ProgressNotifier,
        relay: &EventRelay,
        cancel: &CancellationToken,
    ) -> Result<FocusGroupSession, FocusGroupError> {
        if self.panel.is_empty() {
            return Err(FocusGroupError::EmptyPanel);
        }

        info!(
            project = %input.project,
            draft = input.draft,
            questions = input.questions.len(),
            "Starting focus group"
        );
        relay
            .emit(PanelEvent::PhaseChange {
                phase: Phase::FocusGroup,
            })
            .await;
        progress.on_phase_start(&Phase::FocusGroup, input.questions.len());

        let mut session = FocusGroupSession::new(&input.project, input.draft);
        match self
            .run_session(&mut session, &input, progress, relay, cancel)
            .await
        {
            Ok(()) => session.state = SessionState::Complete,
            Err(Interrupt::Cancelled) => {
                info!(session = %session.id, "Focus group cancelled");
                session.state = SessionState::Aborted;
            }
            Err(Interrupt::Gateway(e)) => {
                warn!(session = %session.id, "Moderator turn failed, aborting session: {e}");
                session.state = SessionState::Aborted;
            }
        }

        progress.on_phase_complete(&Phase::FocusGroup);
        relay
            .emit(PanelEvent::FocusGroupComplete {
                state: session.state,
                messages: session.messages().len(),
            })
            .await;
        self.spawn_memorize(&input, &session, relay);

        info!(
            session = %session.id,
            messages = session.messages().len(),
            state = ?session.state,
            "Focus group ended"
        );
        Ok(session)
    }

    async fn run_session(
        &self,
        session: &mut FocusGroupSession,
        input: &FocusGroupInput,
        progress: &dyn ProgressNotifier,
        relay: &EventRelay,
        cancel: &CancellationToken,
    ) -> Result<(), Interrupt> {
        let order = speaking_order(&self.panel, &input.divergences);
        debug!(?order, "Speaking order computed");
        let memory = self.recall_contexts(input).await;

        // Opening
        let reader_names: Vec<String> = order
            .iter()
            .filter_map(|id| self.persona(id))
            .map(|p| p.name.clone())
            .collect();
        let opening = self
            .moderator_turn(
                &PromptTemplate::opening_prompt(&input.title, &reader_names, input.questions.len()),
                progress,
                relay,
                cancel,
            )
            .await?;
        self.append_and_emit(session, Speaker::Moderator, opening, None, None, relay)
            .await;

        for (index, question) in input.questions.iter().enumerate() {
            session.state = SessionState::Discussion { question: index };
            self.pace(input.pacing, cancel).await?;

            // The moderator poses the question verbatim.
            self.append_and_emit(
                session,
                Speaker::Moderator,
                question.clone(),
                Some(question.clone()),
                None,
                relay,
            )
            .await;

            self.response_round(session, input, question, &order, &memory, progress, relay, cancel)
                .await?;
            self.reaction_rounds(session, input, question, &order, progress, relay, cancel)
                .await?;

            // Moderator synthesis closes the round.
            self.pace(input.pacing, cancel).await?;
            let synthesis = self
                .moderator_turn(
                    &PromptTemplate::moderator_round_prompt(
                        question,
                        session.transcript_window(TRANSCRIPT_WINDOW),
                    ),
                    progress,
                    relay,
                    cancel,
                )
                .await?;
            self.append_and_emit(
                session,
                Speaker::Moderator,
                synthesis,
                Some(question.clone()),
                None,
                relay,
            )
            .await;
        }

        session.state = SessionState::Closing;
        self.pace(input.pacing, cancel).await?;
        let closing = self
            .moderator_turn(
                &PromptTemplate::closing_prompt(session.transcript_window(TRANSCRIPT_WINDOW)),
                progress,
                relay,
                cancel,
            )
            .await?;
        self.append_and_emit(session, Speaker::Moderator, closing, None, None, relay)
            .await;
        Ok(())
    }

    /// Recall every reader's memory for continuity context, degrading to
    /// none when no store is attached or the lookup fails.
    async fn recall_contexts(&self, input: &FocusGroupInput) -> HashMap<ReaderId, String> {
        let Some(store) = &self.store else {
            return HashMap::new();
        };
        let recall = RecallUseCase::new(store.clone());
        match recall
            .recall_all(&self.panel, &input.project, input.draft)
            .await
        {
            Ok(outcomes) => outcomes
                .iter()
                .filter_map(|(id, outcome)| {
                    Some((id.clone(), render_memory_context(outcome)?))
                })
                .collect(),
            Err(e) => {
                warn!("Memory recall failed; readers discuss without continuity context: {e}");
                HashMap::new()
            }
        }
    }

    /// Every reader answers the question once, in speaking order. A failed
    /// reader is skipped for the turn.
    #[allow(clippy::too_many_arguments)]
    async fn response_round(
        &self,
        session: &mut FocusGroupSession,
        input: &FocusGroupInput,
        question: &str,
        order: &[ReaderId],
        memory: &HashMap<ReaderId, String>,
        progress: &dyn ProgressNotifier,
        relay: &EventRelay,
        cancel: &CancellationToken,
    ) -> Result<(), Interrupt> {
        for reader in order {
            let Some(persona) = self.persona(reader) else {
                continue;
            };
            self.pace(input.pacing, cancel).await?;

            let own_analysis = input.analyses.iter().find(|a| &a.reader == reader);
            let system =
                PromptTemplate::reader_system(persona, None, memory.get(reader).map(String::as_str));
            let prompt = PromptTemplate::focus_response_prompt(
                question,
                session.transcript_window(TRANSCRIPT_WINDOW),
                own_analysis,
            );
            match self
                .streamed_turn(&system, &prompt, &persona.name, Some(reader), progress, relay, cancel)
                .await
            {
                Ok(response) => {
                    self.append_and_emit(
                        session,
                        Speaker::Reader(reader.clone()),
                        response,
                        Some(question.to_string()),
                        None,
                        relay,
                    )
                    .await;
                }
                Err(Interrupt::Cancelled) => return Err(Interrupt::Cancelled),
                Err(Interrupt::Gateway(e)) => {
                    warn!(%reader, "Reader response failed, skipping turn: {e}");
                }
            }
        }
        Ok(())
    }

    /// Bounded reaction sub-rounds. A round in which no reader reacts ends
    /// the phase early.
    async fn reaction_rounds(
        &self,
        session: &mut FocusGroupSession,
        input: &FocusGroupInput,
        question: &str,
        order: &[ReaderId],
        progress: &dyn ProgressNotifier,
        relay: &EventRelay,
        cancel: &CancellationToken,
    ) -> Result<(), Interrupt> {
        // Reactions voiced earlier in this question round, offered to later
        // reactors alongside the original responses.
        let mut voiced: Vec<(ReaderId, String, String)> = Vec::new();
        for round in 0..input.max_reaction_rounds {
            let mut reactions = 0usize;
            for reader in order {
                let Some(persona) = self.persona(reader) else {
                    continue;
                };

                // Offer the other readers' latest statements, plus any
                // reactions already produced this round.
                let mut statements: Vec<(String, String)> = order
                    .iter()
                    .filter(|other| *other != reader)
                    .filter_map(|other| {
                        let name = self.persona(other)?.name.clone();
                        let statement = session.last_statement_of(other)?;
                        Some((name, statement.content.clone()))
                    })
                    .collect();
                statements.extend(
                    voiced
                        .iter()
                        .filter(|(who, _, _)| who != reader)
                        .map(|(_, name, content)| (name.clone(), content.clone())),
                );
                if statements.is_empty() {
                    continue;
                }

                self.pace(input.pacing, cancel).await?;
                let system = PromptTemplate::reader_system(persona, None, None);
                let prompt = PromptTemplate::focus_reaction_prompt(&statements);
                let reply = match self
                    .streamed_turn(&system, &prompt, &persona.name, Some(reader), progress, relay, cancel)
                    .await
                {
                    Ok(reply) => reply,
                    Err(Interrupt::Cancelled) => return Err(Interrupt::Cancelled),
                    Err(Interrupt::Gateway(e)) => {
                        warn!(%reader, "Reader reaction failed, skipping turn: {e}");
                        continue;
                    }
                };

                // Anything that does not parse as a reaction is a decline.
                let Some(parsed) = parse_reaction(&reply, &self.panel) else {
                    debug!(%reader, "No reaction");
                    continue;
                };
                let Some(target) = session.last_statement_of(&parsed.peer) else {
                    debug!(%reader, peer = %parsed.peer, "Reaction peer has no statement");
                    continue;
                };
                let reaction = Reaction {
                    to_sequence: target.sequence,
                    to_reader: parsed.peer.clone(),
                    kind: parsed.kind,
                };
                voiced.push((reader.clone(), persona.name.clone(), parsed.content.clone()));
                self.append_and_emit(
                    session,
                    Speaker::Reader(reader.clone()),
                    parsed.content,
                    Some(question.to_string()),
                    Some(reaction),
                    relay,
                )
                .await;
                reactions += 1;
            }

            if reactions == 0 {
                debug!(round, "No reactions; ending reaction phase");
                break;
            }
        }
        Ok(())
    }

    /// One moderator statement; failure aborts the session.
    async fn moderator_turn(
        &self,
        prompt: &str,
        progress: &dyn ProgressNotifier,
        relay: &EventRelay,
        cancel: &CancellationToken,
    ) -> Result<String, Interrupt> {
        self.streamed_turn(
            PromptTemplate::moderator_system(),
            prompt,
            "Moderator",
            None,
            progress,
            relay,
            cancel,
        )
        .await
    }

    /// Stream one statement through the relay, collecting its full text.
    #[allow(clippy::too_many_arguments)]
    async fn streamed_turn(
        &self,
        system: &str,
        prompt: &str,
        speaker: &str,
        reader: Option<&ReaderId>,
        progress: &dyn ProgressNotifier,
        relay: &EventRelay,
        cancel: &CancellationToken,
    ) -> Result<String, Interrupt> {
        if cancel.is_cancelled() {
            return Err(Interrupt::Cancelled);
        }
        relay
            .emit(PanelEvent::FocusGroupTyping {
                speaker: speaker.to_string(),
                reader: reader.cloned(),
            })
            .await;
        progress.on_stream_start(speaker);

        let mut handle = self
            .gateway
            .stream(system, &[ChatMessage::user(prompt)])
            .await
            .map_err(Interrupt::Gateway)?;

        let mut text = String::new();
        loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => return Err(Interrupt::Cancelled),
                event = handle.receiver.recv() => event,
            };
            match event {
                Some(StreamEvent::Delta(chunk)) => {
                    progress.on_stream_chunk(speaker, &chunk);
                    relay
                        .emit(PanelEvent::TextDelta {
                            speaker: speaker.to_string(),
                            delta: chunk.clone(),
                        })
                        .await;
                    text.push_str(&chunk);
                }
                Some(StreamEvent::Completed(full)) => {
                    if text.is_empty() {
                        text = full;
                    }
                    break;
                }
                Some(StreamEvent::Error(e)) => {
                    return Err(Interrupt::Gateway(GatewayError::RequestFailed(e)));
                }
                None => break,
            }
        }

        progress.on_stream_end(speaker);
        relay
            .emit(PanelEvent::TextComplete {
                speaker: speaker.to_string(),
            })
            .await;
        Ok(text)
    }

    async fn append_and_emit(
        &self,
        session: &mut FocusGroupSession,
        speaker: Speaker,
        content: String,
        topic: Option<String>,
        reaction: Option<Reaction>,
        relay: &EventRelay,
    ) {
        match session.append(speaker, content, topic, reaction) {
            Ok(message) => {
                relay
                    .emit(PanelEvent::FocusGroupMessage {
                        message: message.clone(),
                    })
                    .await;
            }
            Err(e) => warn!(session = %session.id, "Dropping statement: {e}"),
        }
    }

    /// Cancellable inter-turn delay.
    async fn pace(&self, pacing: Duration, cancel: &CancellationToken) -> Result<(), Interrupt> {
        if pacing.is_zero() {
            return Ok(());
        }
        tokio::select! {
            _ = cancel.cancelled() => Err(Interrupt::Cancelled),
            _ = tokio::time::sleep(pacing) => Ok(()),
        }
    }

    fn persona(&self, id: &ReaderId) -> Option<&ReaderPersona> {
        self.panel.iter().find(|p| &p.id == id)
    }

    /// Fire-and-forget memorization of each reader's statements as one
    /// focus-group event.
    fn spawn_memorize(&self, input: &FocusGroupInput, session: &FocusGroupSession, relay: &EventRelay) {
        let Some(memorizer) = &self.memorizer else {
            return;
        };
        let mut set = JoinSet::new();
        for persona in &self.panel {
            let statements: Vec<String> = session
                .messages()
                .iter()
                .filter(|m| m.speaker.reader() == Some(&persona.id))
                .map(|m| m.content.clone())
                .collect();
            if statements.is_empty() {
                continue;
            }
            let memorizer = memorizer.clone();
            let relay = relay.clone();
            let key = MemoryKey::new(persona.id.clone(), &input.project, input.draft);
            set.spawn(async move {
                let event = MemoryEvent::focus_group(statements.join("\n"));
                memorizer.execute(key, event, None, &relay).await;
            });
        }
        set.detach_all();
    }
}
