//! Prompt templates for the panel, memory, focus-group, and executive flows.
//!
//! All builders are pure: they compose persona instruction, calibration
//! context, memory context, and conversation transcript into the single
//! instruction payload the inference gateway expects, with no side effects.

use crate::core::manuscript::Manuscript;
use crate::focus_group::session::{FocusMessage, Speaker};
use crate::memory::record::{MemoryEvent, MemoryEventKind};
use crate::reader::analysis::AnalysisResult;
use crate::reader::persona::ReaderPersona;

/// Templates for generating prompts at each stage
pub struct PromptTemplate;

impl PromptTemplate {
    /// System instruction for a reader's analysis call: persona behavior
    /// plus optional calibration and memory context.
    pub fn reader_system(
        persona: &ReaderPersona,
        calibration: Option<&str>,
        memory: Option<&str>,
    ) -> String {
        let mut system = format!(
            "You are {}, a manuscript reader on an editorial panel.\n{}",
            persona.name, persona.instruction
        );
        if let Some(calibration) = calibration {
            system.push_str("\n\nCalibration context:\n");
            system.push_str(calibration);
        }
        if let Some(memory) = memory {
            system.push_str("\n\n");
            system.push_str(memory);
        }
        system
    }

    /// User prompt asking a reader for a structured analysis.
    pub fn analysis_prompt(manuscript: &Manuscript) -> String {
        let meta = manuscript.meta();
        format!(
            r#"Read the following manuscript and return your judgment as JSON.

Title: {}
Author: {}
Genre: {}
Format: {}{}

--- MANUSCRIPT ---
{}
--- END MANUSCRIPT ---

Reply with a single JSON object of this shape:
{{
  "scores": {{
    "premise": {{"score": 0-100, "rating": "excellent|very_good|good|so_so|not_good"}},
    "plot": {{...}}, "character": {{...}}, "dialogue": {{...}}, "pacing": {{...}}, "overall": {{...}}
  }},
  "recommendation": "recommend|consider|low_consider|pass",
  "strengths": ["2-4 key strengths"],
  "concerns": ["2-4 key concerns"],
  "standout_quote": "one quotation from the text",
  "evidence_strength": 0-100
}}"#,
            meta.title,
            meta.author,
            meta.genre,
            meta.format,
            meta.page_count
                .map(|p| format!("\nPages: {p}"))
                .unwrap_or_default(),
            manuscript.text()
        )
    }

    /// System prompt for the L1 extraction call.
    ///
    /// This call runs on a smaller-footprint model tuned for extraction
    /// rather than judgment.
    pub fn extraction_system() -> &'static str {
        r#"You extract atomic facts from editorial notes.
Return a JSON array of at most 15 items, each:
{"content": "one self-contained fact", "topic": "short topic", "importance": "high|medium|low", "page": optional page number}.
Extract only what is stated; do not judge or embellish."#
    }

    /// User prompt for the extraction call.
    pub fn extraction_prompt(kind: MemoryEventKind, content: &str) -> String {
        format!(
            "Source: a {} event from a manuscript reader.\n\n{}\n\nExtract the atomic facts as JSON.",
            kind.as_str(),
            content
        )
    }

    /// System prompt for re-synthesizing the L3 narrative memory.
    pub fn narrative_system() -> &'static str {
        r#"You maintain a reader's evolving memory of a manuscript across drafts.
Combine the previous memory with the new event into a fresh narrative.
Reply with JSON: {"summary": "2-4 sentence narrative memory", "evolution": "1-2 sentences on how the reader's view has changed"}."#
    }

    /// User prompt for the narrative re-synthesis call.
    pub fn narrative_prompt(previous: Option<&str>, event: &MemoryEvent) -> String {
        let mut prompt = String::new();
        match previous {
            Some(previous) if !previous.is_empty() => {
                prompt.push_str("Previous memory:\n");
                prompt.push_str(previous);
                prompt.push_str("\n\n");
            }
            _ => prompt.push_str("No previous memory exists.\n\n"),
        }
        prompt.push_str(&format!(
            "New {} event:\n{}\n\nSynthesize the updated memory as JSON.",
            event.kind.as_str(),
            event.content
        ));
        prompt
    }

    /// System prompt for the focus-group moderator.
    pub fn moderator_system() -> &'static str {
        r#"You moderate a focus-group discussion between manuscript readers.
Keep statements short and conversational. Reference readers by name.
Never score or judge the manuscript yourself; your job is to guide and summarize."#
    }

    /// Moderator opening statement prompt.
    pub fn opening_prompt(title: &str, reader_names: &[String], questions: usize) -> String {
        format!(
            "Open a focus-group session about the manuscript \"{}\". Panelists: {}. \
             There are {} discussion questions ahead. Welcome the panel and frame the session in 2-3 sentences.",
            title,
            reader_names.join(", "),
            questions
        )
    }

    /// A reader's response turn within a question round.
    pub fn focus_response_prompt(
        question: &str,
        transcript: &[FocusMessage],
        own_analysis: Option<&AnalysisResult>,
    ) -> String {
        let mut prompt = String::new();
        if let Some(analysis) = own_analysis {
            prompt.push_str(&format!(
                "Your prior analysis of this manuscript: {}\n\n",
                analysis.summary_line()
            ));
        }
        if !transcript.is_empty() {
            prompt.push_str("Conversation so far:\n");
            prompt.push_str(&Self::format_transcript(transcript));
            prompt.push('\n');
        }
        prompt.push_str(&format!(
            "The moderator asks: {}\n\nGive your answer in 2-4 sentences, in character.",
            question
        ));
        prompt
    }

    /// A reader's reaction turn: offered the other readers' statements,
    /// they may react or decline.
    pub fn focus_reaction_prompt(statements: &[(String, String)]) -> String {
        let mut prompt = String::from("The other panelists said:\n");
        for (name, statement) in statements {
            prompt.push_str(&format!("- {}: {}\n", name, statement));
        }
        prompt.push_str(
            "\nIf one statement provokes a genuine reaction, reply in exactly this form:\n\
             AGREES_WITH <name>: <your reaction>\n\
             DISAGREES_WITH <name>: <your reaction>\n\
             BUILDS_ON <name>: <your reaction>\n\
             Otherwise reply NO_REACTION.",
        );
        prompt
    }

    /// Moderator synthesis closing one question round.
    pub fn moderator_round_prompt(question: &str, transcript: &[FocusMessage]) -> String {
        format!(
            "The question under discussion was: {}\n\nRecent statements:\n{}\n\
             Summarize where the panel landed in 2-3 sentences and hand off to the next topic.",
            question,
            Self::format_transcript(transcript)
        )
    }

    /// Moderator closing statement for the whole session.
    pub fn closing_prompt(transcript: &[FocusMessage]) -> String {
        format!(
            "The discussion is ending. Recent statements:\n{}\n\
             Close the session: thank the panel and summarize the discussion's main threads in 3-4 sentences.",
            Self::format_transcript(transcript)
        )
    }

    /// System prompt for the executive evaluation call.
    pub fn executive_system() -> &'static str {
        r#"You are a publishing executive deciding whether to pursue a manuscript.
You see only the panel's harmonized coverage, never individual reader text.
Reply with JSON: {"verdict": "pursue|pass", "confidence": 0-100, "rationale": "...",
"key_factors": [...], "concerns": [...], "citations": ["coverage lines your verdict rests on"]}."#
    }

    /// User prompt for the executive evaluation, fed the harmonized report.
    pub fn executive_prompt(report: &str) -> String {
        format!(
            "Harmonized panel coverage:\n\n{}\n\nDeliver your verdict as JSON.",
            report
        )
    }

    fn format_transcript(messages: &[FocusMessage]) -> String {
        messages
            .iter()
            .map(|m| {
                let speaker = match &m.speaker {
                    Speaker::Moderator => "Moderator".to_string(),
                    Speaker::Reader(id) => id.to_string(),
                    Speaker::User => "Author".to_string(),
                };
                format!("[{}] {}: {}", m.sequence, speaker, m.content)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
