//! System instructions and prompts for the generative steps.

use agora_persist::{Artifact, ChatMessage, MessageRole, Topic, UserProfile};
use serde::Serialize;
use std::fmt::Write;

use crate::markers::MAX_IDS_PER_REPLY;
use crate::orchestrator::ConversationPhase;

/// Reserved text a client sends to open a conversation. Never persisted and
/// never shown.
pub const START_SIGNAL: &str = "START_SESSION";

pub fn is_start_signal(text: &str) -> bool {
    text.trim() == START_SIGNAL
}

const NO_DESCRIPTION: &str = "No description provided.";
const NO_SCOPE: &str = "No scope defined.";

/// System instructions for the moderator.
///
/// The intro turn restates the topic and asks one role question; every later
/// turn follows the reflect / alternative / weighing-question structure.
pub fn moderator_instructions(
    topic: &Topic,
    artifacts: &[Artifact],
    phase: ConversationPhase,
    language: &str,
) -> String {
    let mut prompt = String::new();

    let _ = writeln!(
        prompt,
        "You are a facilitation assistant for a democratic deliberation process."
    );
    let _ = writeln!(
        prompt,
        "The participant is taking part in a discussion about: \"{}\".\n",
        topic.title
    );
    let _ = writeln!(
        prompt,
        "Context/Description:\n\"{}\"\n",
        topic.description.as_deref().unwrap_or(NO_DESCRIPTION)
    );
    let _ = writeln!(
        prompt,
        "Scope:\n\"{}\"\n",
        topic.scope.as_deref().unwrap_or(NO_SCOPE)
    );
    if let Some(question) = &topic.central_question {
        let _ = writeln!(prompt, "Central question:\n\"{}\"\n", question);
    }

    match phase {
        ConversationPhase::NotStarted => {
            prompt.push_str(
                "## This turn: introduction\n\
                 This is the very first message of the conversation.\n\
                 1. Warmly restate in two or three sentences what the topic is about, based on the description and scope.\n\
                 2. Ask exactly ONE question that clarifies the participant's role or relation to the topic \
                 (e.g. whether and how they are affected by it).\n\
                 Do NOT ask for an opinion yet and do NOT ask a weighing question in this turn.\n\n",
            );
        }
        ConversationPhase::Intro | ConversationPhase::Deliberating => {
            prompt.push_str(
                "## Structure of every reply\n\
                 Every reply has exactly three parts:\n\
                 1. Reflect back the participant's values and needs in their own terms.\n\
                 2. Introduce ONE alternative perspective or trade-off, without being preachy.\n\
                 3. Ask exactly ONE open, weighing-oriented question (never a yes/no question).\n\n",
            );
        }
    }

    prompt.push_str(
        "## Tone\n\
         Constructive, neutral and encouraging. Be concise; do not write long essays.\n\n",
    );

    if !artifacts.is_empty() {
        let _ = writeln!(prompt, "## Curated material");
        let _ = writeln!(
            prompt,
            "When it genuinely helps, recommend material by writing the marker [[CONTENT:id]] \
             or [[CONTENT:id1,id2]] using ONLY the ids listed below. Reference at most {} ids \
             per message. Never write raw URLs or links.",
            MAX_IDS_PER_REPLY
        );
        for artifact in artifacts {
            let _ = write!(prompt, "- id: {} | title: {}", artifact.id, artifact.title);
            if !artifact.tags.is_empty() {
                let _ = write!(prompt, " | tags: {}", artifact.tags.join(", "));
            }
            if let Some(description) = &artifact.description {
                let _ = write!(prompt, " | {}", description);
            }
            prompt.push('\n');
        }
        prompt.push('\n');
    }

    let _ = writeln!(
        prompt,
        "Current date: {}",
        chrono::Utc::now().format("%d.%m.%Y")
    );
    let _ = writeln!(prompt, "Language: {} (always reply in {}).", language, language);

    prompt
}

/// Transcript of a session with the start signal removed
pub fn transcript(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .filter(|m| !is_start_signal(&m.content))
        .map(|m| {
            let speaker = match m.role {
                MessageRole::User => "NUTZER",
                MessageRole::Assistant => "MODERATOR",
            };
            format!("{}: {}", speaker, m.content)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub const PROFILE_SYSTEM_PROMPT: &str = r#"You are an expert in deliberative democracy and attitude profiling. Your task is to create a structured profile of a person based on their chat conversation about a specific topic.

## Purpose
Create a generalized, topic-agnostic attitude profile that makes visible:
- How the person relates to the topic
- Which values and needs shape their view
- Where compromise is possible and where it is not

## Guidelines
- The profile is ANONYMOUS: never mention the person's name
- Focus on the PERSPECTIVE, not the person
- Be neutral and descriptive, not evaluative or diagnostic
- Extract implicit values even when not explicitly stated

## Fields
- profileTitle: 2-4 words capturing the core attitude; readable in a list, no slogan
- subtitle: optional short clarifying phrase (max ~8 words) or null
- roleContext: from which position the person speaks and how involved they are
- overallAttitude: basic orientation (supportive, skeptical, opposed, ambivalent, undecided) and emotional tone
- coreValues: 3 to 5 universal values or needs (e.g. Safety, Autonomy, Fairness, Sustainability, Transparency)
- keyConcerns: soft constraints, worries that are potentially negotiable
- redLines: hard constraints, crossing them makes an option unacceptable; scope personal, ethical or political
- counterarguments: arguments the person does not share but can understand, and why
- conditionsForChange: conditions under which the person might reconsider; type safeguard, opt-out, pilot, transparency or separation
- characterization: 1-2 neutral sentences, no labeling or stereotyping"#;

pub fn profile_system_prompt(language: &str) -> String {
    format!("{}\n\nRespond ONLY in {}.", PROFILE_SYSTEM_PROMPT, language)
}

pub fn profile_prompt(topic: &Topic, transcript: &str) -> String {
    format!(
        "## Topic Context\nTitle: {}\nDescription: {}\nScope: {}\n\n## Conversation\n{}\n\n---\n\n\
         Based on this conversation, create a deliberative attitude profile for this anonymous \
         participant. Focus on their perspective, values, concerns, and conditions for change.",
        topic.title,
        topic.description.as_deref().unwrap_or("No description"),
        topic.scope.as_deref().unwrap_or("No scope defined"),
        transcript
    )
}

/// Synthesis prompt over the whole population of a topic
pub fn synthesis_prompt(profiles: &[UserProfile]) -> String {
    let summaries = profiles
        .iter()
        .enumerate()
        .map(|(i, p)| {
            format!(
                "PERSPEKTIVE {} (ID: {}):\nTitel: {}\nHaltung: {}\nKernwerte: {}\nHauptsorgen: {}\n\
                 Rote Linien: {}\nGegenargumente: {}\nBedingungen: {}\nCharakterisierung: {}",
                i + 1,
                p.id,
                p.profile.profile_title,
                p.profile.overall_attitude,
                to_json(&p.profile.core_values),
                to_json(&p.profile.key_concerns),
                to_json(&p.profile.red_lines),
                to_json(&p.profile.counterarguments),
                to_json(&p.profile.conditions_for_change),
                p.profile.characterization
            )
        })
        .collect::<Vec<_>>()
        .join("\n---\n");

    format!(
        r#"Du bist ein Experte für deliberative Demokratie und Perspektivenanalyse.

Analysiere die folgenden {count} Perspektiven zum gleichen Thema und erstelle:

1. GEMEINSAMKEITEN (max 4): Gemeinsame Werte, Ziele oder Sorgen, die sich über mehrere Perspektiven hinweg zeigen. Gib für jede Gemeinsamkeit die IDs der Perspektiven an, in denen sie vorkommt.

2. SPANNUNGSFELDER (max 4): Die wichtigsten Dimensionen, auf denen sich die Perspektiven unterscheiden, formuliert als Gegensatzpaare.

Positionierung auf dem Spektrum:
- leftLabel = ein Pol (z.B. "Freiwilligkeit"), rightLabel = der Gegenpol (z.B. "Zwang")
- 2-4 Cluster pro Spannungsfeld, je nach Verteilung der Meinungen
- Jeder Cluster hat eine Position zwischen 0.0 und 1.0:
  • 0.0-0.2 = stark auf Seite des leftLabel
  • 0.3-0.4 = leicht auf Seite des leftLabel
  • 0.45-0.55 = neutral/mittig
  • 0.6-0.7 = leicht auf Seite des rightLabel
  • 0.8-1.0 = stark auf Seite des rightLabel

REGEL: Der Inhalt der summary MUSS zur Position passen!
- summary "befürwortet Freiwilligkeit" → Position nahe 0
- summary "befürwortet Zwang" → Position nahe 1
- summary "gemischte Position" → Position nahe 0.5

PERSPEKTIVEN:
{summaries}

Achte darauf:
- Jedes Profil muss in GENAU EINEM Cluster pro Spannungsfeld sein; kein Profil fehlt, keines doppelt
- Verwende ausschließlich die oben genannten IDs
- Die summary beschreibt, WAS die Perspektiven in diesem Cluster gemeinsam haben
- Die Position zeigt, WO auf dem Spektrum sie stehen"#,
        count = profiles.len(),
        summaries = summaries
    )
}

/// Appended to the prompt when a previous attempt broke a structural rule
pub fn synthesis_correction(violation: &str) -> String {
    format!(
        "\n\nDein letzter Entwurf war ungültig: {}. Halte die Regeln exakt ein.",
        violation
    )
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "[]".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn topic() -> Topic {
        Topic::new("wehrpflicht", "Wehrpflicht")
            .with_description("Soll die Wehrpflicht wieder eingeführt werden?")
            .with_scope("Bundesweit")
            .with_central_question("Pflichtdienst oder Freiwilligkeit?")
    }

    fn message(role: MessageRole, content: &str, ordinal: u64) -> ChatMessage {
        ChatMessage {
            id: ordinal.to_string(),
            session_id: "s".into(),
            role,
            content: content.into(),
            ordinal,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_intro_asks_role_question_only() {
        let prompt = moderator_instructions(&topic(), &[], ConversationPhase::NotStarted, "German");
        assert!(prompt.contains("exactly ONE question"));
        assert!(prompt.contains("do NOT ask a weighing question"));
        assert!(!prompt.contains("Every reply has exactly three parts"));
        assert!(prompt.contains("Soll die Wehrpflicht wieder eingeführt werden?"));
        assert!(prompt.contains("Central question:\n\"Pflichtdienst oder Freiwilligkeit?\""));
    }

    #[test]
    fn test_deliberation_encodes_three_parts() {
        let prompt = moderator_instructions(&topic(), &[], ConversationPhase::Deliberating, "German");
        assert!(prompt.contains("Reflect back the participant's values"));
        assert!(prompt.contains("ONE alternative perspective or trade-off"));
        assert!(prompt.contains("exactly ONE open, weighing-oriented question"));
        assert!(prompt.contains("always reply in German"));
    }

    #[test]
    fn test_artifacts_enumerated_with_marker_rules() {
        let topic = topic();
        let artifacts = vec![
            Artifact::new("art-1", &topic.id, "https://example.org/1", "Studie zur Dienstpflicht")
                .with_tags(["studie", "dienst"]),
            Artifact::new("art-2", &topic.id, "https://example.org/2", "Interview"),
        ];

        let prompt = moderator_instructions(&topic, &artifacts, ConversationPhase::Intro, "German");
        assert!(prompt.contains("[[CONTENT:id1,id2]]"));
        assert!(prompt.contains("at most 2 ids"));
        assert!(prompt.contains("Never write raw URLs"));
        assert!(prompt.contains("id: art-1 | title: Studie zur Dienstpflicht | tags: studie, dienst"));
        assert!(prompt.contains("id: art-2 | title: Interview"));
        assert!(!prompt.contains("https://example.org/1"));
    }

    #[test]
    fn test_no_material_section_without_artifacts() {
        let prompt = moderator_instructions(&topic(), &[], ConversationPhase::Intro, "German");
        assert!(!prompt.contains("[[CONTENT"));
    }

    #[test]
    fn test_transcript_hides_start_signal() {
        let messages = vec![
            message(MessageRole::User, START_SIGNAL, 0),
            message(MessageRole::Assistant, "Willkommen!", 1),
            message(MessageRole::User, "Ich bin Lehrerin.", 2),
        ];

        let text = transcript(&messages);
        assert_eq!(text, "MODERATOR: Willkommen!\n\nNUTZER: Ich bin Lehrerin.");
        assert!(!text.contains(START_SIGNAL));
    }

    #[test]
    fn test_start_signal_detection() {
        assert!(is_start_signal(" START_SESSION "));
        assert!(!is_start_signal("START_SESSION bitte"));
    }
}
