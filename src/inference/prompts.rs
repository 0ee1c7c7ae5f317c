//! # Task Prompts
//!
//! Fixed instruction prompts and sampling temperatures per task, and the
//! mapping from an [`InferenceRequest`] to a provider-neutral call.

use super::provider::{ContentPart, GenerationCall};
use super::request::InferenceRequest;

/// Emitted verbatim by the model when the audio holds no intelligible speech.
pub const NO_SPEECH_SENTENCE: &str = "Transcription failed. No clear voice detected or the audio quality is too low to process. Please retry with a clearer audio recording.";

/// Placeholder for words that cannot be made out.
pub const INAUDIBLE_MARKER: &str = "***";

/// Target languages offered to callers. Anything else is still forwarded.
pub const SUPPORTED_LANGUAGES: [&str; 13] = [
    "Arabic",
    "Chinese",
    "English",
    "French",
    "German",
    "Hindi",
    "Italian",
    "Japanese",
    "Portuguese",
    "Russian",
    "Spanish",
    "Turkish",
    "Urdu",
];

pub fn transcription_prompt() -> String {
    format!(
        "You are a professional transcriptionist working from the attached audio.\n\
         \n\
         Before transcribing, check the recording. If it is silent or contains only \
         unintelligible noise, reply with exactly this sentence and nothing else:\n\
         \"{no_speech}\"\n\
         \n\
         Rules:\n\
         1. Write the words exactly as spoken. Do not paraphrase or summarize.\n\
         2. Replace any word you cannot make out with {marker}.\n\
         3. Drop filler words such as \"um\" and \"uh\" unless they change the meaning.\n\
         4. Only label speakers when several voices are clearly distinguishable.\n\
         5. Never add headings or meta labels such as \"Transcript:\".\n\
         \n\
         Output only the transcribed text.",
        no_speech = NO_SPEECH_SENTENCE,
        marker = INAUDIBLE_MARKER,
    )
}

pub fn translation_prompt(text: &str, target_language: &str) -> String {
    format!(
        "Translate the text below into {language} with fluent, native-level phrasing. \
         Keep the original meaning and tone, and preserve the paragraph structure.\n\
         \n\
         Text:\n\
         \"\"\"\n\
         {text}\n\
         \"\"\"\n\
         \n\
         Output only the translation.",
        language = target_language,
        text = text,
    )
}

/// Build the generation call for `request` at the given per-task temperatures.
pub fn build_call(
    request: &InferenceRequest,
    transcription_temperature: f64,
    translation_temperature: f64,
) -> GenerationCall {
    match request {
        InferenceRequest::Transcription {
            audio_base64,
            mime_type,
        } => GenerationCall {
            parts: vec![
                ContentPart::InlineData {
                    mime_type: mime_type.clone(),
                    data: audio_base64.clone(),
                },
                ContentPart::Text(transcription_prompt()),
            ],
            temperature: transcription_temperature,
        },
        InferenceRequest::Translation {
            text,
            target_language,
        } => GenerationCall {
            parts: vec![ContentPart::Text(translation_prompt(text, target_language))],
            temperature: translation_temperature,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcription_call_carries_audio_then_prompt() {
        let request = InferenceRequest::transcription("UklGRg==", "audio/wav").unwrap();
        let call = build_call(&request, 0.0, 0.1);

        assert_eq!(call.temperature, 0.0);
        assert_eq!(call.parts.len(), 2);
        assert_eq!(
            call.parts[0],
            ContentPart::InlineData {
                mime_type: "audio/wav".to_string(),
                data: "UklGRg==".to_string(),
            }
        );
        match &call.parts[1] {
            ContentPart::Text(prompt) => {
                assert!(prompt.contains(NO_SPEECH_SENTENCE));
                assert!(prompt.contains("***"));
                assert!(prompt.contains("Transcript:"));
            }
            other => panic!("unexpected part: {:?}", other),
        }
    }

    #[test]
    fn test_translation_call_embeds_text() {
        let request = InferenceRequest::translation("Hola mundo\n\nAdiós", "German").unwrap();
        let call = build_call(&request, 0.0, 0.1);

        assert_eq!(call.temperature, 0.1);
        assert_eq!(call.parts.len(), 1);
        match &call.parts[0] {
            ContentPart::Text(prompt) => {
                assert!(prompt.contains("into German"));
                assert!(prompt.contains("Hola mundo\n\nAdiós"));
                assert!(prompt.contains("Output only the translation."));
            }
            other => panic!("unexpected part: {:?}", other),
        }
    }

    #[test]
    fn test_language_list() {
        assert_eq!(SUPPORTED_LANGUAGES.len(), 13);
        assert!(SUPPORTED_LANGUAGES.contains(&"Urdu"));
    }
}
