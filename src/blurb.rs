//! Social-media blurbs announcing a card.

use crate::error::CardsError;
use crate::pipeline::llm::VisionModel;
use crate::prompts::blurb_prompt;
use crate::record::Record;
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Public site hosting the cards.
pub const SITE_BASE_URL: &str = "https://invention.cards";

/// Hashtag appended to every generated post.
pub const ART_HASHTAG: &str = "#AiArt";

/// A ready-to-post announcement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Blurb {
    /// Model-written post text, hashtag included.
    pub text: String,
    /// `<site>/<id>`
    pub page_url: String,
    /// `<site>/<id>/card.jpg`
    pub image_url: String,
}

impl fmt::Display for Blurb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.text)?;
        writeln!(f, "{}", self.page_url)?;
        writeln!(f, "---")?;
        write!(f, "{}", self.image_url)
    }
}

/// Ask the model for a short post about `record`.
///
/// # Errors
/// [`CardsError::Generation`] when the model answers with an error envelope.
pub async fn compose_blurb(model: &dyn VisionModel, record: &Record) -> Result<Blurb, CardsError> {
    let envelope = model.complete(&blurb_prompt(record), Vec::new()).await;
    let content = envelope.content().map_err(|message| CardsError::Generation {
        message: message.to_string(),
    })?;
    debug!("Blurb for {}: {} chars", record.identifier(), content.len());

    Ok(Blurb {
        text: format!("{} {}", content.trim_end(), ART_HASHTAG),
        page_url: format!("{}/{}", SITE_BASE_URL, record.identifier()),
        image_url: format!("{}/{}/card.jpg", SITE_BASE_URL, record.identifier()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::llm::ResponseEnvelope;
    use crate::record::RecordDraft;
    use async_trait::async_trait;
    use edgequake_llm::ImageData;
    use std::sync::Mutex;

    struct Recorder {
        reply: ResponseEnvelope,
        seen: Mutex<Vec<(String, usize)>>,
    }

    #[async_trait]
    impl VisionModel for Recorder {
        async fn complete(&self, prompt: &str, images: Vec<ImageData>) -> ResponseEnvelope {
            self.seen.lock().unwrap().push((prompt.to_string(), images.len()));
            self.reply.clone()
        }
    }

    fn telescope() -> Record {
        RecordDraft {
            identifier: None,
            year: "1608".into(),
            title: "Telescope".into(),
            summary: "Lenses bring distant things near.".into(),
            inventor: "Hans Lippershey".into(),
            location: "Netherlands".into(),
            field: "Science: Astronomy".into(),
            ..Default::default()
        }
        .into_record()
        .unwrap()
    }

    #[tokio::test]
    async fn blurb_is_tagged_and_linked() {
        let model = Recorder {
            reply: ResponseEnvelope::completion("Seeing further since 1608. #Astronomy\n"),
            seen: Mutex::new(Vec::new()),
        };
        let blurb = compose_blurb(&model, &telescope()).await.unwrap();

        assert_eq!(blurb.text, "Seeing further since 1608. #Astronomy #AiArt");
        assert_eq!(blurb.page_url, "https://invention.cards/telescope");
        assert_eq!(blurb.image_url, "https://invention.cards/telescope/card.jpg");
        assert_eq!(
            blurb.to_string().lines().collect::<Vec<_>>(),
            vec![
                "Seeing further since 1608. #Astronomy #AiArt",
                "https://invention.cards/telescope",
                "---",
                "https://invention.cards/telescope/card.jpg",
            ]
        );

        let seen = model.seen.lock().unwrap();
        assert_eq!(seen[0].1, 0);
        assert!(seen[0].0.contains("Person: Hans Lippershey"));
    }

    #[tokio::test]
    async fn error_envelope_is_generation_error() {
        let model = Recorder {
            reply: ResponseEnvelope::failure("invalid api key"),
            seen: Mutex::new(Vec::new()),
        };
        let err = compose_blurb(&model, &telescope()).await.unwrap_err();
        assert!(matches!(err, CardsError::Generation { ref message } if message == "invalid api key"));
    }
}
