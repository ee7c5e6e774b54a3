//! Sources of token graphs: the remote analysis model, or a file of
//! sentences that were analyzed ahead of time.

mod corpus;
#[cfg(feature = "remote")]
mod parsing;
#[cfg(feature = "remote")]
mod remote;

pub use corpus::{PreannotatedCorpus, TokenizedSentence};
#[cfg(feature = "remote")]
pub use remote::{RemoteClient, RemoteConfig};

use crate::{Language, Tokenization};
use anyhow::Result;

/// Turns raw text into tokens with lemma, part of speech, dependency head
/// and label, morphology and entity spans.
///
/// Implementations are called both for vocabulary terms (each parsed as if
/// it were a short sentence) and for the sentences being scanned.
#[allow(async_fn_in_trait)]
pub trait Annotator {
    async fn annotate(&self, text: &str, language: Language) -> Result<Tokenization>;
}

/// Annotator backed by the remote analysis model.
#[cfg(feature = "remote")]
pub struct Lexide {
    client: RemoteClient,
}

#[cfg(feature = "remote")]
impl Lexide {
    pub fn new(config: RemoteConfig) -> Result<Self> {
        Ok(Self {
            client: RemoteClient::new(config)?,
        })
    }

    pub fn from_server(url: &str) -> Result<Self> {
        Self::new(RemoteConfig {
            endpoint_url: url.to_string(),
            ..RemoteConfig::default()
        })
    }
}

#[cfg(feature = "remote")]
impl Annotator for Lexide {
    /// 1. build the prompt, 2. ask the model, 3. parse and repair its answer.
    async fn annotate(&self, text: &str, language: Language) -> Result<Tokenization> {
        let prompt = parsing::create_prompt(text, language);
        let response = self.client.generate(&prompt, text).await?;
        parsing::parse_response(&response, text)
    }
}
