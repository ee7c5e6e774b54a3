use crate::annotator::Annotator;
use crate::{EntitySpan, Language, Token, Tokenization};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// One line of a pre-annotated corpus file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenizedSentence {
    pub sentence: String,
    pub tokens: Vec<Token>,
    #[serde(default)]
    pub entities: Vec<EntitySpan>,
}

/// Annotator that answers from analyses computed ahead of time.
///
/// Lookups are by exact text, so the corpus must contain every vocabulary
/// term and sentence that will be requested.
#[derive(Debug, Clone, Default)]
pub struct PreannotatedCorpus {
    analyses: HashMap<String, Tokenization>,
}

impl PreannotatedCorpus {
    /// Load a JSONL file of [`TokenizedSentence`] records. Later records win
    /// when a sentence appears twice.
    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open annotations file {}", path.display()))?;

        let mut analyses = HashMap::new();
        for (line_no, line) in BufReader::new(file).lines().enumerate() {
            let line = line.with_context(|| format!("Failed to read {}", path.display()))?;
            if line.trim().is_empty() {
                continue;
            }
            let record: TokenizedSentence = serde_json::from_str(&line).with_context(|| {
                format!("Invalid annotation on line {} of {}", line_no + 1, path.display())
            })?;
            analyses.insert(
                record.sentence,
                Tokenization {
                    tokens: record.tokens,
                    entities: record.entities,
                },
            );
        }

        log::info!(
            "Loaded {} pre-annotated sentences from {}",
            analyses.len(),
            path.display()
        );
        Ok(Self { analyses })
    }

    pub fn from_tokenizations(
        analyses: impl IntoIterator<Item = (String, Tokenization)>,
    ) -> Self {
        Self {
            analyses: analyses.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.analyses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.analyses.is_empty()
    }
}

impl Annotator for PreannotatedCorpus {
    async fn annotate(&self, text: &str, _language: Language) -> Result<Tokenization> {
        self.analyses
            .get(text)
            .cloned()
            .with_context(|| format!("No pre-computed analysis for {text:?}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_load_and_annotate() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"sentence":"Bonjour","tokens":[{{"text":{{"text":"Bonjour"}},"whitespace":"","pos":"INTJ","lemma":{{"lemma":"bonjour"}},"dep":"root","head":0}}]}}"#
        )
        .unwrap();
        writeln!(file).unwrap();

        let corpus = PreannotatedCorpus::load(file.path()).unwrap();
        assert_eq!(corpus.len(), 1);

        let tokenization = corpus.annotate("Bonjour", Language::French).await.unwrap();
        assert_eq!(tokenization.tokens[0].lemma.lemma, "bonjour");
        assert!(tokenization.entities.is_empty());

        assert!(corpus.annotate("Salut", Language::French).await.is_err());
    }

    #[test]
    fn test_load_reports_bad_line() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not json").unwrap();

        let err = PreannotatedCorpus::load(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("line 1"));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(PreannotatedCorpus::load(Path::new("/definitely/not/here.jsonl")).is_err());
    }
}
