use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use mwe_detector::driver::{process_sentences, DriverConfig};
use mwe_detector::vocabulary::TermVocabulary;
use mwe_detector::{
    Annotator, AttributeSelection, CompilerConfig, Language, MultiwordTermDetector,
    PreannotatedCorpus, Tokenization,
};
use std::path::PathBuf;

/// Annotate sentences with the multiword terms they contain.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// ISO 639-3 language code (fra, eng, spa, kor, deu)
    language: Language,
    /// JSONL file with one JSON string (a sentence) per line
    sentences: PathBuf,
    /// Multiword terms, one per line
    terms: PathBuf,
    /// Where to write the annotated JSONL records
    output: PathBuf,

    /// Analysis server URL (defaults to $LEXIDE_ENDPOINT_URL)
    #[arg(long)]
    endpoint: Option<String>,
    /// Pre-computed analyses to use instead of the analysis server
    #[arg(long)]
    annotations: Option<PathBuf>,

    #[arg(long, default_value_t = 1000)]
    batch_size: usize,
    /// Sentences or terms analyzed at the same time
    #[arg(long, default_value_t = 100)]
    concurrency: usize,
    /// Require POS and dependency labels to agree in structural matches
    #[arg(long)]
    strict_structure: bool,
    /// Skip sentences already present in the output file and append
    #[arg(long)]
    resume: bool,
}

enum CliAnnotator {
    Corpus(PreannotatedCorpus),
    #[cfg(feature = "remote")]
    Remote(mwe_detector::Lexide),
}

impl CliAnnotator {
    fn from_args(args: &Args) -> Result<Self> {
        match &args.annotations {
            Some(path) => Ok(CliAnnotator::Corpus(PreannotatedCorpus::load(path)?)),
            None => Self::remote(args.endpoint.as_deref()),
        }
    }

    #[cfg(feature = "remote")]
    fn remote(endpoint: Option<&str>) -> Result<Self> {
        let lexide = match endpoint {
            Some(url) => mwe_detector::Lexide::from_server(url)?,
            None => mwe_detector::Lexide::new(mwe_detector::RemoteConfig::default())?,
        };
        Ok(CliAnnotator::Remote(lexide))
    }

    #[cfg(not(feature = "remote"))]
    fn remote(_endpoint: Option<&str>) -> Result<Self> {
        Err(mwe_detector::ConfigError::MissingAnnotator.into())
    }
}

impl Annotator for CliAnnotator {
    async fn annotate(&self, text: &str, language: Language) -> Result<Tokenization> {
        match self {
            CliAnnotator::Corpus(corpus) => corpus.annotate(text, language).await,
            #[cfg(feature = "remote")]
            CliAnnotator::Remote(lexide) => lexide.annotate(text, language).await,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    std::fs::metadata(&args.sentences)
        .with_context(|| format!("Sentences file {} is not readable", args.sentences.display()))?;

    info!("Loading multiword terms from {}", args.terms.display());
    let vocabulary = TermVocabulary::load(&args.terms)?;
    info!("Loaded {} multiword terms", vocabulary.len());

    let annotator = CliAnnotator::from_args(&args)?;
    let compiler_config = CompilerConfig {
        attributes: if args.strict_structure {
            AttributeSelection::STRICT
        } else {
            AttributeSelection::LEMMA_ONLY
        },
        annotation_concurrency: args.concurrency,
    };
    let detector =
        MultiwordTermDetector::new(&vocabulary, annotator, args.language, compiler_config).await?;

    let driver_config = DriverConfig {
        batch_size: args.batch_size,
        concurrency: args.concurrency,
        resume: args.resume,
    };
    let summary = process_sentences(&detector, &args.sentences, &args.output, &driver_config).await?;
    info!("{summary:?}");

    Ok(())
}
