use anyhow::Result;
use mwe_detector::vocabulary::TermVocabulary;
use mwe_detector::{CompilerConfig, Language, Lexide, MultiwordTermDetector};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let lexide = Lexide::from_server("https://anchpop--lexide-gemma-3-27b-vllm-serve.modal.run")?;

    let vocabulary: TermVocabulary = ["ne jamais", "ne pas", "c'est", "avoir besoin de", "bonjour"]
        .into_iter()
        .collect();

    println!("Compiling {} terms...", vocabulary.len());
    let detector =
        MultiwordTermDetector::new(&vocabulary, lexide, Language::French, CompilerConfig::default())
            .await?;

    for (term, pattern) in detector.patterns().structural_matcher().patterns() {
        println!("  {term}: {pattern}");
    }

    let sentences = [
        "Il ne mange jamais de pommes le matin.",
        "Bonjour, c'est moi !",
        "Nous avions vraiment besoin de ton aide.",
        "Je n'ai pas faim.",
    ];

    for sentence in sentences {
        let (_, detected) = detector.find_multiword_terms(sentence).await?;
        println!("\n{sentence}");

        let mut high: Vec<_> = detected.high_confidence.iter().collect();
        high.sort();
        for term in high {
            println!("  high: {} [{}..{}]", term.text, term.start, term.end);
        }
        for term in &detected.low_confidence {
            println!("  low:  {} [{}..{}]", term.text, term.start, term.end);
        }
    }

    println!("\n{}", detector.debug_parse("Je n'ai pas faim.").await?);

    Ok(())
}
