//! Prompt construction and response parsing for the remote analysis model.
use crate::{EntitySpan, Language, Lemma, Text, Token, Tokenization};
use anyhow::{Context, Result};
use std::collections::BTreeMap;

/// Create the prompt in the expected format
pub fn create_prompt(sentence: &str, language: Language) -> String {
    format!(
        "Language: {}\nSentence: {}\nTask: Analyze tokens (idx,token,ws,POS,lemma,dep,head,feats,ner)\n\nAnalysis:\n",
        language, sentence
    )
}

/// Parse the model's response into structured data.
///
/// Each line is `idx, token, ws, POS, lemma, dep, head`, optionally followed
/// by a UD feature string and an IOB entity tag.
pub fn parse_response(response: &str, sentence: &str) -> Result<Tokenization> {
    let mut tokens = Vec::new();
    let mut entity_tags = Vec::new();

    // Skip the conversational prefix if present
    let response = response
        .rsplit("Here's the token analysis:")
        .next()
        .unwrap_or(response);

    // Remove the </analysis> end marker if present
    let response = response.split("</analysis>").next().unwrap_or(response);

    let response = response.trim();

    for line in response.lines() {
        let line = line.trim();
        // Skip empty lines and sentence separators
        if line.is_empty() || line == "-----" {
            continue;
        }

        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() < 7 {
            continue;
        }

        let pos = serde_plain::from_str(parts[3])
            .with_context(|| format!("Failed to parse POS in line: {}", line))?;
        let dep = serde_plain::from_str(parts[5])
            .with_context(|| format!("Failed to parse dependency in line: {}", line))?;

        tokens.push(Token {
            text: Text {
                text: parts[1].to_string(),
            },
            whitespace: decode_whitespace(parts[2]),
            pos,
            lemma: Lemma::new(parts[4]),
            dep,
            head: parts[6].parse::<i32>().unwrap_or(-1),
            morph: parts.get(7).map(|feats| parse_feats(feats)).unwrap_or_default(),
        });
        entity_tags.push(parts.get(8).map(|tag| tag.to_string()));
    }

    // Move leading spaces from token text to previous token's whitespace field
    for i in 0..tokens.len() {
        if let Some(stripped) = tokens[i].text.text.strip_prefix(' ') {
            tokens[i].text.text = stripped.to_string();
            if i > 0 {
                tokens[i - 1].whitespace = " ".to_string();
            }
        }
    }

    if !fix_reconstruction(&mut tokens, sentence) {
        let reconstructed_text = tokens
            .iter()
            .map(|token| format!("{}{}", token.text.text, token.whitespace))
            .collect::<String>();
        anyhow::bail!(
            "Reconstructed text does not match the original sentence ({} != {}) in response: {:?}",
            reconstructed_text,
            sentence,
            response
        );
    }

    // Reconstruction may have dropped a trailing token.
    entity_tags.truncate(tokens.len());
    let entities = entities_from_iob(&entity_tags);

    Ok(Tokenization { tokens, entities })
}

fn decode_whitespace(code: &str) -> String {
    match code {
        "_" => " ",
        "nbsp" => "\u{00A0}",
        "narnbsp" | "\u{202F} " | "  " | "\u{a0} " => "\u{202F}",
        "thinsp" => "\u{2009}",
        "hairsp" => "\u{200A}",
        "zwsp" => "\u{200B}",
        "ideogrp" => "\u{3000}",
        "none" => "",
        other => other,
    }
    .to_string()
}

/// Parse a UD `FEATS` column (`Gender=Masc|Number=Sing`, `_` for none).
fn parse_feats(feats: &str) -> BTreeMap<String, String> {
    feats
        .split('|')
        .filter_map(|feature| feature.split_once('='))
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .collect()
}

/// Group IOB tags (`B-PER`, `I-PER`, `O`) into entity spans.
fn entities_from_iob(tags: &[Option<String>]) -> Vec<EntitySpan> {
    let mut entities: Vec<EntitySpan> = Vec::new();
    let mut open: Option<EntitySpan> = None;

    for (idx, tag) in tags.iter().enumerate() {
        let tag = tag.as_deref().unwrap_or("O");
        let continues = match (tag.strip_prefix("I-"), &open) {
            (Some(label), Some(current)) => current.label == label,
            _ => false,
        };

        if continues {
            if let Some(current) = open.as_mut() {
                current.end = idx + 1;
            }
            continue;
        }

        entities.extend(open.take());
        if let Some(label) = tag.strip_prefix("B-").or_else(|| tag.strip_prefix("I-")) {
            open = Some(EntitySpan {
                start: idx,
                end: idx + 1,
                label: label.to_string(),
            });
        }
    }

    entities.extend(open);
    entities
}

/// Fold accents, typographic punctuation and exotic spaces so that a model
/// response can be compared with the sentence it was asked to analyze.
fn normalize_unicode(s: &str) -> String {
    use unicode_normalization::UnicodeNormalization;

    let mut normalized = String::with_capacity(s.len());
    for c in s
        .nfd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
    {
        match c {
            '\u{2018}' | '\u{2019}' => normalized.push('\''),
            '\u{201C}' | '\u{201D}' => normalized.push('"'),
            '\u{2013}' | '\u{2014}' => normalized.push('-'),
            '\u{2026}' => normalized.push_str("..."),
            '\u{00A0}' | '\u{202F}' | '\u{2009}' | '\u{200A}' | '\u{3000}' => normalized.push(' '),
            '\u{200B}' => {}
            other => normalized.push(other),
        }
    }
    normalized
}

fn concat(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|token| format!("{}{}", token.text.text, token.whitespace))
        .collect()
}

/// Repair the small mismatches the model tends to produce. Returns `false`
/// when the tokens genuinely describe a different sentence.
fn fix_reconstruction(tokens: &mut Vec<Token>, sentence: &str) -> bool {
    let reconstructed = concat(tokens);
    if reconstructed == sentence {
        return true;
    }

    // The model sometimes appends punctuation that was not in the input.
    if tokens.len() > 1 {
        let without_last = concat(&tokens[..tokens.len() - 1]);
        if without_last == sentence {
            tokens.pop();
            return true;
        }
        if without_last.trim_end_matches([' ', '\u{202F}']) == sentence {
            tokens.pop();
            if let Some(last) = tokens.last_mut() {
                last.whitespace.clear();
            }
            return true;
        }
    }

    if normalize_unicode(&reconstructed) != normalize_unicode(sentence) {
        return false;
    }

    // Same text modulo accents and punctuation: copy the original characters
    // back over the token texts and whitespace.
    let mut original = sentence.chars();
    for token in tokens.iter_mut() {
        let text_len = token.text.text.chars().count();
        let text: String = original.by_ref().take(text_len).collect();
        if !text.is_empty() {
            token.text.text = text;
        }
        let ws_len = token.whitespace.chars().count();
        token.whitespace = original.by_ref().take(ws_len).collect();
    }

    // Folding can change lengths ("…" becomes "..."), so the copy may not
    // line up with the sentence.
    concat(tokens) == sentence
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::create_test_token;
    use crate::{dep::DependencyRelation, pos::PartOfSpeech};

    #[test]
    fn test_parse_response_basic_columns() {
        let response = "Here's the token analysis:\n\n\
            1\tIl\t_\tPRON\til\tnsubj\t3\n\
            2\tne\t_\tADV\tne\tadvmod\t3\n\
            3\tmange\t_\tVERB\tmanger\troot\t0\n\
            4\tjamais\tnone\tADV\tjamais\tadvmod\t3\n\n</analysis>";

        let tokenization = parse_response(response, "Il ne mange jamais").unwrap();

        assert_eq!(tokenization.tokens.len(), 4);
        assert_eq!(tokenization.tokens[2].lemma, Lemma::new("manger"));
        assert_eq!(tokenization.tokens[2].dep, DependencyRelation::Root);
        assert_eq!(tokenization.tokens[0].head, 3);
        assert!(tokenization.entities.is_empty());
    }

    #[test]
    fn test_parse_response_feats_and_entities() {
        let response = "1\tMarie\t_\tPROPN\tMarie\tnsubj\t3\t_\tB-PER\n\
            2\tCurie\t_\tPROPN\tCurie\tflat:name\t1\t_\tI-PER\n\
            3\tdort\tnone\tVERB\tdormir\troot\t0\tMood=Ind|Number=Sing\tO";

        let tokenization = parse_response(response, "Marie Curie dort").unwrap();

        assert_eq!(tokenization.tokens[2].morph.get("Mood").map(String::as_str), Some("Ind"));
        assert_eq!(tokenization.tokens[2].morph.len(), 2);
        assert!(tokenization.tokens[0].morph.is_empty());
        assert_eq!(
            tokenization.entities,
            vec![EntitySpan {
                start: 0,
                end: 2,
                label: "PER".to_string()
            }]
        );
    }

    #[test]
    fn test_parse_response_rejects_unknown_dependency() {
        let response = "1\tchat\tnone\tNOUN\tchat\tnotalabel\t0";
        assert!(parse_response(response, "chat").is_err());
    }

    #[test]
    fn test_entities_from_iob_splits_on_label_change() {
        let tags = vec![
            Some("B-PER".to_string()),
            Some("I-LOC".to_string()),
            None,
            Some("I-ORG".to_string()),
        ];

        let entities = entities_from_iob(&tags);

        assert_eq!(entities.len(), 3);
        assert_eq!((entities[0].start, entities[0].end), (0, 1));
        assert_eq!(entities[1].label, "LOC");
        assert_eq!((entities[2].start, entities[2].end, entities[2].label.as_str()), (3, 4, "ORG"));
    }

    fn two_tokens(first: &str, first_ws: &str, second: &str) -> Vec<Token> {
        vec![
            create_test_token(first, first_ws, PartOfSpeech::Noun, first, DependencyRelation::Root, 0),
            create_test_token(second, "", PartOfSpeech::Noun, second, DependencyRelation::Nmod, 1),
        ]
    }

    #[test]
    fn test_normalize_unicode() {
        assert_eq!(normalize_unicode("crème brûlée"), "creme brulee");
        assert_eq!(normalize_unicode("don\u{2019}t"), "don't");
        assert_eq!(normalize_unicode("\u{201C}oui\u{201D}\u{2026}"), "\"oui\"...");
        assert_eq!(normalize_unicode("a\u{202F}b\u{200B}c"), "a bc");
    }

    #[test]
    fn test_fix_reconstruction_drops_hallucinated_punctuation() {
        let mut tokens = two_tokens("Bonjour", " ", "monde");
        tokens[1].whitespace = " ".to_string();
        tokens.push(create_test_token(
            ".",
            "",
            PartOfSpeech::Punct,
            ".",
            DependencyRelation::Punct,
            1,
        ));

        assert!(fix_reconstruction(&mut tokens, "Bonjour monde"));
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[1].whitespace, "");
    }

    #[test]
    fn test_fix_reconstruction_restores_accents_and_spaces() {
        let mut tokens = two_tokens("Creme", " ", "brulee");

        assert!(fix_reconstruction(&mut tokens, "Crème\u{202F}brûlée"));
        assert_eq!(tokens[0].text.text, "Crème");
        assert_eq!(tokens[0].whitespace, "\u{202F}");
        assert_eq!(tokens[1].text.text, "brûlée");
    }

    #[test]
    fn test_fix_reconstruction_rejects_length_changing_folds() {
        let mut tokens = two_tokens("Oui", "", "\u{2026}");
        assert!(!fix_reconstruction(&mut tokens, "Oui..."));

        let response = "1\tOui\tnone\tINTJ\toui\troot\t0\n2\t\u{2026}\tnone\tPUNCT\t\u{2026}\tpunct\t1";
        assert!(parse_response(response, "Oui...").is_err());
    }

    #[test]
    fn test_fix_reconstruction_rejects_different_words() {
        let mut tokens = vec![create_test_token(
            "Dibujala",
            "",
            PartOfSpeech::Verb,
            "dibujar",
            DependencyRelation::Root,
            0,
        )];

        assert!(!fix_reconstruction(&mut tokens, "Dibújela"));
        assert_eq!(tokens[0].text.text, "Dibujala");
        assert!(fix_reconstruction(&mut tokens, "Dibújala"));
        assert_eq!(tokens[0].text.text, "Dibújala");
    }
}
