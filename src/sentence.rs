//! Sentence splitting of conversational input.
//!
//! Each sentence of an input is matched on its own. A sentence ends after any
//! of the configured splitter strings; a run of adjacent splitters (`"?!"`,
//! `"..."`) ends a single sentence.

/// Split input into trimmed sentences.
///
/// Empty input yields a single empty sentence, so callers always have one
/// thing to answer.
pub fn sentence_split<S: AsRef<str>>(splitters: &[S], input: &str) -> Vec<String> {
    if input.is_empty() {
        return vec![String::new()];
    }

    let boundaries = get_boundaries(splitters, input);
    if boundaries.is_empty() {
        return vec![input.trim().to_string()];
    }

    let mut sentences = Vec::new();
    let mut start = 0;
    for end in boundaries {
        push_trimmed(&mut sentences, &input[start..end]);
        start = end;
    }
    push_trimmed(&mut sentences, &input[start..]);

    if sentences.is_empty() {
        sentences.push(String::new());
    }
    sentences
}

fn push_trimmed(sentences: &mut Vec<String>, piece: &str) {
    let piece = piece.trim();
    if !piece.is_empty() {
        sentences.push(piece.to_string());
    }
}

/// Byte offsets just past each sentence-ending splitter run
fn get_boundaries<S: AsRef<str>>(splitters: &[S], input: &str) -> Vec<usize> {
    let mut spans: Vec<(usize, usize)> = splitters
        .iter()
        .map(AsRef::as_ref)
        .filter(|s| !s.is_empty())
        .flat_map(|s| input.match_indices(s).map(|(i, m)| (i, i + m.len())))
        .collect();
    spans.sort_unstable();

    let mut boundaries: Vec<usize> = Vec::new();
    let mut run_end: Option<usize> = None;
    for (start, end) in spans {
        match run_end {
            // Adjacent or overlapping: extend the current run
            Some(prev) if start <= prev => run_end = Some(prev.max(end)),
            Some(prev) => {
                boundaries.push(prev);
                run_end = Some(end);
            }
            None => run_end = Some(end),
        }
    }
    if let Some(prev) = run_end {
        boundaries.push(prev);
    }

    boundaries
}
